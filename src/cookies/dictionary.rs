//! Known-cookie classification database.
//!
//! Maps cookie names to the platform that sets them and a category such as
//! "Analytics" or "Marketing". Entries flagged as wildcards match any cookie
//! whose name starts with the entry name (e.g. `_ga_` matches `_ga_X1Y2`).

use crate::base::error::EngineError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Category reported for cookies the dictionary does not know.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Classification attached to a cookie record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieAnalytics {
    #[serde(default)]
    pub platform: String,
    #[serde(default = "uncategorized")]
    pub category: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub retention: String,
    #[serde(default)]
    pub data_controller: String,
    #[serde(default)]
    pub gdpr_url: String,
    #[serde(default, deserialize_with = "flag")]
    pub wildcard: bool,
}

fn uncategorized() -> String {
    UNCATEGORIZED.to_string()
}

/// The database stores its wildcard flag as `"0"`/`"1"`, a number or a bool.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[derive(Debug, Clone, Default)]
pub struct CookieDictionary {
    exact: HashMap<String, CookieAnalytics>,
    // Longest prefix first so the most specific wildcard wins.
    wildcards: Vec<CookieAnalytics>,
}

impl CookieDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from the JSON document
    /// `{ "<cookie name>": [ { platform, category, ... } ] }`.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let raw: HashMap<String, Vec<CookieAnalytics>> = serde_json::from_str(json)?;
        let mut dictionary = Self::new();
        for (name, entries) in raw {
            for mut entry in entries {
                if entry.name.is_empty() {
                    entry.name = name.clone();
                }
                dictionary.insert(entry);
            }
        }
        Ok(dictionary)
    }

    pub fn insert(&mut self, entry: CookieAnalytics) {
        if entry.wildcard {
            self.wildcards.push(entry);
            self.wildcards
                .sort_by(|a, b| b.name.len().cmp(&a.name.len()).then_with(|| a.name.cmp(&b.name)));
        } else {
            self.exact.insert(entry.name.clone(), entry);
        }
    }

    /// Look up a cookie name; exact entries win over wildcard entries.
    pub fn lookup(&self, cookie_name: &str) -> Option<&CookieAnalytics> {
        self.exact.get(cookie_name).or_else(|| {
            self.wildcards
                .iter()
                .find(|entry| cookie_name.starts_with(entry.name.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "_ga": [{"platform": "Google Analytics", "category": "Analytics", "retention": "2 years", "wildcard": "0"}],
        "_ga_": [{"platform": "Google Analytics", "category": "Analytics", "wildcard": "1"}],
        "_g": [{"platform": "Generic", "wildcard": true}],
        "IDE": [{"platform": "DoubleClick", "category": "Marketing"}]
    }"#;

    #[test]
    fn test_exact_lookup() {
        let dict = CookieDictionary::from_json(SAMPLE).unwrap();
        let ga = dict.lookup("_ga").unwrap();
        assert_eq!(ga.platform, "Google Analytics");
        assert_eq!(ga.name, "_ga");
        assert_eq!(dict.lookup("IDE").unwrap().category, "Marketing");
    }

    #[test]
    fn test_wildcard_prefers_longest_prefix() {
        let dict = CookieDictionary::from_json(SAMPLE).unwrap();
        assert_eq!(dict.lookup("_ga_ABC123").unwrap().name, "_ga_");
        let generic = dict.lookup("_gid").unwrap();
        assert_eq!(generic.platform, "Generic");
        assert_eq!(generic.category, UNCATEGORIZED);
    }

    #[test]
    fn test_unknown_cookie() {
        let dict = CookieDictionary::from_json(SAMPLE).unwrap();
        assert!(dict.lookup("session").is_none());
        assert_eq!(dict.len(), 4);
    }

    #[test]
    fn test_invalid_json() {
        let err = CookieDictionary::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, EngineError::InvalidDictionary { .. }));
    }
}
