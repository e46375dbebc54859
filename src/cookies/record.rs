use crate::base::ids::FrameId;
use crate::cookies::dictionary::CookieAnalytics;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A cookie observed on the wire, normalized for analysis.
///
/// Produced by the parsers in [`crate::cookies::parse`]; the engine only
/// moves these into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Expiry as seconds since the epoch; `None` for session cookies.
    pub expires: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
    pub partition_key: Option<String>,
    pub header_type: HeaderType,
    /// URL of the request that carried the cookie.
    pub url: String,
    pub is_first_party: Option<bool>,
    pub analytics: Option<CookieAnalytics>,
    pub frame_ids: Vec<FrameId>,
    pub blocked_reasons: Vec<String>,
    pub warning_reasons: Vec<String>,
    /// Set when a later observation changed the cookie's value.
    pub highlighted: bool,
    pub allow_listed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CookiePriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Which side of the exchange carried the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
    Request,
    Response,
}

/// Identity of a cookie inside one tab's data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

impl SameSite {
    /// Parse the protocol's `sameSite` value.
    pub fn from_protocol(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("strict") => SameSite::Strict,
            Some(v) if v.eq_ignore_ascii_case("lax") => SameSite::Lax,
            Some(v) if v.eq_ignore_ascii_case("none") => SameSite::NoRestriction,
            _ => SameSite::Unspecified,
        }
    }
}

impl CookiePriority {
    pub fn from_protocol(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("low") => CookiePriority::Low,
            Some(v) if v.eq_ignore_ascii_case("high") => CookiePriority::High,
            _ => CookiePriority::Medium,
        }
    }
}

impl CookieRecord {
    /// A record with default attributes for `name=value` on `domain`.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        header_type: HeaderType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
            partition_key: None,
            header_type,
            url: url.into(),
            is_first_party: None,
            analytics: None,
            frame_ids: Vec::new(),
            blocked_reasons: Vec::new(),
            warning_reasons: Vec::new(),
            highlighted: false,
            allow_listed: false,
        }
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        self.expires
            .is_some_and(|expiry| expiry < current_time.unix_timestamp())
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_reasons.is_empty()
    }

    /// Whether the cookie's domain is one of `domains` or a subdomain of one.
    pub fn matches_allow_list(&self, domains: &[String]) -> bool {
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        domains.iter().any(|allowed| {
            let allowed = allowed.trim_start_matches('.').to_ascii_lowercase();
            !allowed.is_empty()
                && (domain == allowed
                    || domain
                        .strip_suffix(allowed.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.')))
        })
    }

    /// Fold a newer observation of the same cookie into this one.
    ///
    /// The value and attributes follow the newer observation; frame ids and
    /// reasons accumulate; the allow-list flag is kept.
    pub fn merge(&mut self, newer: CookieRecord) {
        if self.value != newer.value {
            self.highlighted = true;
        }
        self.value = newer.value;
        self.expires = newer.expires;
        self.http_only = newer.http_only;
        self.secure = newer.secure;
        self.same_site = newer.same_site;
        self.priority = newer.priority;
        self.header_type = newer.header_type;
        self.url = newer.url;
        if newer.partition_key.is_some() {
            self.partition_key = newer.partition_key;
        }
        if newer.is_first_party.is_some() {
            self.is_first_party = newer.is_first_party;
        }
        if newer.analytics.is_some() {
            self.analytics = newer.analytics;
        }
        extend_unique(&mut self.frame_ids, newer.frame_ids);
        extend_unique(&mut self.blocked_reasons, newer.blocked_reasons);
        extend_unique(&mut self.warning_reasons, newer.warning_reasons);
    }
}

pub(crate) fn extend_unique<T: PartialEq>(target: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str) -> CookieRecord {
        CookieRecord::new("sid", value, "example.com", "/", HeaderType::Response, "https://example.com/")
    }

    #[test]
    fn test_merge_accumulates_frames_and_reasons() {
        let mut first = record("1");
        first.frame_ids = vec![0];
        first.allow_listed = true;

        let mut second = record("1");
        second.frame_ids = vec![0, 3];
        second.blocked_reasons = vec!["ThirdPartyPhaseout".to_string()];

        first.merge(second);
        assert_eq!(first.frame_ids, vec![0, 3]);
        assert!(first.is_blocked());
        assert!(first.allow_listed);
        assert!(!first.highlighted);
    }

    #[test]
    fn test_merge_highlights_changed_value() {
        let mut first = record("1");
        first.merge(record("2"));
        assert_eq!(first.value, "2");
        assert!(first.highlighted);
    }

    #[test]
    fn test_allow_list_matching() {
        let allowed = vec!["example.com".to_string(), ".cdn.test".to_string()];
        let mut cookie = record("1");
        assert!(cookie.matches_allow_list(&allowed));

        cookie.domain = "shop.example.com".to_string();
        assert!(cookie.matches_allow_list(&allowed));

        cookie.domain = ".cdn.test".to_string();
        assert!(cookie.matches_allow_list(&allowed));

        cookie.domain = "badexample.com".to_string();
        assert!(!cookie.matches_allow_list(&allowed));
        assert!(!cookie.matches_allow_list(&[]));
    }

    #[test]
    fn test_is_expired() {
        let now = OffsetDateTime::now_utc();
        let mut cookie = record("1");
        assert!(!cookie.is_expired(now));
        cookie.expires = Some(now.unix_timestamp() - 10);
        assert!(cookie.is_expired(now));
    }

    #[test]
    fn test_same_site_from_protocol() {
        assert_eq!(SameSite::from_protocol(Some("Strict")), SameSite::Strict);
        assert_eq!(SameSite::from_protocol(Some("None")), SameSite::NoRestriction);
        assert_eq!(SameSite::from_protocol(None), SameSite::Unspecified);
    }
}
