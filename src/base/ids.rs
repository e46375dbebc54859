//! Browser identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a browser tab.
///
/// Serializes as a number. Deserializes from either a number or a decimal
/// string, because the settings store keeps `tabToRead` as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

/// Identifier of a browser window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

/// Identifier of a frame inside a tab. `0` is the top-level frame.
pub type FrameId = i64;

/// Identifier the debugging protocol assigns to a network request.
pub type RequestId = String;

impl TabId {
    pub fn get(self) -> i64 {
        self.0
    }

    /// Read a tab id out of a loosely typed settings value.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(TabId),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The representation written to the settings store.
    pub fn to_value(self) -> serde_json::Value {
        serde_json::Value::String(self.0.to_string())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TabId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TabId)
    }
}

impl From<i64> for TabId {
    fn from(value: i64) -> Self {
        TabId(value)
    }
}

impl<'de> Deserialize<'de> for TabId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        TabId::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid tab id: {value}")))
    }
}
