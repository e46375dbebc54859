//! Raw events delivered by the browser to the background process.
//!
//! Field names follow the browser's JSON payloads so hosts can deserialize
//! them directly.

use crate::base::ids::{FrameId, TabId, WindowId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One HTTP header as reported by the network observation hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Values of every header named `name` (case-insensitive).
pub(crate) fn header_values<'a>(
    headers: &'a [HttpHeader],
    name: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .iter()
        .filter(move |h| h.name.eq_ignore_ascii_case(name))
        .filter_map(|h| h.value.as_deref())
        .filter(|v| !v.is_empty())
}

/// A response started arriving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    pub tab_id: TabId,
    pub url: String,
    #[serde(default)]
    pub frame_id: FrameId,
    #[serde(default)]
    pub response_headers: Option<Vec<HttpHeader>>,
}

/// A request is about to send its headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub tab_id: TabId,
    pub url: String,
    #[serde(default)]
    pub frame_id: FrameId,
    #[serde(default)]
    pub request_headers: Option<Vec<HttpHeader>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub window_id: Option<WindowId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInfo {
    pub tab_id: TabId,
    pub window_id: WindowId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabChangeInfo {
    #[serde(default)]
    pub status: Option<TabStatus>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Target a debugger event came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debuggee {
    #[serde(default)]
    pub tab_id: Option<TabId>,
}

/// One event from the remote-debugging protocol stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebuggerEvent {
    pub source: Debuggee,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

impl DebuggerEvent {
    pub fn new(tab_id: TabId, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            source: Debuggee {
                tab_id: Some(tab_id),
            },
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallReason {
    Install,
    Update,
    ChromeUpdate,
    SharedModuleUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPayload {
    #[serde(default)]
    pub tab_id: Option<TabId>,
}

/// Message received from another extension context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RuntimeMessage {
    #[serde(rename = "SET_TAB_TO_READ")]
    SetTabToRead(TabPayload),
}

/// Message broadcast to other extension contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum OutboundMessage {
    #[serde(rename = "syncCookieStore:SET_TAB_TO_READ")]
    SyncTabToRead(TabPayload),
}

/// Old and new value of one settings key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default)]
    pub old_value: Option<serde_json::Value>,
    #[serde(default)]
    pub new_value: Option<serde_json::Value>,
}

/// Settings change notification, keyed by settings key.
pub type StorageChanges = HashMap<String, StorageChange>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_runtime_message_wire_format() {
        let msg: RuntimeMessage =
            serde_json::from_value(json!({"type": "SET_TAB_TO_READ", "payload": {"tabId": 12}}))
                .unwrap();
        assert_eq!(
            msg,
            RuntimeMessage::SetTabToRead(TabPayload {
                tab_id: Some(TabId(12))
            })
        );

        let out = OutboundMessage::SyncTabToRead(TabPayload {
            tab_id: Some(TabId(12)),
        });
        assert_eq!(
            serde_json::to_value(out).unwrap(),
            json!({"type": "syncCookieStore:SET_TAB_TO_READ", "payload": {"tabId": 12}})
        );
    }

    #[test]
    fn test_header_values_case_insensitive() {
        let headers = vec![
            HttpHeader::new("Set-Cookie", "a=1"),
            HttpHeader::new("content-type", "text/html"),
            HttpHeader::new("set-cookie", "b=2"),
            HttpHeader {
                name: "set-cookie".to_string(),
                value: None,
            },
        ];
        let values: Vec<&str> = header_values(&headers, "set-cookie").collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_tab_change_info() {
        let info: TabChangeInfo =
            serde_json::from_value(json!({"status": "loading", "url": "https://a.test/"})).unwrap();
        assert_eq!(info.status, Some(TabStatus::Loading));
    }
}
