//! Typed payloads of the remote-debugging protocol events the engine consumes.
//!
//! Only the fields the engine reads are modelled; everything else in the
//! protocol payload is ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
pub const REQUEST_WILL_BE_SENT_EXTRA_INFO: &str = "Network.requestWillBeSentExtraInfo";
pub const RESPONSE_RECEIVED_EXTRA_INFO: &str = "Network.responseReceivedExtraInfo";
pub const ISSUE_ADDED: &str = "Audits.issueAdded";

pub const GET_COOKIES: &str = "Network.getCookies";
pub const NETWORK_ENABLE: &str = "Network.enable";
pub const AUDITS_ENABLE: &str = "Audits.enable";

/// Issue code carried by cookie-related audit issues.
pub const COOKIE_ISSUE: &str = "CookieIssue";

/// `Network.Cookie`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Seconds since the epoch; `-1` for session cookies.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub session: bool,
    #[serde(default)]
    pub same_site: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub partition_key: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

/// Reply of `Network.getCookies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetCookiesReply {
    #[serde(default)]
    pub cookies: Vec<ProtocolCookie>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInfo {
    pub url: String,
}

/// `Network.responseReceived`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedEvent {
    pub request_id: String,
    pub response: ResponseInfo,
}

/// A cookie the browser considered attaching to a request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedCookie {
    pub cookie: ProtocolCookie,
    #[serde(default)]
    pub blocked_reasons: Vec<String>,
}

/// `Network.requestWillBeSentExtraInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentExtraInfoEvent {
    pub request_id: String,
    #[serde(default)]
    pub associated_cookies: Vec<AssociatedCookie>,
}

/// A `Set-Cookie` line the browser refused to store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSetCookie {
    #[serde(default)]
    pub blocked_reasons: Vec<String>,
    pub cookie_line: String,
    #[serde(default)]
    pub cookie: Option<ProtocolCookie>,
}

/// `Network.responseReceivedExtraInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedExtraInfoEvent {
    pub request_id: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub blocked_cookies: Vec<BlockedSetCookie>,
    #[serde(default)]
    pub cookie_partition_key: Option<String>,
}

impl ResponseReceivedExtraInfoEvent {
    /// The raw `Set-Cookie` header. The protocol reports it either
    /// lower-cased or capitalized depending on the transport.
    pub fn set_cookie_header(&self) -> Option<&str> {
        self.headers
            .get("set-cookie")
            .or_else(|| self.headers.get("Set-Cookie"))
            .map(String::as_str)
    }
}

/// Cookie named by an audit issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedCookie {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: String,
}

/// `Audits.CookieIssueDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieIssueDetails {
    #[serde(default)]
    pub cookie: Option<AffectedCookie>,
    #[serde(default)]
    pub raw_cookie_line: Option<String>,
    #[serde(default)]
    pub cookie_warning_reasons: Option<Vec<String>>,
    #[serde(default)]
    pub cookie_exclusion_reasons: Option<Vec<String>>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub site_for_cookies: Option<String>,
    #[serde(default)]
    pub cookie_url: Option<String>,
}

impl CookieIssueDetails {
    /// Whether the issue names a cookie or any reason worth recording.
    pub fn is_actionable(&self) -> bool {
        self.cookie.is_some()
            || self.cookie_warning_reasons.is_some()
            || self.cookie_exclusion_reasons.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorIssueDetails {
    #[serde(default)]
    pub cookie_issue_details: Option<CookieIssueDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectorIssue {
    pub code: String,
    #[serde(default)]
    pub details: InspectorIssueDetails,
}

/// `Audits.issueAdded`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueAddedEvent {
    pub issue: InspectorIssue,
}

impl IssueAddedEvent {
    /// Cookie issue details, when this is an actionable cookie issue.
    pub fn into_cookie_issue(self) -> Option<CookieIssueDetails> {
        if self.issue.code != COOKIE_ISSUE {
            return None;
        }
        self.issue
            .details
            .cookie_issue_details
            .filter(CookieIssueDetails::is_actionable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protocol_cookie_defaults() {
        let cookie: ProtocolCookie =
            serde_json::from_value(json!({"name": "a", "value": "1", "domain": ".example.com"}))
                .unwrap();
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.expires, -1.0);
        assert!(!cookie.secure);
    }

    #[test]
    fn test_set_cookie_header_casing() {
        let lower: ResponseReceivedExtraInfoEvent = serde_json::from_value(json!({
            "requestId": "1",
            "headers": {"set-cookie": "a=1"}
        }))
        .unwrap();
        assert_eq!(lower.set_cookie_header(), Some("a=1"));

        let upper: ResponseReceivedExtraInfoEvent = serde_json::from_value(json!({
            "requestId": "1",
            "headers": {"Set-Cookie": "b=2"}
        }))
        .unwrap();
        assert_eq!(upper.set_cookie_header(), Some("b=2"));

        let none: ResponseReceivedExtraInfoEvent = serde_json::from_value(json!({
            "requestId": "1",
            "headers": {"content-type": "text/html"}
        }))
        .unwrap();
        assert_eq!(none.set_cookie_header(), None);
    }

    #[test]
    fn test_issue_filter() {
        let issue: IssueAddedEvent = serde_json::from_value(json!({
            "issue": {
                "code": "CookieIssue",
                "details": {"cookieIssueDetails": {"cookieWarningReasons": ["WarnSameSiteUnspecifiedLaxAllowUnsafe"]}}
            }
        }))
        .unwrap();
        assert!(issue.into_cookie_issue().is_some());

        let empty: IssueAddedEvent = serde_json::from_value(json!({
            "issue": {"code": "CookieIssue", "details": {"cookieIssueDetails": {"operation": "ReadCookie"}}}
        }))
        .unwrap();
        assert!(empty.into_cookie_issue().is_none());

        let other: IssueAddedEvent = serde_json::from_value(json!({
            "issue": {"code": "MixedContentIssue", "details": {}}
        }))
        .unwrap();
        assert!(other.into_cookie_issue().is_none());
    }
}
