//! Cookie header parsers.
//!
//! Pure functions that turn raw header values and debugger extra-info
//! payloads into [`CookieRecord`]s. A value that does not parse yields no
//! record; nothing here returns an error.

use crate::base::ids::FrameId;
use crate::cookies::dictionary::CookieDictionary;
use crate::cookies::psl;
use crate::cookies::record::{CookiePriority, CookieRecord, HeaderType, SameSite};
use crate::devtools::protocol::{
    ProtocolCookie, RequestWillBeSentExtraInfoEvent, ResponseReceivedExtraInfoEvent,
};
use cookie::Cookie;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Everything a header parser needs besides the header itself.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub dictionary: &'a CookieDictionary,
    /// Top-level URL of the tab, used for first-party classification.
    pub tab_url: &'a str,
    pub frame_id: Option<FrameId>,
    /// Live cookies reported by the browser for the request URL.
    pub snapshot: &'a [ProtocolCookie],
}

/// Parse one `Set-Cookie` header value observed on a response to `url`.
pub fn parse_response_cookie_header(
    url: &str,
    header: &str,
    ctx: &ParseContext<'_>,
) -> Option<CookieRecord> {
    let request_url = Url::parse(url).ok()?;
    let host = request_url.host_str()?.to_lowercase();

    let parsed = match Cookie::parse(header) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::trace!(error = %e, "dropping unparsable set-cookie header");
            return None;
        }
    };

    let live = find_live(ctx.snapshot, parsed.name(), &host);

    let domain = if let Some(d) = parsed.domain() {
        let d = d.trim_start_matches('.').to_lowercase();
        if !psl::is_valid_cookie_domain(&d, &host) {
            return None;
        }
        d
    } else if let Some(live) = live {
        live.domain.trim_start_matches('.').to_lowercase()
    } else {
        host.clone()
    };

    let path = parsed
        .path()
        .map(str::to_string)
        .or_else(|| live.map(|c| c.path.clone()))
        .unwrap_or_else(|| default_path(&request_url));

    let expires = match parsed.max_age() {
        Some(max_age) => Some(max_age_expiry(OffsetDateTime::now_utc(), max_age)),
        None => parsed.expires_datetime().map(|e| e.unix_timestamp()),
    };

    let same_site = match parsed.same_site() {
        Some(cookie::SameSite::Lax) => SameSite::Lax,
        Some(cookie::SameSite::Strict) => SameSite::Strict,
        Some(cookie::SameSite::None) => SameSite::NoRestriction,
        None => SameSite::Unspecified,
    };

    let mut record = CookieRecord::new(
        parsed.name(),
        parsed.value(),
        domain,
        path,
        HeaderType::Response,
        url,
    );
    record.expires = expires;
    record.http_only = parsed.http_only().unwrap_or(false);
    record.secure = parsed.secure().unwrap_or(false);
    record.same_site = same_site;
    if let Some(live) = live {
        record.priority = CookiePriority::from_protocol(live.priority.as_deref());
        record.partition_key = live.partition_key.clone();
    }
    classify(&mut record, ctx);
    Some(record)
}

/// Parse a request `Cookie` header, which packs several cookies into one
/// value (`a=1; b=2`).
pub fn parse_request_cookie_header(
    url: &str,
    header: &str,
    ctx: &ParseContext<'_>,
) -> Vec<CookieRecord> {
    let Some(request_url) = Url::parse(url).ok() else {
        return Vec::new();
    };
    let Some(host) = request_url.host_str().map(str::to_lowercase) else {
        return Vec::new();
    };

    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .map(|parsed| {
            let mut record = match find_live(ctx.snapshot, parsed.name(), &host) {
                Some(live) => record_from_protocol(live, HeaderType::Request, url),
                None => CookieRecord::new(
                    parsed.name(),
                    parsed.value(),
                    host.clone(),
                    "/",
                    HeaderType::Request,
                    url,
                ),
            };
            record.value = parsed.value().to_string();
            classify(&mut record, ctx);
            record
        })
        .collect()
}

/// Records for the cookies the browser attached (or refused to attach) to
/// a request, from `Network.requestWillBeSentExtraInfo`.
pub fn parse_request_will_be_sent_extra_info(
    event: &RequestWillBeSentExtraInfoEvent,
    dictionary: &CookieDictionary,
    request_url: &str,
    tab_url: &str,
) -> Vec<CookieRecord> {
    let ctx = ParseContext {
        dictionary,
        tab_url,
        frame_id: None,
        snapshot: &[],
    };
    event
        .associated_cookies
        .iter()
        .map(|associated| {
            let mut record = record_from_protocol(&associated.cookie, HeaderType::Request, request_url);
            record.blocked_reasons = associated.blocked_reasons.clone();
            classify(&mut record, &ctx);
            record
        })
        .collect()
}

/// Records for every `Set-Cookie` line of a response, from
/// `Network.responseReceivedExtraInfo`. The protocol joins multiple
/// `Set-Cookie` headers with newlines.
pub fn parse_response_received_extra_info(
    event: &ResponseReceivedExtraInfoEvent,
    dictionary: &CookieDictionary,
    request_url: &str,
    tab_url: &str,
) -> Vec<CookieRecord> {
    let Some(header) = event.set_cookie_header() else {
        return Vec::new();
    };
    let ctx = ParseContext {
        dictionary,
        tab_url,
        frame_id: None,
        snapshot: &[],
    };

    header
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut record = parse_response_cookie_header(request_url, line, &ctx)?;
            if let Some(blocked) = event.blocked_cookies.iter().find(|b| b.cookie_line.trim() == line) {
                record.blocked_reasons = blocked.blocked_reasons.clone();
            }
            if record.partition_key.is_none() {
                record.partition_key = event.cookie_partition_key.clone();
            }
            Some(record)
        })
        .collect()
}

fn record_from_protocol(cookie: &ProtocolCookie, header_type: HeaderType, url: &str) -> CookieRecord {
    let mut record = CookieRecord::new(
        cookie.name.clone(),
        cookie.value.clone(),
        cookie.domain.trim_start_matches('.').to_lowercase(),
        cookie.path.clone(),
        header_type,
        url,
    );
    record.expires = if cookie.session || cookie.expires < 0.0 {
        None
    } else {
        Some(cookie.expires as i64)
    };
    record.http_only = cookie.http_only;
    record.secure = cookie.secure;
    record.same_site = SameSite::from_protocol(cookie.same_site.as_deref());
    record.priority = CookiePriority::from_protocol(cookie.priority.as_deref());
    record.partition_key = cookie.partition_key.clone();
    record
}

fn classify(record: &mut CookieRecord, ctx: &ParseContext<'_>) {
    record.analytics = ctx.dictionary.lookup(&record.name).cloned();
    record.is_first_party = psl::is_first_party(&record.domain, ctx.tab_url);
    if let Some(frame_id) = ctx.frame_id {
        record.frame_ids = vec![frame_id];
    }
}

fn find_live<'a>(snapshot: &'a [ProtocolCookie], name: &str, host: &str) -> Option<&'a ProtocolCookie> {
    snapshot
        .iter()
        .find(|c| c.name == name && domain_matches(&c.domain, host))
}

/// RFC 6265 domain matching: exact match, or `host` is a subdomain.
fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.');
    if host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }
    host.len() > cookie_domain.len()
        && host.to_lowercase().ends_with(&format!(".{}", cookie_domain.to_lowercase()))
}

/// Unix expiry of a `Max-Age` cookie. Saturates instead of overflowing on
/// huge values.
fn max_age_expiry(now: OffsetDateTime, max_age: Duration) -> i64 {
    now.unix_timestamp().saturating_add(max_age.whole_seconds())
}

/// RFC 6265 default-path of a request URL.
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}
