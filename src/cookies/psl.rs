//! Public Suffix List (PSL) helpers.
//!
//! Used to reject cookies set on public suffixes like `.com` and to decide
//! whether a cookie is first-party relative to the tab that observed it.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};
use url::Url;

/// Lower-case a host or cookie domain and strip the leading dot a
/// `Domain` attribute may carry.
fn normalize(domain: &str) -> String {
    domain.trim_start_matches('.').to_ascii_lowercase()
}

/// Whether `domain` is itself a public suffix (`com`, `co.uk`, `github.io`).
pub fn is_public_suffix(domain: &str) -> bool {
    let domain = normalize(domain);
    List.suffix(domain.as_bytes())
        .is_some_and(|suffix| suffix.as_bytes() == domain.as_bytes())
}

/// Registrable domain (eTLD+1): `sub.example.com` gives `example.com`.
/// `None` for a bare public suffix.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain = normalize(domain);
    let registrable = psl::domain(domain.as_bytes())?;
    std::str::from_utf8(registrable.as_bytes())
        .ok()
        .map(str::to_string)
}

/// Whether a response from `host` may set a cookie with this `Domain`
/// attribute: the host must domain-match it and it must not be a public
/// suffix.
pub fn is_valid_cookie_domain(cookie_domain: &str, host: &str) -> bool {
    let cookie_domain = normalize(cookie_domain);
    let host = normalize(host);
    if is_public_suffix(&cookie_domain) {
        return false;
    }
    host == cookie_domain
        || host
            .strip_suffix(cookie_domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Whether a cookie on `cookie_domain` is first-party for the page at
/// `top_level_url`.
///
/// Returns `None` when the page URL has no host (e.g. `about:blank`).
pub fn is_first_party(cookie_domain: &str, top_level_url: &str) -> Option<bool> {
    let page = Url::parse(top_level_url).ok()?;
    let page_host = page.host_str()?;
    let page_site = registrable_domain(page_host).unwrap_or_else(|| normalize(page_host));
    let cookie_site = registrable_domain(cookie_domain).unwrap_or_else(|| normalize(cookie_domain));
    Some(page_site == cookie_site)
}
