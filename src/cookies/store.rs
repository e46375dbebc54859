//! Per-tab cookie data store.
//!
//! [`CookieDataStore`] is the async service the engine writes into. Every
//! call is individually atomic; ordering across calls is provided by the
//! engine's update queue, not by the store.

use crate::base::error::EngineError;
use crate::base::ids::{TabId, WindowId};
use crate::cookies::record::{extend_unique, CookieKey, CookieRecord};
use crate::devtools::protocol::CookieIssueDetails;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Future returned by store operations.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, EngineError>>;

/// Async key-value store of accumulated cookie data, keyed by tab.
pub trait CookieDataStore: Send + Sync {
    /// Merge `cookies` into the tab's data, creating the tab entry if needed.
    fn update(&self, tab_id: TabId, cookies: Vec<CookieRecord>) -> StoreFuture<'_, ()>;

    /// Start tracking a tab with empty data.
    fn add_tab_data(&self, tab_id: TabId, window_id: Option<WindowId>) -> StoreFuture<'_, ()>;

    /// Forget a tab entirely.
    fn remove_tab_data(&self, tab_id: TabId) -> StoreFuture<'_, ()>;

    /// Clear a tab's cookies and issues but keep tracking it.
    fn remove_cookie_data(&self, tab_id: TabId) -> StoreFuture<'_, ()>;

    /// Forget every tab that belonged to a window.
    fn remove_window_data(&self, window_id: WindowId) -> StoreFuture<'_, ()>;

    /// Mark a tab as the focused one.
    fn update_tab_focus(&self, tab_id: TabId) -> StoreFuture<'_, ()>;

    /// Attach a cookie audit issue to the tab's data.
    fn add_audit_issue(&self, tab_id: TabId, issue: CookieIssueDetails) -> StoreFuture<'_, ()>;

    /// Flag every cookie of the tab whose domain is in `domains` (or a
    /// subdomain of one) as allow-listed, and clear the flag on the rest.
    fn apply_allow_list(&self, tab_id: TabId, domains: Vec<String>) -> StoreFuture<'_, ()>;

    /// Clear the changed-value highlight of every cookie of the tab.
    fn clear_highlights(&self, tab_id: TabId) -> StoreFuture<'_, ()>;

    /// Tabs currently tracked.
    fn tracked_tabs(&self) -> StoreFuture<'_, Vec<TabId>>;
}

impl<T: CookieDataStore + ?Sized> CookieDataStore for Arc<T> {
    fn update(&self, tab_id: TabId, cookies: Vec<CookieRecord>) -> StoreFuture<'_, ()> {
        (**self).update(tab_id, cookies)
    }

    fn add_tab_data(&self, tab_id: TabId, window_id: Option<WindowId>) -> StoreFuture<'_, ()> {
        (**self).add_tab_data(tab_id, window_id)
    }

    fn remove_tab_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        (**self).remove_tab_data(tab_id)
    }

    fn remove_cookie_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        (**self).remove_cookie_data(tab_id)
    }

    fn remove_window_data(&self, window_id: WindowId) -> StoreFuture<'_, ()> {
        (**self).remove_window_data(window_id)
    }

    fn update_tab_focus(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        (**self).update_tab_focus(tab_id)
    }

    fn add_audit_issue(&self, tab_id: TabId, issue: CookieIssueDetails) -> StoreFuture<'_, ()> {
        (**self).add_audit_issue(tab_id, issue)
    }

    fn apply_allow_list(&self, tab_id: TabId, domains: Vec<String>) -> StoreFuture<'_, ()> {
        (**self).apply_allow_list(tab_id, domains)
    }

    fn clear_highlights(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        (**self).clear_highlights(tab_id)
    }

    fn tracked_tabs(&self) -> StoreFuture<'_, Vec<TabId>> {
        (**self).tracked_tabs()
    }
}

/// Accumulated data for one tab.
#[derive(Debug, Clone, Default)]
pub struct TabData {
    pub window_id: Option<WindowId>,
    pub focused: bool,
    pub cookies: BTreeMap<CookieKey, CookieRecord>,
    /// Audit issues that did not name a cookie present in `cookies`.
    pub unmatched_issues: Vec<CookieIssueDetails>,
}

impl TabData {
    fn merge(&mut self, record: CookieRecord) {
        let key = record.key();
        match self.cookies.get_mut(&key) {
            Some(existing) => existing.merge(record),
            None => {
                self.cookies.insert(key, record);
            }
        }
    }

    fn apply_issue(&mut self, issue: CookieIssueDetails) {
        let target = issue.cookie.as_ref().and_then(|affected| {
            let domain = affected.domain.trim_start_matches('.');
            self.cookies.values_mut().find(|c| {
                c.name == affected.name
                    && c.domain == domain
                    && (affected.path.is_empty() || c.path == affected.path)
            })
        });

        match target {
            Some(cookie) => {
                extend_unique(
                    &mut cookie.warning_reasons,
                    issue.cookie_warning_reasons.iter().flatten().cloned(),
                );
                extend_unique(
                    &mut cookie.blocked_reasons,
                    issue.cookie_exclusion_reasons.iter().flatten().cloned(),
                );
            }
            None => {
                if !self.unmatched_issues.contains(&issue) {
                    self.unmatched_issues.push(issue);
                }
            }
        }
    }
}

/// In-memory [`CookieDataStore`].
///
/// Records with the same `(name, domain, path)` are merged, so repeated
/// observations of a cookie accumulate frame ids and reasons.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    tabs: Arc<DashMap<TabId, TabData>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a tab's cookies.
    pub fn cookies(&self, tab_id: TabId) -> Vec<CookieRecord> {
        self.tabs
            .get(&tab_id)
            .map(|data| data.cookies.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of a tab's full data.
    pub fn tab_data(&self, tab_id: TabId) -> Option<TabData> {
        self.tabs.get(&tab_id).map(|data| data.clone())
    }

    pub fn is_tracked(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    pub fn focused_tab(&self) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|entry| entry.value().focused)
            .map(|entry| *entry.key())
    }

    /// Total cookie count across tabs.
    pub fn total_cookie_count(&self) -> usize {
        self.tabs.iter().map(|e| e.value().cookies.len()).sum()
    }

    fn apply_update(&self, tab_id: TabId, cookies: Vec<CookieRecord>) {
        let mut entry = self.tabs.entry(tab_id).or_default();
        for record in cookies {
            entry.merge(record);
        }
    }

    fn apply_focus(&self, tab_id: TabId) {
        for mut entry in self.tabs.iter_mut() {
            let focused = *entry.key() == tab_id;
            entry.value_mut().focused = focused;
        }
    }
}

impl CookieDataStore for MemoryCookieStore {
    fn update(&self, tab_id: TabId, cookies: Vec<CookieRecord>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.apply_update(tab_id, cookies);
            Ok(())
        })
    }

    fn add_tab_data(&self, tab_id: TabId, window_id: Option<WindowId>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut entry = self.tabs.entry(tab_id).or_default();
            if window_id.is_some() {
                entry.window_id = window_id;
            }
            Ok(())
        })
    }

    fn remove_tab_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.tabs.remove(&tab_id);
            Ok(())
        })
    }

    fn remove_cookie_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut data) = self.tabs.get_mut(&tab_id) {
                data.cookies.clear();
                data.unmatched_issues.clear();
            }
            Ok(())
        })
    }

    fn remove_window_data(&self, window_id: WindowId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.tabs.retain(|_, data| data.window_id != Some(window_id));
            Ok(())
        })
    }

    fn update_tab_focus(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.apply_focus(tab_id);
            Ok(())
        })
    }

    fn add_audit_issue(&self, tab_id: TabId, issue: CookieIssueDetails) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.tabs.entry(tab_id).or_default().apply_issue(issue);
            Ok(())
        })
    }

    fn apply_allow_list(&self, tab_id: TabId, domains: Vec<String>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut data) = self.tabs.get_mut(&tab_id) {
                for cookie in data.cookies.values_mut() {
                    cookie.allow_listed = cookie.matches_allow_list(&domains);
                }
            }
            Ok(())
        })
    }

    fn clear_highlights(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut data) = self.tabs.get_mut(&tab_id) {
                data.cookies
                    .values_mut()
                    .for_each(|cookie| cookie.highlighted = false);
            }
            Ok(())
        })
    }

    fn tracked_tabs(&self) -> StoreFuture<'_, Vec<TabId>> {
        Box::pin(async move {
            let mut tabs: Vec<TabId> = self.tabs.iter().map(|e| *e.key()).collect();
            tabs.sort();
            Ok(tabs)
        })
    }
}
