//! Per-tab registry and request correlation map.
//!
//! Neither map serializes access on its own. Writes happen inside queued
//! tasks or in the short synchronous sections of the dispatcher (tab
//! created/updated and `Network.responseReceived`); a reader may see a URL
//! that is one event stale.

use crate::base::ids::{RequestId, TabId};
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Last-known state of a browser tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabState {
    pub tab_id: TabId,
    pub url: Option<String>,
}

/// Tab id to last-known URL.
#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    tabs: Arc<DashMap<TabId, TabState>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a tab's state.
    pub fn set(&self, tab_id: TabId, url: Option<String>) {
        self.tabs.insert(tab_id, TabState { tab_id, url });
    }

    pub fn remove(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.remove(&tab_id).map(|(_, state)| state)
    }

    pub fn get(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.get(&tab_id).map(|s| s.clone())
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    /// URL of a tracked tab; `None` if untracked or the URL is unknown.
    pub fn url(&self, tab_id: TabId) -> Option<String> {
        self.tabs.get(&tab_id).and_then(|s| s.url.clone())
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

#[derive(Debug, Default)]
struct TabRequests {
    urls: HashMap<RequestId, String>,
    order: VecDeque<RequestId>,
}

/// `(tab, request id)` to the response URL of that request.
///
/// Each tab keeps at most `capacity` requests; the oldest request is
/// evicted first. A tab's entries are dropped when it navigates or closes.
#[derive(Debug, Clone)]
pub struct RequestCorrelation {
    by_tab: Arc<DashMap<TabId, TabRequests>>,
    capacity: usize,
}

impl RequestCorrelation {
    pub fn new(capacity: usize) -> Self {
        Self {
            by_tab: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Remember the URL a request was answered from.
    pub fn record(&self, tab_id: TabId, request_id: RequestId, url: String) {
        let mut entry = self.by_tab.entry(tab_id).or_default();
        let requests = entry.value_mut();

        if requests.urls.insert(request_id.clone(), url).is_none() {
            requests.order.push_back(request_id);
        }

        while requests.urls.len() > self.capacity {
            let Some(oldest) = requests.order.pop_front() else {
                break;
            };
            requests.urls.remove(&oldest);
        }
    }

    pub fn resolve(&self, tab_id: TabId, request_id: &str) -> Option<String> {
        self.by_tab
            .get(&tab_id)
            .and_then(|requests| requests.urls.get(request_id).cloned())
    }

    /// Resolve a request URL, falling back to the tab's last-known URL.
    pub fn resolve_or(&self, tab_id: TabId, request_id: &str, fallback: &str) -> String {
        self.resolve(tab_id, request_id)
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn forget_tab(&self, tab_id: TabId) {
        self.by_tab.remove(&tab_id);
    }

    /// Number of correlated requests held for a tab.
    pub fn len(&self, tab_id: TabId) -> usize {
        self.by_tab.get(&tab_id).map_or(0, |r| r.urls.len())
    }
}
