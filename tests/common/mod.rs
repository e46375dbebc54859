//! Shared fakes for integration tests.
#![allow(dead_code)]

use cookiescope::base::error::EngineError;
use cookiescope::base::ids::{TabId, WindowId};
use cookiescope::cookies::record::CookieRecord;
use cookiescope::cookies::store::{CookieDataStore, MemoryCookieStore, StoreFuture};
use cookiescope::devtools::protocol::CookieIssueDetails;
use cookiescope::devtools::transport::{DebuggerTransport, TransportFuture};
use cookiescope::engine::events::{
    ActiveInfo, HttpHeader, OutboundMessage, ResponseDetails, TabInfo,
};
use cookiescope::engine::host::{BrowserHost, HostFuture};
use cookiescope::engine::Engine;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Transport that records every command and answers `Network.getCookies`
/// with a configurable reply.
#[derive(Default)]
pub struct MockTransport {
    pub attached: Mutex<HashSet<TabId>>,
    pub commands: Mutex<Vec<(TabId, String)>>,
    pub detached: Mutex<Vec<TabId>>,
    pub cookies_reply: Mutex<Option<Value>>,
    pub fail_commands: Mutex<bool>,
    /// When set, `Network.getCookies` waits for a notification on it.
    pub cookies_gate: Mutex<Option<Arc<Notify>>>,
    /// Notified whenever `Network.getCookies` is received.
    pub cookies_requested: Notify,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_cookies_reply(&self, reply: Value) {
        *self.cookies_reply.lock().unwrap() = Some(reply);
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_commands.lock().unwrap() = failing;
    }

    /// Hold every `Network.getCookies` reply until the returned gate is
    /// notified once per call.
    pub fn gate_cookies(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.cookies_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn commands(&self) -> Vec<(TabId, String)> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m == method)
            .count()
    }
}

impl DebuggerTransport for MockTransport {
    fn attach<'a>(&'a self, tab_id: TabId, _version: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            if self.attached.lock().unwrap().insert(tab_id) {
                Ok(())
            } else {
                Err(EngineError::AlreadyAttached {
                    tab_id: tab_id.get(),
                })
            }
        })
    }

    fn detach(&self, tab_id: TabId) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.detached.lock().unwrap().push(tab_id);
            if self.attached.lock().unwrap().remove(&tab_id) {
                Ok(())
            } else {
                Err(EngineError::NotAttached {
                    tab_id: tab_id.get(),
                })
            }
        })
    }

    fn send_command<'a>(
        &'a self,
        tab_id: TabId,
        method: &'a str,
        _params: Value,
    ) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            self.commands
                .lock()
                .unwrap()
                .push((tab_id, method.to_string()));
            if method == "Network.getCookies" {
                self.cookies_requested.notify_one();
                let gate = self.cookies_gate.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.notified().await;
                }
            }
            if *self.fail_commands.lock().unwrap() {
                return Err(EngineError::TransportUnavailable);
            }
            match method {
                "Network.getCookies" => Ok(self
                    .cookies_reply
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| json!({ "cookies": [] }))),
                _ => Ok(json!({})),
            }
        })
    }
}

/// One call made on the cookie store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Update(TabId, usize),
    AddTabData(TabId),
    RemoveTabData(TabId),
    RemoveCookieData(TabId),
    RemoveWindowData(WindowId),
    UpdateTabFocus(TabId),
    AddAuditIssue(TabId),
    ApplyAllowList(TabId),
    ClearHighlights(TabId),
}

impl StoreCall {
    pub fn is_mutation_of(&self, tab: TabId) -> bool {
        match self {
            StoreCall::Update(t, _)
            | StoreCall::AddTabData(t)
            | StoreCall::RemoveTabData(t)
            | StoreCall::RemoveCookieData(t)
            | StoreCall::UpdateTabFocus(t)
            | StoreCall::AddAuditIssue(t)
            | StoreCall::ApplyAllowList(t)
            | StoreCall::ClearHighlights(t) => *t == tab,
            StoreCall::RemoveWindowData(_) => false,
        }
    }
}

/// [`MemoryCookieStore`] that logs every call in order.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryCookieStore,
    pub calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Update(..)))
            .collect()
    }

    fn log(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CookieDataStore for RecordingStore {
    fn update(&self, tab_id: TabId, cookies: Vec<CookieRecord>) -> StoreFuture<'_, ()> {
        self.log(StoreCall::Update(tab_id, cookies.len()));
        self.inner.update(tab_id, cookies)
    }

    fn add_tab_data(&self, tab_id: TabId, window_id: Option<WindowId>) -> StoreFuture<'_, ()> {
        self.log(StoreCall::AddTabData(tab_id));
        self.inner.add_tab_data(tab_id, window_id)
    }

    fn remove_tab_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        self.log(StoreCall::RemoveTabData(tab_id));
        self.inner.remove_tab_data(tab_id)
    }

    fn remove_cookie_data(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        self.log(StoreCall::RemoveCookieData(tab_id));
        self.inner.remove_cookie_data(tab_id)
    }

    fn remove_window_data(&self, window_id: WindowId) -> StoreFuture<'_, ()> {
        self.log(StoreCall::RemoveWindowData(window_id));
        self.inner.remove_window_data(window_id)
    }

    fn update_tab_focus(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        self.log(StoreCall::UpdateTabFocus(tab_id));
        self.inner.update_tab_focus(tab_id)
    }

    fn add_audit_issue(&self, tab_id: TabId, issue: CookieIssueDetails) -> StoreFuture<'_, ()> {
        self.log(StoreCall::AddAuditIssue(tab_id));
        self.inner.add_audit_issue(tab_id, issue)
    }

    fn apply_allow_list(&self, tab_id: TabId, domains: Vec<String>) -> StoreFuture<'_, ()> {
        self.log(StoreCall::ApplyAllowList(tab_id));
        self.inner.apply_allow_list(tab_id, domains)
    }

    fn clear_highlights(&self, tab_id: TabId) -> StoreFuture<'_, ()> {
        self.log(StoreCall::ClearHighlights(tab_id));
        self.inner.clear_highlights(tab_id)
    }

    fn tracked_tabs(&self) -> StoreFuture<'_, Vec<TabId>> {
        self.inner.tracked_tabs()
    }
}

/// One call made on the browser host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Badge(TabId, String),
    Broadcast(OutboundMessage),
    Reload(TabId),
}

#[derive(Default)]
pub struct RecordingHost {
    pub calls: Mutex<Vec<HostCall>>,
    pub inspected: Mutex<Option<TabId>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl BrowserHost for RecordingHost {
    fn set_badge_text<'a>(&'a self, tab_id: TabId, text: &'a str) -> HostFuture<'a, ()> {
        self.calls
            .lock()
            .unwrap()
            .push(HostCall::Badge(tab_id, text.to_string()));
        Box::pin(async { Ok(()) })
    }

    fn broadcast(&self, message: OutboundMessage) -> HostFuture<'_, ()> {
        self.calls.lock().unwrap().push(HostCall::Broadcast(message));
        Box::pin(async { Ok(()) })
    }

    fn reload_tab(&self, tab_id: TabId) -> HostFuture<'_, ()> {
        self.calls.lock().unwrap().push(HostCall::Reload(tab_id));
        Box::pin(async { Ok(()) })
    }

    fn inspected_tab(&self) -> Option<TabId> {
        *self.inspected.lock().unwrap()
    }
}

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<RecordingStore>,
    pub transport: Arc<MockTransport>,
    pub host: Arc<RecordingHost>,
}

pub fn harness() -> Harness {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let host = RecordingHost::new();
    let engine = Engine::builder(store.clone(), transport.clone())
        .host(host.clone())
        .build();
    Harness {
        engine,
        store,
        transport,
        host,
    }
}

pub fn tab(id: i64, url: &str) -> TabInfo {
    TabInfo {
        id: Some(TabId(id)),
        url: Some(url.to_string()),
        window_id: Some(WindowId(1)),
    }
}

pub fn activated(id: i64) -> ActiveInfo {
    ActiveInfo {
        tab_id: TabId(id),
        window_id: WindowId(1),
    }
}

pub fn response(tab: i64, url: &str, set_cookies: &[&str]) -> ResponseDetails {
    ResponseDetails {
        tab_id: TabId(tab),
        url: url.to_string(),
        frame_id: 0,
        response_headers: Some(
            set_cookies
                .iter()
                .map(|v| HttpHeader::new("Set-Cookie", *v))
                .collect(),
        ),
    }
}
