//! Event dispatcher.
//!
//! Each `on_*` handler turns one browser event into at most one submission
//! on the update queue and returns its [`TaskHandle`]. Cheap bookkeeping
//! (registry URL writes, request correlation) happens synchronously in the
//! handler; everything that touches the cookie store runs as a queued task.

use crate::base::context::TransportResultExt;
use crate::base::error::EngineError;
use crate::base::ids::{FrameId, TabId, WindowId};
use crate::cookies::dictionary::CookieDictionary;
use crate::cookies::record::CookieRecord;
use crate::cookies::parse::{
    parse_request_cookie_header, parse_request_will_be_sent_extra_info,
    parse_response_cookie_header, parse_response_received_extra_info, ParseContext,
};
use crate::cookies::store::CookieDataStore;
use crate::devtools::protocol::{
    self, IssueAddedEvent, RequestWillBeSentExtraInfoEvent, ResponseReceivedEvent,
    ResponseReceivedExtraInfoEvent,
};
use crate::devtools::transport::{ensure_attached, fetch_cookies, DebuggerTransport};
use crate::engine::config::EngineConfig;
use crate::engine::events::{
    header_values, ActiveInfo, DebuggerEvent, HttpHeader, InstallReason, OutboundMessage,
    RequestDetails, ResponseDetails, RuntimeMessage, StorageChanges, TabChangeInfo, TabInfo,
    TabPayload, TabStatus,
};
use crate::engine::host::{BrowserHost, MemorySettings, NoopHost, SettingsStore, StorageArea};
use crate::engine::queue::{SerializedQueue, TaskHandle};
use crate::engine::registry::{RequestCorrelation, TabRegistry};
use crate::engine::state::{EngineState, ProcessingMode, ALLOWED_NUMBER_OF_TABS, TAB_TO_READ};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Builder for [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    store: Arc<dyn CookieDataStore>,
    transport: Arc<dyn DebuggerTransport>,
    host: Arc<dyn BrowserHost>,
    settings: Arc<dyn SettingsStore>,
    dictionary: CookieDictionary,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn CookieDataStore>, transport: Arc<dyn DebuggerTransport>) -> Self {
        Self {
            config: EngineConfig::default(),
            store,
            transport,
            host: Arc::new(NoopHost),
            settings: Arc::new(MemorySettings::new()),
            dictionary: CookieDictionary::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: Arc<dyn BrowserHost>) -> Self {
        self.host = host;
        self
    }

    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn dictionary(mut self, dictionary: CookieDictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Build the engine and start its update queue.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Engine {
        let inner = EngineInner {
            state: Arc::new(EngineState::new(self.config.initial_mode)),
            registry: TabRegistry::new(),
            requests: RequestCorrelation::new(self.config.max_requests_per_tab),
            queue: SerializedQueue::new(),
            store: self.store,
            transport: self.transport,
            host: self.host,
            settings: self.settings,
            dictionary: Arc::new(self.dictionary),
            config: self.config,
        };
        Engine {
            inner: Arc::new(inner),
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    state: Arc<EngineState>,
    registry: TabRegistry,
    requests: RequestCorrelation,
    queue: SerializedQueue,
    store: Arc<dyn CookieDataStore>,
    transport: Arc<dyn DebuggerTransport>,
    host: Arc<dyn BrowserHost>,
    settings: Arc<dyn SettingsStore>,
    dictionary: Arc<CookieDictionary>,
}

/// Background event correlation engine.
///
/// Cheap to clone; clones share all state and the update queue.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("mode", &self.inner.state.mode())
            .field("tab_to_read", &self.inner.state.tab_to_read())
            .field("tabs", &self.inner.registry.len())
            .field("queue", &self.inner.queue)
            .finish()
    }
}

impl Engine {
    pub fn builder(
        store: Arc<dyn CookieDataStore>,
        transport: Arc<dyn DebuggerTransport>,
    ) -> EngineBuilder {
        EngineBuilder::new(store, transport)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn state(&self) -> &EngineState {
        &self.inner.state
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.inner.registry
    }

    pub fn requests(&self) -> &RequestCorrelation {
        &self.inner.requests
    }

    pub fn queue(&self) -> &SerializedQueue {
        &self.inner.queue
    }

    /// Wait until every task submitted so far has finished.
    pub async fn wait_idle(&self) {
        self.inner.queue.wait_idle().await;
    }

    /// Load the processing mode and focused tab from the settings store.
    ///
    /// A missing mode keeps the configured initial mode.
    pub async fn restore_settings(&self) -> Result<(), EngineError> {
        let settings = &self.inner.settings;
        if let Some(mode) = settings.get(StorageArea::Sync, ALLOWED_NUMBER_OF_TABS).await? {
            self.inner.state.set_mode(ProcessingMode::from_value(Some(&mode)));
        }
        let tab = settings.get(StorageArea::Local, TAB_TO_READ).await?;
        self.inner
            .state
            .set_tab_to_read(tab.as_ref().and_then(TabId::from_value));
        tracing::debug!(
            mode = %self.inner.state.mode(),
            tab_to_read = ?self.inner.state.tab_to_read(),
            "settings restored"
        );
        Ok(())
    }

    /// URL of `tab_id` if network events for it should be recorded.
    fn observed_tab_url(&self, tab_id: TabId) -> Option<String> {
        let Some(tab_url) = self.inner.registry.url(tab_id) else {
            tracing::trace!(tab_id = tab_id.get(), "ignoring network event for untracked tab");
            return None;
        };
        if tab_url == self.inner.config.new_tab_url {
            return None;
        }
        if !self.inner.state.admits(tab_id) {
            tracing::trace!(tab_id = tab_id.get(), "tab not admitted");
            return None;
        }
        Some(tab_url)
    }

    /// A response started arriving: record its `Set-Cookie` headers.
    pub fn on_response_started(&self, details: ResponseDetails) -> Option<TaskHandle> {
        let headers = details.response_headers?;
        self.submit_header_cookies(
            "response_cookies",
            HeaderCookies {
                tab_id: details.tab_id,
                url: details.url,
                frame_id: details.frame_id,
                header: "set-cookie",
                parse: parse_set_cookie_values,
            },
            &headers,
        )
    }

    /// A request is about to send its headers: record its `Cookie` headers.
    pub fn on_before_send_headers(&self, details: RequestDetails) -> Option<TaskHandle> {
        let headers = details.request_headers?;
        self.submit_header_cookies(
            "request_cookies",
            HeaderCookies {
                tab_id: details.tab_id,
                url: details.url,
                frame_id: details.frame_id,
                header: "cookie",
                parse: parse_request_cookie_header,
            },
            &headers,
        )
    }

    /// Queue a task that snapshots the live cookies for the request URL and
    /// records every `source.header` value.
    ///
    /// The snapshot is fetched inside the task so a drain also discards
    /// fetches that have not started yet.
    fn submit_header_cookies(
        &self,
        label: &'static str,
        source: HeaderCookies,
        headers: &[HttpHeader],
    ) -> Option<TaskHandle> {
        let tab_id = source.tab_id;
        let tab_url = self.observed_tab_url(tab_id)?;

        let values: Vec<String> = header_values(headers, source.header)
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return None;
        }

        let state = Arc::clone(&self.inner.state);
        let store = Arc::clone(&self.inner.store);
        let transport = Arc::clone(&self.inner.transport);
        let dictionary = Arc::clone(&self.inner.dictionary);

        Some(self.inner.queue.submit(label, async move {
            if !state.admits(tab_id) {
                return Ok(());
            }
            let snapshot = fetch_cookies(&*transport, tab_id, &source.url)
                .await
                .unwrap_or_default();
            let ctx = ParseContext {
                dictionary: &dictionary,
                tab_url: &tab_url,
                frame_id: Some(source.frame_id),
                snapshot: &snapshot,
            };
            let records: Vec<_> = values
                .iter()
                .flat_map(|header| (source.parse)(&source.url, header, &ctx))
                .collect();
            if records.is_empty() {
                return Ok(());
            }
            store.update(tab_id, records).await
        }))
    }

    /// Start tracking a new tab.
    pub fn on_tab_created(&self, tab: TabInfo) -> Option<TaskHandle> {
        let tab_id = tab.id?;
        self.inner.registry.set(tab_id, tab.url);

        let state = Arc::clone(&self.inner.state);
        let store = Arc::clone(&self.inner.store);
        let max_tracked = self.inner.config.max_tracked_tabs;
        let window_id = tab.window_id;

        Some(self.inner.queue.submit("tab_created", async move {
            if state.mode().is_restrictive() {
                let tracked = store.tracked_tabs().await?.len();
                let focused_elsewhere = state.tab_to_read().is_some_and(|t| t != tab_id);
                if tracked >= max_tracked && focused_elsewhere {
                    tracing::debug!(tab_id = tab_id.get(), tracked, "tab limit reached, not tracking");
                    return Ok(());
                }
            }
            store.add_tab_data(tab_id, window_id).await
        }))
    }

    pub fn on_tab_activated(&self, info: ActiveInfo) -> TaskHandle {
        let store = Arc::clone(&self.inner.store);
        let tab_id = info.tab_id;
        self.inner
            .queue
            .submit("tab_activated", async move { store.update_tab_focus(tab_id).await })
    }

    /// A tab closed: discard pending work and forget it.
    pub fn on_tab_removed(&self, tab_id: TabId) -> TaskHandle {
        self.inner.queue.drain_and_reset();
        self.inner.registry.remove(tab_id);
        self.inner.requests.forget_tab(tab_id);

        let store = Arc::clone(&self.inner.store);
        self.inner
            .queue
            .submit("tab_removed", async move { store.remove_tab_data(tab_id).await })
    }

    /// A tab changed. A navigation start clears the tab's cookie data.
    pub async fn on_tab_updated(
        &self,
        tab_id: TabId,
        change: TabChangeInfo,
        tab: TabInfo,
    ) -> Option<TaskHandle> {
        ensure_attached(
            &*self.inner.transport,
            tab_id,
            &self.inner.config.protocol_version,
        )
        .await;
        self.inner.registry.set(tab_id, tab.url.clone());

        if change.status != Some(TabStatus::Loading) || tab.url.is_none() {
            return None;
        }

        self.inner.queue.drain_and_reset();
        self.inner.requests.forget_tab(tab_id);
        let store = Arc::clone(&self.inner.store);
        Some(
            self.inner
                .queue
                .submit("tab_navigated", async move { store.remove_cookie_data(tab_id).await }),
        )
    }

    pub fn on_window_removed(&self, window_id: WindowId) -> TaskHandle {
        let store = Arc::clone(&self.inner.store);
        self.inner.queue.submit("window_removed", async move {
            store.remove_window_data(window_id).await
        })
    }

    /// The extension was installed or updated: reset settings.
    pub fn on_installed(&self, reason: InstallReason) -> TaskHandle {
        self.inner.queue.drain_and_reset();

        let settings = Arc::clone(&self.inner.settings);
        let state = Arc::clone(&self.inner.state);

        self.inner.queue.submit("installed", async move {
            settings.clear(StorageArea::Local).await?;
            state.set_tab_to_read(None);

            let write_mode = match reason {
                InstallReason::Install => {
                    settings.clear(StorageArea::Sync).await?;
                    true
                }
                InstallReason::Update => settings
                    .get(StorageArea::Sync, ALLOWED_NUMBER_OF_TABS)
                    .await?
                    .is_none(),
                InstallReason::ChromeUpdate | InstallReason::SharedModuleUpdate => false,
            };
            if write_mode {
                let mode = ProcessingMode::Single;
                settings
                    .set(StorageArea::Sync, ALLOWED_NUMBER_OF_TABS, Value::from(mode.as_str()))
                    .await?;
                state.set_mode(mode);
            }
            tracing::debug!(?reason, "settings reset after install");
            Ok(())
        })
    }

    /// Route a debugger protocol event.
    pub fn on_debugger_event(&self, event: DebuggerEvent) -> Option<TaskHandle> {
        let tab_id = event.source.tab_id?;
        let method = event.method.as_str();
        if !matches!(
            method,
            protocol::RESPONSE_RECEIVED
                | protocol::REQUEST_WILL_BE_SENT_EXTRA_INFO
                | protocol::RESPONSE_RECEIVED_EXTRA_INFO
                | protocol::ISSUE_ADDED
        ) {
            return None;
        }
        if !self.inner.state.admits(tab_id) {
            tracing::trace!(tab_id = tab_id.get(), method, "tab not admitted");
            return None;
        }

        let params = event.params.unwrap_or(Value::Null);
        let tab_url = self.inner.registry.url(tab_id).unwrap_or_default();

        match method {
            protocol::RESPONSE_RECEIVED => {
                let event: ResponseReceivedEvent = decode(method, params)?;
                self.inner
                    .requests
                    .record(tab_id, event.request_id, event.response.url);
                None
            }
            protocol::REQUEST_WILL_BE_SENT_EXTRA_INFO => {
                let event: RequestWillBeSentExtraInfoEvent = decode(method, params)?;
                if event.associated_cookies.is_empty() {
                    return None;
                }
                let request_url = self
                    .inner
                    .requests
                    .resolve_or(tab_id, &event.request_id, &tab_url);
                let records = parse_request_will_be_sent_extra_info(
                    &event,
                    &self.inner.dictionary,
                    &request_url,
                    &tab_url,
                );
                self.submit_update("request_extra_info", tab_id, records)
            }
            protocol::RESPONSE_RECEIVED_EXTRA_INFO => {
                let event: ResponseReceivedExtraInfoEvent = decode(method, params)?;
                event.set_cookie_header()?;
                let request_url = self
                    .inner
                    .requests
                    .resolve_or(tab_id, &event.request_id, &tab_url);
                let records = parse_response_received_extra_info(
                    &event,
                    &self.inner.dictionary,
                    &request_url,
                    &tab_url,
                );
                self.submit_update("response_extra_info", tab_id, records)
            }
            protocol::ISSUE_ADDED => {
                let event: IssueAddedEvent = decode(method, params)?;
                let issue = event.into_cookie_issue()?;
                let store = Arc::clone(&self.inner.store);
                Some(self.inner.queue.submit("audit_issue", async move {
                    store.add_audit_issue(tab_id, issue).await
                }))
            }
            _ => None,
        }
    }

    fn submit_update(
        &self,
        label: &'static str,
        tab_id: TabId,
        records: Vec<CookieRecord>,
    ) -> Option<TaskHandle> {
        if records.is_empty() {
            return None;
        }
        let store = Arc::clone(&self.inner.store);
        Some(
            self.inner
                .queue
                .submit(label, async move { store.update(tab_id, records).await }),
        )
    }

    /// Re-evaluate the allow-listed flag of the tab's cookies.
    pub fn apply_allow_list(&self, tab_id: TabId, domains: Vec<String>) -> TaskHandle {
        let store = Arc::clone(&self.inner.store);
        self.inner.queue.submit("allow_list", async move {
            store.apply_allow_list(tab_id, domains).await
        })
    }

    /// The panel's session state changed: reset the tab's value highlights.
    pub fn clear_highlights(&self, tab_id: TabId) -> TaskHandle {
        let store = Arc::clone(&self.inner.store);
        self.inner
            .queue
            .submit("clear_highlights", async move { store.clear_highlights(tab_id).await })
    }

    pub fn on_runtime_message(&self, message: RuntimeMessage) -> TaskHandle {
        match message {
            RuntimeMessage::SetTabToRead(payload) => self.listen_to_tab(payload.tab_id),
        }
    }

    /// Switch recording to `requested`, or to the inspected tab.
    fn listen_to_tab(&self, requested: Option<TabId>) -> TaskHandle {
        self.inner.queue.drain_and_reset();

        let state = Arc::clone(&self.inner.state);
        let store = Arc::clone(&self.inner.store);
        let transport = Arc::clone(&self.inner.transport);
        let host = Arc::clone(&self.inner.host);

        self.inner.queue.submit("set_tab_to_read", async move {
            let Some(tab_id) = requested.or_else(|| host.inspected_tab()) else {
                tracing::debug!("no tab to read");
                return Ok(());
            };

            if state.mode().is_restrictive() {
                for other in store.tracked_tabs().await? {
                    if other == tab_id {
                        continue;
                    }
                    store.remove_tab_data(other).await?;
                    transport.detach(other).await.best_effort(other.get(), "detach");
                    host.set_badge_text(other, "")
                        .await
                        .best_effort(other.get(), "clear badge");
                }
            }

            store.add_tab_data(tab_id, None).await?;

            let message = OutboundMessage::SyncTabToRead(TabPayload {
                tab_id: Some(tab_id),
            });
            host.broadcast(message)
                .await
                .best_effort(tab_id.get(), "broadcast");
            host.reload_tab(tab_id)
                .await
                .best_effort(tab_id.get(), "reload");
            Ok(())
        })
    }

    /// Local settings changed. Follows `tabToRead`.
    pub fn on_local_storage_changed(&self, changes: &StorageChanges) -> Option<TaskHandle> {
        let change = changes.get(TAB_TO_READ)?;
        let new_tab = change.new_value.as_ref().and_then(TabId::from_value);
        self.inner.state.set_tab_to_read(new_tab);

        let old_tab = change.old_value.as_ref().and_then(TabId::from_value)?;
        if Some(old_tab) == new_tab || !self.inner.state.mode().is_restrictive() {
            return None;
        }

        self.inner.queue.drain_and_reset();
        let store = Arc::clone(&self.inner.store);
        let host = Arc::clone(&self.inner.host);
        Some(self.inner.queue.submit("tab_to_read_changed", async move {
            store.remove_tab_data(old_tab).await?;
            host.set_badge_text(old_tab, "")
                .await
                .best_effort(old_tab.get(), "clear badge");
            Ok(())
        }))
    }

    /// Synced settings changed. Follows `allowedNumberOfTabs`.
    pub fn on_sync_storage_changed(&self, changes: &StorageChanges) {
        let Some(change) = changes.get(ALLOWED_NUMBER_OF_TABS) else {
            return;
        };
        self.inner.queue.drain_and_reset();
        self.inner
            .state
            .set_mode(ProcessingMode::from_value(change.new_value.as_ref()));
    }
}

type HeaderParser = fn(&str, &str, &ParseContext<'_>) -> Vec<CookieRecord>;

/// Cookie-carrying header of one web request.
struct HeaderCookies {
    tab_id: TabId,
    url: String,
    frame_id: FrameId,
    header: &'static str,
    parse: HeaderParser,
}

fn parse_set_cookie_values(url: &str, header: &str, ctx: &ParseContext<'_>) -> Vec<CookieRecord> {
    parse_response_cookie_header(url, header, ctx)
        .into_iter()
        .collect()
}

fn decode<T: DeserializeOwned>(method: &str, params: Value) -> Option<T> {
    match serde_json::from_value(params) {
        Ok(event) => Some(event),
        Err(e) => {
            let err = EngineError::invalid_event(method, &e);
            tracing::debug!(error = %err, "dropping malformed debugger event");
            None
        }
    }
}
