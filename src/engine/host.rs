//! Browser-side services the engine calls back into.
//!
//! [`BrowserHost`] covers the extension UI surface (badge, messaging, tab
//! reload); [`SettingsStore`] is the persisted key-value settings with a
//! device-local and a synced area.

use crate::base::error::EngineError;
use crate::base::ids::TabId;
use crate::engine::events::OutboundMessage;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Future returned by host and settings calls.
pub type HostFuture<'a, T> = BoxFuture<'a, Result<T, EngineError>>;

pub trait BrowserHost: Send + Sync {
    /// Set the action badge text shown for a tab; an empty string clears it.
    fn set_badge_text<'a>(&'a self, tab_id: TabId, text: &'a str) -> HostFuture<'a, ()>;

    /// Broadcast a message to every other extension context.
    fn broadcast(&self, message: OutboundMessage) -> HostFuture<'_, ()>;

    fn reload_tab(&self, tab_id: TabId) -> HostFuture<'_, ()>;

    /// Tab inspected by the open developer tools panel, if any.
    fn inspected_tab(&self) -> Option<TabId>;
}

/// Host that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl BrowserHost for NoopHost {
    fn set_badge_text<'a>(&'a self, _tab_id: TabId, _text: &'a str) -> HostFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn broadcast(&self, _message: OutboundMessage) -> HostFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn reload_tab(&self, _tab_id: TabId) -> HostFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn inspected_tab(&self) -> Option<TabId> {
        None
    }
}

/// Settings area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Device-local settings (`tabToRead`).
    Local,
    /// Settings synced across the user's browsers (`allowedNumberOfTabs`).
    Sync,
}

pub trait SettingsStore: Send + Sync {
    fn get<'a>(&'a self, area: StorageArea, key: &'a str) -> HostFuture<'a, Option<Value>>;

    fn set<'a>(&'a self, area: StorageArea, key: &'a str, value: Value) -> HostFuture<'a, ()>;

    fn clear(&self, area: StorageArea) -> HostFuture<'_, ()>;
}

/// In-memory [`SettingsStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Arc<DashMap<(StorageArea, String), Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read, for hosts and tests.
    pub fn peek(&self, area: StorageArea, key: &str) -> Option<Value> {
        self.values
            .get(&(area, key.to_string()))
            .map(|v| v.value().clone())
    }

    pub fn len(&self, area: StorageArea) -> usize {
        self.values.iter().filter(|e| e.key().0 == area).count()
    }
}

impl SettingsStore for MemorySettings {
    fn get<'a>(&'a self, area: StorageArea, key: &'a str) -> HostFuture<'a, Option<Value>> {
        Box::pin(async move { Ok(self.peek(area, key)) })
    }

    fn set<'a>(&'a self, area: StorageArea, key: &'a str, value: Value) -> HostFuture<'a, ()> {
        Box::pin(async move {
            self.values.insert((area, key.to_string()), value);
            Ok(())
        })
    }

    fn clear(&self, area: StorageArea) -> HostFuture<'_, ()> {
        Box::pin(async move {
            self.values.retain(|(a, _), _| *a != area);
            Ok(())
        })
    }
}
