//! Process-wide processing mode and focused tab.
//!
//! Single source of truth for cross-event admission decisions. Readable
//! synchronously from any handler; writers publish through `watch`
//! channels so hosts can subscribe to changes.

use crate::base::ids::TabId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;

/// Settings key holding the processing mode (synced area).
pub const ALLOWED_NUMBER_OF_TABS: &str = "allowedNumberOfTabs";

/// Settings key holding the focused tab (local area).
pub const TAB_TO_READ: &str = "tabToRead";

/// How many tabs the engine records cookies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Every tracked tab is recorded.
    #[default]
    Unlimited,
    /// Only the focused tab (`tabToRead`) is recorded.
    Single,
}

impl ProcessingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::Unlimited => "unlimited",
            ProcessingMode::Single => "single",
        }
    }

    pub fn is_restrictive(self) -> bool {
        self == ProcessingMode::Single
    }

    /// Read a mode from a settings value. Anything other than the two known
    /// strings is treated as unlimited.
    pub fn from_value(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unlimited" => Ok(ProcessingMode::Unlimited),
            "single" => Ok(ProcessingMode::Single),
            other => Err(format!("unknown processing mode: {other}")),
        }
    }
}

/// Shared processing mode and focused tab.
#[derive(Debug)]
pub struct EngineState {
    mode: watch::Sender<ProcessingMode>,
    tab_to_read: watch::Sender<Option<TabId>>,
}

impl EngineState {
    pub fn new(mode: ProcessingMode) -> Self {
        let (mode, _) = watch::channel(mode);
        let (tab_to_read, _) = watch::channel(None);
        Self { mode, tab_to_read }
    }

    pub fn mode(&self) -> ProcessingMode {
        *self.mode.borrow()
    }

    pub fn set_mode(&self, mode: ProcessingMode) {
        let previous = self.mode.send_replace(mode);
        if previous != mode {
            tracing::debug!(from = %previous, to = %mode, "processing mode changed");
        }
    }

    pub fn tab_to_read(&self) -> Option<TabId> {
        *self.tab_to_read.borrow()
    }

    /// Set the focused tab, returning the previous one.
    pub fn set_tab_to_read(&self, tab_id: Option<TabId>) -> Option<TabId> {
        self.tab_to_read.send_replace(tab_id)
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<ProcessingMode> {
        self.mode.subscribe()
    }

    pub fn subscribe_tab_to_read(&self) -> watch::Receiver<Option<TabId>> {
        self.tab_to_read.subscribe()
    }

    /// Whether events for `tab_id` may mutate cookie data.
    ///
    /// In single mode only the focused tab is admitted; with no focused tab
    /// nothing is.
    pub fn admits(&self, tab_id: TabId) -> bool {
        match self.mode() {
            ProcessingMode::Unlimited => true,
            ProcessingMode::Single => self.tab_to_read() == Some(tab_id),
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(ProcessingMode::default())
    }
}
