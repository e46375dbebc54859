//! Engine configuration.

use crate::engine::state::ProcessingMode;

/// Configuration options for [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tabs tracked at once in single mode before new tabs are refused.
    pub max_tracked_tabs: usize,

    /// URL of the browser's new-tab page. Network events for a tab showing
    /// it are ignored.
    pub new_tab_url: String,

    /// Remote-debugging protocol version requested on attach.
    pub protocol_version: String,

    /// Correlated requests remembered per tab.
    pub max_requests_per_tab: usize,

    /// Processing mode before any setting is restored.
    pub initial_mode: ProcessingMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tracked_tabs: 1,
            new_tab_url: "chrome://newtab/".to_string(),
            protocol_version: "1.3".to_string(),
            max_requests_per_tab: 1000,
            initial_mode: ProcessingMode::Unlimited,
        }
    }
}
