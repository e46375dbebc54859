//! Ergonomic error context helpers.
//!
//! Provides an extension trait for swallowing debugging-transport errors,
//! which are never allowed to abort event processing.

use crate::base::error::EngineError;

/// Extension trait for best-effort transport results.
pub trait TransportResultExt<T> {
    /// Turn a transport result into an `Option`, logging the failure.
    ///
    /// # Example
    /// ```ignore
    /// use cookiescope::base::context::TransportResultExt;
    ///
    /// let reply = transport
    ///     .send_command(tab_id, "Network.getCookies", params)
    ///     .await
    ///     .best_effort(tab_id, "Network.getCookies");
    /// ```
    fn best_effort(self, tab_id: i64, what: &str) -> Option<T>;
}

impl<T> TransportResultExt<T> for Result<T, EngineError> {
    fn best_effort(self, tab_id: i64, what: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(tab_id, what, error = %e, "transport call failed, continuing");
                None
            }
        }
    }
}
