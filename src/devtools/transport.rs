//! Debugging transport abstraction.
//!
//! The transport is the browser's remote-debugging channel. Every call on it
//! is best-effort: the engine never lets a transport failure abort an event.

use crate::base::context::TransportResultExt;
use crate::base::error::EngineError;
use crate::base::ids::TabId;
use crate::devtools::protocol::{self, GetCookiesReply, ProtocolCookie};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::Arc;

/// Future returned by transport calls.
pub type TransportFuture<'a, T> = BoxFuture<'a, Result<T, EngineError>>;

/// Attach/detach and command channel to a tab's debugger.
///
/// Implementations must be thread-safe; the engine calls them from event
/// handlers and from queued tasks.
pub trait DebuggerTransport: Send + Sync {
    /// Attach to a tab. Fails with [`EngineError::AlreadyAttached`] when a
    /// session already exists.
    fn attach<'a>(&'a self, tab_id: TabId, version: &'a str) -> TransportFuture<'a, ()>;

    /// Detach from a tab.
    fn detach(&self, tab_id: TabId) -> TransportFuture<'_, ()>;

    /// Send a protocol command and return its JSON reply.
    fn send_command<'a>(
        &'a self,
        tab_id: TabId,
        method: &'a str,
        params: Value,
    ) -> TransportFuture<'a, Value>;
}

impl<T: DebuggerTransport + ?Sized> DebuggerTransport for Arc<T> {
    fn attach<'a>(&'a self, tab_id: TabId, version: &'a str) -> TransportFuture<'a, ()> {
        (**self).attach(tab_id, version)
    }

    fn detach(&self, tab_id: TabId) -> TransportFuture<'_, ()> {
        (**self).detach(tab_id)
    }

    fn send_command<'a>(
        &'a self,
        tab_id: TabId,
        method: &'a str,
        params: Value,
    ) -> TransportFuture<'a, Value> {
        (**self).send_command(tab_id, method, params)
    }
}

/// Fetch the live cookies the browser holds for `url`.
///
/// Returns `None` when the transport is unavailable or the reply is
/// malformed; callers fall back to an empty snapshot.
pub async fn fetch_cookies(
    transport: &dyn DebuggerTransport,
    tab_id: TabId,
    url: &str,
) -> Option<Vec<ProtocolCookie>> {
    let reply = transport
        .send_command(tab_id, protocol::GET_COOKIES, json!({ "urls": [url] }))
        .await
        .best_effort(tab_id.get(), protocol::GET_COOKIES)?;

    match serde_json::from_value::<GetCookiesReply>(reply) {
        Ok(reply) => Some(reply.cookies),
        Err(e) => {
            tracing::debug!(tab_id = tab_id.get(), error = %e, "malformed Network.getCookies reply");
            None
        }
    }
}

/// Attach to a tab and enable the `Network` and `Audits` domains.
///
/// Idempotent: an existing session is reused and every failure is swallowed.
pub async fn ensure_attached(transport: &dyn DebuggerTransport, tab_id: TabId, version: &str) {
    let id = tab_id.get();
    match transport.attach(tab_id, version).await {
        Ok(()) => tracing::debug!(tab_id = id, "debugger attached"),
        Err(EngineError::AlreadyAttached { .. }) => {}
        Err(e) => tracing::debug!(tab_id = id, error = %e, "debugger attach failed"),
    }

    transport
        .send_command(tab_id, protocol::NETWORK_ENABLE, Value::Null)
        .await
        .best_effort(id, protocol::NETWORK_ENABLE);
    transport
        .send_command(tab_id, protocol::AUDITS_ENABLE, Value::Null)
        .await
        .best_effort(id, protocol::AUDITS_ENABLE);
}
