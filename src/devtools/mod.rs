//! Remote-debugging protocol surface.
//!
//! - [`protocol`]: typed event payloads and method names
//! - [`transport`]: the [`DebuggerTransport`](transport::DebuggerTransport) trait and best-effort helpers

pub mod protocol;
pub mod transport;
