//! Base types and error handling.
//!
//! - [`EngineError`](error::EngineError): the crate-wide error enum
//! - [`TransportResultExt`](context::TransportResultExt): best-effort handling of transport failures
//! - [`ids`]: tab, window and frame identifiers

pub mod context;
pub mod error;
pub mod ids;
