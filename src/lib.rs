//! # cookiescope
//!
//! Background core of a cookie-analysis browser extension.
//!
//! `cookiescope` observes network traffic and remote-debugging events for
//! browser tabs, turns the cookies it sees into normalized records, and
//! keeps a per-tab cookie store consistent while events from independent
//! sources arrive out of order.
//!
//! ## Features
//!
//! - **Serialized updates**: every store mutation runs on one FIFO queue
//!   that can be drained when a tab navigates or closes
//! - **Event correlation**: debugger extra-info events are matched to the
//!   response URL of their request
//! - **Single-tab mode**: restrict recording to the tab being inspected
//! - **Cookie parsing**: `Set-Cookie` and `Cookie` headers with PSL domain
//!   validation and first-party classification
//! - **Library detection**: deprecated Google sign-in APIs in page scripts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cookiescope::cookies::store::MemoryCookieStore;
//! use cookiescope::engine::Engine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryCookieStore::new());
//!     let engine = Engine::builder(store.clone(), Arc::new(MyTransport)).build();
//!     engine.restore_settings().await.unwrap();
//!
//!     engine.on_tab_created(tab);
//!     engine.on_response_started(details);
//!     engine.wait_idle().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Identifiers and error definitions
//! - [`cookies`] - Cookie records, parsers, dictionary and the per-tab store
//! - [`devtools`] - Remote-debugging protocol payloads and transport
//! - [`engine`] - Update queue, event dispatcher and shared state
//! - [`detection`] - Deprecated sign-in library detection

pub mod base;
pub mod cookies;
pub mod detection;
pub mod devtools;
pub mod engine;
