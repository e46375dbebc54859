//! Event correlation and serialized update engine.

pub mod config;
pub mod dispatcher;
pub mod events;
pub mod host;
pub mod queue;
pub mod registry;
pub mod state;

pub use config::EngineConfig;
pub use dispatcher::{Engine, EngineBuilder};
pub use queue::{SerializedQueue, TaskHandle};
pub use state::{EngineState, ProcessingMode};
