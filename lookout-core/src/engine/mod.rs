//! Live-view engine actor.
//!
//! The engine owns the resolver state and metadata cache behind an actor
//! task. Commands arrive through a mailbox and are processed one at a time,
//! so every derivation sees a consistent view of its inputs without locks.
//! Metadata fetches run on spawned tasks and report back through an internal
//! channel; their arrival only ever refines audio support.

pub mod actor;
pub mod commands;
pub mod core;
pub mod handle;

pub use actor::spawn_live_view_engine;
pub use commands::LiveViewCommand;
pub use handle::LiveViewHandle;
pub use self::core::{LiveStateSnapshot, LiveViewEngine};

/// Errors surfaced by the engine handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine actor is no longer running.
    #[error("live-view engine has shut down")]
    Shutdown,

    /// The named camera is not part of the current configuration.
    #[error("camera not found: {name}")]
    CameraNotFound { name: String },
}
