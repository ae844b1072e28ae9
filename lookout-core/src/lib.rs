//! Lookout Core - Live-view transport negotiation for camera platforms
//!
//! This crate decides, per configured camera, which playback transport a
//! browser client should use for live video (`mse`, `webrtc`, or `jsmpeg`),
//! whether the camera's stream is served through the restream relay, and
//! which streams can produce audio output, and keeps those answers current
//! as configuration, stream selection, and deferred stream metadata change.

pub mod capability;
pub mod config;
pub mod engine;
pub mod live;
pub mod metadata;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use capability::MediaCapabilities;
pub use config::{LookoutConfig, PlatformConfig};
pub use engine::{EngineError, LiveViewHandle, spawn_live_view_engine};
pub use live::{LiveModeState, LiveStreamMode};
pub use metadata::{MetadataError, MetadataProvider, StreamMetadata};

/// Core errors that can bubble up from any Lookout subsystem.
#[derive(Debug, thiserror::Error)]
pub enum LookoutError {
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LookoutError>;
