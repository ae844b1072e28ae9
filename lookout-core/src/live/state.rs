//! Derived per-camera live-view state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::mode::LiveStreamMode;

/// Audio-output support for one stream of a camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSupport {
    /// Whether the stream can produce audible output for the client.
    pub supports_audio: bool,
    /// The camera the stream belongs to.
    pub camera_name: String,
}

/// The resolved live-view state of a single camera.
///
/// Written only by the resolver; consumers read snapshots and request a reset
/// instead of mutating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveModeState {
    /// Transport the client should use for this camera.
    pub preferred_mode: LiveStreamMode,
    /// Whether the camera's relevant stream is served through the relay.
    pub is_restreamed: bool,
    /// Audio support per declared restreamed stream name; non-restreamed
    /// cameras carry a single entry keyed by the camera name.
    pub audio_support: HashMap<String, AudioSupport>,
}

impl LiveModeState {
    /// Whether any of the camera's streams supports audio output.
    pub fn any_audio(&self) -> bool {
        self.audio_support.values().any(|audio| audio.supports_audio)
    }

    /// Audio support for a specific stream (or camera) key.
    pub fn audio_for(&self, key: &str) -> Option<&AudioSupport> {
        self.audio_support.get(key)
    }
}
