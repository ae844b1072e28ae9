//! The central per-camera derivation.

use std::collections::HashMap;

use super::state::{AudioSupport, LiveModeState};
use super::{ActiveStreamSelection, audio, collector, mode};
use crate::capability::MediaCapabilities;
use crate::config::{CameraConfig, PlatformConfig};
use crate::metadata::MetadataCache;

/// Owner of all derived [`LiveModeState`] entries, keyed by camera name.
///
/// Resolution is total: every enabled camera in the supplied configuration
/// receives exactly one entry, regardless of how much metadata has arrived.
/// Re-resolving with identical inputs yields identical state.
#[derive(Default)]
pub struct LiveModeResolver {
    states: HashMap<String, LiveModeState>,
}

impl LiveModeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every camera's state from the current inputs.
    ///
    /// States are rebuilt, not patched: cameras that left the configuration
    /// disappear, new ones appear, and everything else is derived afresh.
    /// With no configuration yet there are no entries: "not yet loaded"
    /// resolves to nothing rather than erroring.
    pub fn resolve_all(
        &mut self,
        config: Option<&PlatformConfig>,
        active: Option<&ActiveStreamSelection>,
        metadata: &MetadataCache,
        capabilities: &MediaCapabilities,
    ) {
        let Some(config) = config else {
            self.states.clear();
            return;
        };

        self.states = config
            .live_cameras()
            .map(|camera| {
                (
                    camera.name.clone(),
                    derive_state(camera, config, active, metadata, capabilities),
                )
            })
            .collect();

        tracing::debug!(
            "resolved live modes for {} camera(s), mse={}",
            self.states.len(),
            capabilities.supports_mse
        );
    }

    /// Re-derives `preferred_mode` and `is_restreamed` for one camera,
    /// leaving every other camera untouched, along with the camera's own
    /// audio map.
    ///
    /// Used to discard a consumer-side manual transport override without a
    /// full recomputation pass. Returns the camera's updated state, or `None`
    /// when the camera is not part of the current configuration.
    pub fn reset(
        &mut self,
        camera_name: &str,
        config: Option<&PlatformConfig>,
        active: Option<&ActiveStreamSelection>,
        capabilities: &MediaCapabilities,
    ) -> Option<&LiveModeState> {
        let config = config?;
        let camera = config.live_camera(camera_name)?;
        let is_restreamed = is_restreamed(camera, config, active);
        let preferred_mode = mode::preferred_mode(is_restreamed, capabilities);

        let state = self
            .states
            .entry(camera.name.clone())
            .or_insert_with(|| LiveModeState {
                preferred_mode,
                is_restreamed,
                audio_support: offline_audio_support(camera),
            });
        state.preferred_mode = preferred_mode;
        state.is_restreamed = is_restreamed;

        tracing::debug!(
            "reset camera '{camera_name}' to mode {preferred_mode}, restreamed={is_restreamed}"
        );
        Some(state)
    }

    /// The resolved state for one camera.
    pub fn state(&self, camera_name: &str) -> Option<&LiveModeState> {
        self.states.get(camera_name)
    }

    /// All resolved states, keyed by camera name.
    pub fn states(&self) -> &HashMap<String, LiveModeState> {
        &self.states
    }
}

fn is_restreamed(
    camera: &CameraConfig,
    config: &PlatformConfig,
    active: Option<&ActiveStreamSelection>,
) -> bool {
    collector::relevant_stream(camera, active)
        .is_some_and(|stream| config.restream.contains(stream))
}

fn derive_state(
    camera: &CameraConfig,
    config: &PlatformConfig,
    active: Option<&ActiveStreamSelection>,
    metadata: &MetadataCache,
    capabilities: &MediaCapabilities,
) -> LiveModeState {
    let is_restreamed = is_restreamed(camera, config, active);
    let preferred_mode = mode::preferred_mode(is_restreamed, capabilities);

    let audio_support = if is_restreamed {
        // Every declared role that goes through the relay gets probed, not
        // just the relevant stream, so switching streams needs no refetch.
        camera
            .live
            .streams
            .iter()
            .filter(|role| config.restream.contains(&role.stream))
            .map(|role| {
                (
                    role.stream.clone(),
                    AudioSupport {
                        supports_audio: audio::supports_audio_output(metadata.lookup(&role.stream)),
                        camera_name: camera.name.clone(),
                    },
                )
            })
            .collect()
    } else {
        offline_audio_support(camera)
    };

    LiveModeState {
        preferred_mode,
        is_restreamed,
        audio_support,
    }
}

/// Audio map for a camera whose relevant stream bypasses the relay: there is
/// no restreamed stream to probe, so the camera itself is the key.
fn offline_audio_support(camera: &CameraConfig) -> HashMap<String, AudioSupport> {
    HashMap::from([(
        camera.name.clone(),
        AudioSupport {
            supports_audio: false,
            camera_name: camera.name.clone(),
        },
    )])
}
