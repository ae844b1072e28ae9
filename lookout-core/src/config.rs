//! Configuration model for the Lookout live-view engine.
//!
//! Two kinds of configuration live here: the platform configuration supplied
//! by the external configuration collaborator (cameras and the restream
//! registry), and the engine's own tuning knobs with in-code defaults.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single named live stream belonging to a camera.
///
/// Roles are declared in configuration order; the first declared role is the
/// camera's default stream when no active selection overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRole {
    /// Role label, e.g. "main" or "sub".
    pub role: String,
    /// Stream name the role maps to, e.g. "front_sub".
    pub stream: String,
}

/// Per-camera live view configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraLiveConfig {
    /// Declared stream roles, in declaration order.
    #[serde(default)]
    pub streams: Vec<StreamRole>,
    /// Render height (pixels) for the software-decoded fallback stream.
    #[serde(default = "default_live_height")]
    pub height: u32,
    /// Encoding quality for the software-decoded fallback stream (1 highest, 31 lowest).
    #[serde(default = "default_live_quality")]
    pub quality: u8,
}

fn default_live_height() -> u32 {
    720
}

fn default_live_quality() -> u8 {
    8
}

impl Default for CameraLiveConfig {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            height: default_live_height(),
            quality: default_live_quality(),
        }
    }
}

/// A camera as supplied by the configuration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique camera name.
    pub name: String,
    /// Disabled cameras are excluded from live-view resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Live view settings for this camera.
    #[serde(default)]
    pub live: CameraLiveConfig,
}

fn default_enabled() -> bool {
    true
}

impl CameraConfig {
    /// First declared stream name, the deterministic default when no active
    /// selection applies.
    pub fn first_stream(&self) -> Option<&str> {
        self.live.streams.first().map(|role| role.stream.as_str())
    }

    /// Returns whether this camera declares `stream` under any role.
    pub fn declares_stream(&self, stream: &str) -> bool {
        self.live.streams.iter().any(|role| role.stream == stream)
    }
}

/// A restream relay entry for a single stream.
///
/// Presence of an entry in the registry is what marks a stream as restreamed;
/// the sources describe where the relay pulls the stream from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestreamEntry {
    /// Relay source specifications, e.g. RTSP URLs.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Registry of streams served through the restream relay, keyed by stream name.
///
/// A stream name absent from the registry is served directly from the source
/// device and never has metadata fetched for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestreamRegistry {
    streams: HashMap<String, RestreamEntry>,
}

impl RestreamRegistry {
    /// Returns whether `stream` is served through the restream relay.
    pub fn contains(&self, stream: &str) -> bool {
        self.streams.contains_key(stream)
    }

    /// Looks up the relay entry for `stream`.
    pub fn entry(&self, stream: &str) -> Option<&RestreamEntry> {
        self.streams.get(stream)
    }

    /// Registered stream names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, RestreamEntry)> for RestreamRegistry {
    fn from_iter<I: IntoIterator<Item = (S, RestreamEntry)>>(iter: I) -> Self {
        Self {
            streams: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }
}

/// Platform configuration as supplied by the configuration collaborator.
///
/// The engine treats a missing `PlatformConfig` ("not yet loaded") as having
/// no cameras, which is distinct from a loaded configuration that happens to
/// declare none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Configured cameras.
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
    /// Streams served through the restream relay.
    #[serde(default)]
    pub restream: RestreamRegistry,
}

impl PlatformConfig {
    /// Cameras that participate in live-view resolution.
    pub fn live_cameras(&self) -> impl Iterator<Item = &CameraConfig> {
        self.cameras.iter().filter(|camera| camera.enabled)
    }

    /// Finds an enabled camera by name.
    pub fn live_camera(&self, name: &str) -> Option<&CameraConfig> {
        self.live_cameras().find(|camera| camera.name == name)
    }
}

/// Central configuration for the live-view engine itself.
///
/// Groups tuning knobs into logical sections with sensible defaults, so
/// embedders only override what they need.
#[derive(Debug, Clone, Default)]
pub struct LookoutConfig {
    pub engine: EngineConfig,
    pub metadata: MetadataConfig,
}

/// Engine actor configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Command mailbox capacity.
    pub mailbox_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
        }
    }
}

/// Stream metadata fetching and caching configuration.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Upper bound on cached metadata entries.
    pub cache_capacity: NonZeroUsize,
    /// What happens to cached entries for streams no longer needed.
    pub retention: RetentionPolicy,
    /// Per-request timeout for the HTTP metadata provider.
    pub request_timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            cache_capacity: const { NonZeroUsize::new(256).unwrap() },
            retention: RetentionPolicy::RetainStale,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Retention policy for cached metadata of streams that left the needed set.
///
/// Either choice is correct for the resolver; this is purely a memory/latency
/// trade-off when users switch back and forth between streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep entries until LRU capacity evicts them.
    RetainStale,
    /// Drop entries as soon as no camera needs them.
    DropUnneeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_with_streams(name: &str, streams: &[(&str, &str)]) -> CameraConfig {
        CameraConfig {
            name: name.to_string(),
            enabled: true,
            live: CameraLiveConfig {
                streams: streams
                    .iter()
                    .map(|(role, stream)| StreamRole {
                        role: role.to_string(),
                        stream: stream.to_string(),
                    })
                    .collect(),
                ..CameraLiveConfig::default()
            },
        }
    }

    #[test]
    fn test_first_stream_follows_declaration_order() {
        let camera = camera_with_streams("front", &[("main", "front_main"), ("sub", "front_sub")]);
        assert_eq!(camera.first_stream(), Some("front_main"));

        let reversed = camera_with_streams("front", &[("sub", "front_sub"), ("main", "front_main")]);
        assert_eq!(reversed.first_stream(), Some("front_sub"));
    }

    #[test]
    fn test_declares_stream_matches_any_role() {
        let camera = camera_with_streams("front", &[("main", "front_main"), ("sub", "front_sub")]);
        assert!(camera.declares_stream("front_sub"));
        assert!(!camera.declares_stream("back_main"));
    }

    #[test]
    fn test_live_cameras_skips_disabled() {
        let mut disabled = camera_with_streams("back", &[("main", "back_main")]);
        disabled.enabled = false;

        let config = PlatformConfig {
            cameras: vec![
                camera_with_streams("front", &[("main", "front_main")]),
                disabled,
            ],
            restream: RestreamRegistry::default(),
        };

        let names: Vec<&str> = config.live_cameras().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["front"]);
        assert!(config.live_camera("back").is_none());
    }

    #[test]
    fn test_platform_config_deserializes_with_defaults() {
        let config: PlatformConfig = serde_json::from_str(
            r#"{
                "cameras": [
                    {
                        "name": "front",
                        "live": {
                            "streams": [
                                {"role": "main", "stream": "front_main"},
                                {"role": "sub", "stream": "front_sub"}
                            ]
                        }
                    }
                ],
                "restream": {
                    "front_sub": {"sources": ["rtsp://127.0.0.1:8554/front_sub"]}
                }
            }"#,
        )
        .expect("valid platform config");

        let camera = &config.cameras[0];
        assert!(camera.enabled);
        assert_eq!(camera.live.height, 720);
        assert_eq!(camera.live.quality, 8);
        assert_eq!(camera.first_stream(), Some("front_main"));
        assert!(config.restream.contains("front_sub"));
        assert!(!config.restream.contains("front_main"));
    }

    #[test]
    fn test_metadata_config_defaults() {
        let config = MetadataConfig::default();
        assert_eq!(config.cache_capacity.get(), 256);
        assert_eq!(config.retention, RetentionPolicy::RetainStale);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
