//! Relevant-stream resolution and metadata-need collection.

use std::collections::HashSet;

use super::ActiveStreamSelection;
use crate::config::{CameraConfig, PlatformConfig};

/// Resolves the stream name currently relevant for `camera`.
///
/// An active selection wins when it names a stream the camera declares;
/// otherwise the camera's first declared role applies. A selection for an
/// undeclared stream is logged and ignored rather than failing the camera;
/// likely configuration drift, see DESIGN.md.
pub fn relevant_stream<'a>(
    camera: &'a CameraConfig,
    active: Option<&'a ActiveStreamSelection>,
) -> Option<&'a str> {
    if let Some(selected) = active.and_then(|selection| selection.get(&camera.name)) {
        if camera.declares_stream(selected) {
            return Some(selected.as_str());
        }
        tracing::warn!(
            "active selection for camera '{}' names undeclared stream '{selected}', \
             falling back to first declared stream",
            camera.name
        );
    }

    camera.first_stream()
}

/// The minimal set of stream names requiring metadata.
///
/// A stream needs metadata iff some enabled camera declares it and the
/// restream relay serves it. Direct streams never appear: the relay knows
/// nothing about them, so fetching would be wasted work. Active selections
/// cannot widen the set: a selection only ever resolves to a declared role.
/// A configuration that has not loaded yet yields the empty set.
pub fn restreamed_stream_names(config: Option<&PlatformConfig>) -> HashSet<String> {
    let Some(config) = config else {
        return HashSet::new();
    };

    let mut names = HashSet::new();
    for camera in config.live_cameras() {
        // Every declared role can surface in the audio map, not just the
        // currently relevant stream.
        for role in &camera.live.streams {
            if config.restream.contains(&role.stream) {
                names.insert(role.stream.clone());
            }
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{CameraLiveConfig, RestreamEntry, RestreamRegistry, StreamRole};

    fn camera(name: &str, streams: &[&str]) -> CameraConfig {
        CameraConfig {
            name: name.to_string(),
            enabled: true,
            live: CameraLiveConfig {
                streams: streams
                    .iter()
                    .enumerate()
                    .map(|(i, stream)| StreamRole {
                        role: format!("role{i}"),
                        stream: stream.to_string(),
                    })
                    .collect(),
                ..CameraLiveConfig::default()
            },
        }
    }

    fn registry(streams: &[&str]) -> RestreamRegistry {
        streams
            .iter()
            .map(|s| (s.to_string(), RestreamEntry::default()))
            .collect()
    }

    #[test]
    fn test_relevant_stream_defaults_to_first_declared() {
        let camera = camera("front", &["front_main", "front_sub"]);
        assert_eq!(relevant_stream(&camera, None), Some("front_main"));
    }

    #[test]
    fn test_relevant_stream_honors_valid_selection() {
        let camera = camera("front", &["front_main", "front_sub"]);
        let active = HashMap::from([("front".to_string(), "front_sub".to_string())]);
        assert_eq!(relevant_stream(&camera, Some(&active)), Some("front_sub"));
    }

    #[test]
    fn test_relevant_stream_ignores_undeclared_selection() {
        let camera = camera("front", &["front_main", "front_sub"]);
        let active = HashMap::from([("front".to_string(), "ghost_stream".to_string())]);
        assert_eq!(relevant_stream(&camera, Some(&active)), Some("front_main"));
    }

    #[test]
    fn test_relevant_stream_for_streamless_camera() {
        let camera = camera("bare", &[]);
        assert_eq!(relevant_stream(&camera, None), None);
    }

    #[test]
    fn test_collection_excludes_direct_streams() {
        let config = PlatformConfig {
            cameras: vec![
                camera("front", &["front_main", "front_sub"]),
                camera("back", &["back_raw"]),
            ],
            restream: registry(&["front_sub"]),
        };

        let names = restreamed_stream_names(Some(&config));
        assert_eq!(names, HashSet::from(["front_sub".to_string()]));
    }

    #[test]
    fn test_collection_skips_disabled_cameras() {
        let mut disabled = camera("back", &["back_sub"]);
        disabled.enabled = false;

        let config = PlatformConfig {
            cameras: vec![camera("front", &["front_sub"]), disabled],
            restream: registry(&["front_sub", "back_sub"]),
        };

        let names = restreamed_stream_names(Some(&config));
        assert_eq!(names, HashSet::from(["front_sub".to_string()]));
    }

    #[test]
    fn test_collection_empty_when_config_not_loaded() {
        assert!(restreamed_stream_names(None).is_empty());
    }

    #[test]
    fn test_collection_deduplicates_shared_streams() {
        let config = PlatformConfig {
            cameras: vec![
                camera("front", &["shared_sub"]),
                camera("back", &["shared_sub"]),
            ],
            restream: registry(&["shared_sub"]),
        };

        let names = restreamed_stream_names(Some(&config));
        assert_eq!(names.len(), 1);
    }
}
