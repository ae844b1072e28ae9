//! End-to-end engine behavior: negotiation, deferred metadata, resets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::capability::MediaCapabilities;
use lookout_core::config::{
    CameraConfig, CameraLiveConfig, LookoutConfig, PlatformConfig, RestreamEntry, RestreamRegistry,
    StreamRole,
};
use lookout_core::engine::EngineError;
use lookout_core::live::LiveStreamMode;
use lookout_core::metadata::{ProducerMetadata, SimulationMetadataProvider, StreamMetadata};
use lookout_core::{LiveViewHandle, spawn_live_view_engine};

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

fn audio_metadata(codec: &str) -> StreamMetadata {
    StreamMetadata {
        producers: vec![ProducerMetadata {
            url: None,
            medias: vec![
                "video, recvonly, H264".to_string(),
                format!("audio, recvonly, {codec}"),
            ],
        }],
    }
}

/// Camera `front` on a restreamed stream, camera `back` on a direct one.
fn two_camera_config() -> PlatformConfig {
    PlatformConfig {
        cameras: vec![
            camera("front", &["front_sub"]),
            camera("back", &["back_raw"]),
        ],
        restream: registry(&["front_sub"]),
    }
}

/// Polls the handle until `predicate` holds or the timeout elapses.
async fn wait_for_states(
    handle: &LiveViewHandle,
    predicate: impl Fn(&HashMap<String, lookout_core::LiveModeState>) -> bool,
) -> HashMap<String, lookout_core::LiveModeState> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let states = handle.live_states();
        if predicate(&states) {
            return states;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for engine state, last seen: {states:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_negotiates_transports_for_mse_client() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");

    let front = handle.live_state("front").expect("front resolved");
    assert_eq!(front.preferred_mode, LiveStreamMode::Mse);
    assert!(front.is_restreamed);

    let back = handle.live_state("back").expect("back resolved");
    assert_eq!(back.preferred_mode, LiveStreamMode::Jsmpeg);
    assert!(!back.is_restreamed);
    let back_audio = back.audio_for("back").expect("camera-keyed entry");
    assert!(!back_audio.supports_audio);
    assert_eq!(back_audio.camera_name, "back");
}

#[tokio::test]
async fn test_client_without_mse_gets_webrtc_for_restreamed() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(false),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");

    assert_eq!(
        handle.live_state("front").expect("front resolved").preferred_mode,
        LiveStreamMode::Webrtc
    );
    assert_eq!(
        handle.live_state("back").expect("back resolved").preferred_mode,
        LiveStreamMode::Jsmpeg
    );
}

#[tokio::test]
async fn test_late_metadata_enables_audio_without_mode_change() {
    let provider = Arc::new(
        SimulationMetadataProvider::new()
            .with_stream("front_sub", audio_metadata("AAC"))
            .with_delay(Duration::from_millis(200)),
    );
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");

    // Resolution never waits on the fetch: the state exists immediately with
    // audio degraded to false.
    let front = handle.live_state("front").expect("front resolved");
    assert_eq!(front.preferred_mode, LiveStreamMode::Mse);
    assert!(!front.audio_for("front_sub").expect("probed").supports_audio);

    let states = wait_for_states(&handle, |states| {
        states["front"]
            .audio_for("front_sub")
            .is_some_and(|audio| audio.supports_audio)
    })
    .await;

    // The deferred arrival refined audio support only.
    assert_eq!(states["front"].preferred_mode, LiveStreamMode::Mse);
    assert!(states["front"].is_restreamed);
}

#[tokio::test]
async fn test_unavailable_relay_degrades_audio_only() {
    let provider = Arc::new(SimulationMetadataProvider::new().unavailable());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");

    // Give the failing fetch time to complete; nothing may panic or drop
    // the camera's entry.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let front = handle.live_state("front").expect("front still resolved");
    assert_eq!(front.preferred_mode, LiveStreamMode::Mse);
    assert!(!front.audio_for("front_sub").expect("probed").supports_audio);
}

#[tokio::test]
async fn test_selection_change_rederives_relevant_stream() {
    let config = PlatformConfig {
        cameras: vec![camera("front", &["front_raw", "front_sub"])],
        restream: registry(&["front_sub"]),
    };
    let provider = Arc::new(
        SimulationMetadataProvider::new().with_stream("front_sub", audio_metadata("OPUS")),
    );
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(config))
        .await
        .expect("config update succeeds");
    assert_eq!(
        handle.live_state("front").expect("front resolved").preferred_mode,
        LiveStreamMode::Jsmpeg
    );

    handle
        .update_active_streams(Some(HashMap::from([(
            "front".to_string(),
            "front_sub".to_string(),
        )])))
        .await
        .expect("selection update succeeds");

    let front = handle.live_state("front").expect("front resolved");
    assert!(front.is_restreamed);
    assert_eq!(front.preferred_mode, LiveStreamMode::Mse);
}

#[tokio::test]
async fn test_capability_change_flips_transport() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(false),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");
    assert_eq!(
        handle.live_state("front").expect("front resolved").preferred_mode,
        LiveStreamMode::Webrtc
    );

    handle
        .set_capabilities(MediaCapabilities::reported(true))
        .await
        .expect("capability update succeeds");
    assert_eq!(
        handle.live_state("front").expect("front resolved").preferred_mode,
        LiveStreamMode::Mse
    );
}

#[tokio::test]
async fn test_reset_camera_is_isolated() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");
    let back_before = handle.live_state("back").expect("back resolved");

    let front = handle
        .reset_camera("front")
        .await
        .expect("front reset succeeds");
    assert_eq!(front.preferred_mode, LiveStreamMode::Mse);
    assert!(front.is_restreamed);

    assert_eq!(handle.live_state("back"), Some(back_before));
}

#[tokio::test]
async fn test_reset_unknown_camera_fails() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");

    let result = handle.reset_camera("ghost").await;
    assert_eq!(
        result,
        Err(EngineError::CameraNotFound {
            name: "ghost".to_string()
        })
    );
}

#[tokio::test]
async fn test_unloaded_config_resolves_nothing() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(None)
        .await
        .expect("config update succeeds");
    assert!(handle.live_states().is_empty());

    // Loading the configuration later populates the states.
    handle
        .update_config(Some(two_camera_config()))
        .await
        .expect("config update succeeds");
    assert_eq!(handle.live_states().len(), 2);
}

#[tokio::test]
async fn test_shutdown_closes_the_handle() {
    let provider = Arc::new(SimulationMetadataProvider::new());
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle.shutdown().await.expect("shutdown succeeds");

    let result = handle.update_config(Some(two_camera_config())).await;
    assert_eq!(result, Err(EngineError::Shutdown));
}
