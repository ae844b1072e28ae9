//! Metadata fetcher contract: deferred, deduplicated, safely repeatable.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lookout_core::capability::MediaCapabilities;
use lookout_core::config::{
    CameraConfig, CameraLiveConfig, LookoutConfig, PlatformConfig, RestreamEntry, RestreamRegistry,
    StreamRole,
};
use lookout_core::metadata::{MetadataProvider, MetadataResult, StreamMetadata};
use lookout_core::spawn_live_view_engine;
use parking_lot::Mutex;

/// Provider that records every fetch it receives.
struct RecordingProvider {
    calls: Arc<Mutex<Vec<HashSet<String>>>>,
    delay: Duration,
}

#[async_trait]
impl MetadataProvider for RecordingProvider {
    async fn fetch_metadata(
        &self,
        names: &HashSet<String>,
    ) -> MetadataResult<HashMap<String, StreamMetadata>> {
        self.calls.lock().push(names.clone());
        tokio::time::sleep(self.delay).await;
        // The relay knows none of the streams yet; callers must tolerate
        // an entirely empty answer.
        Ok(HashMap::new())
    }
}

fn single_camera_config() -> PlatformConfig {
    PlatformConfig {
        cameras: vec![CameraConfig {
            name: "front".to_string(),
            enabled: true,
            live: CameraLiveConfig {
                streams: vec![StreamRole {
                    role: "main".to_string(),
                    stream: "front_sub".to_string(),
                }],
                ..CameraLiveConfig::default()
            },
        }],
        restream: [("front_sub".to_string(), RestreamEntry::default())]
            .into_iter()
            .collect::<RestreamRegistry>(),
    }
}

#[tokio::test]
async fn test_in_flight_fetches_are_not_duplicated() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(RecordingProvider {
        calls: Arc::clone(&calls),
        delay: Duration::from_millis(200),
    });
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    // Two input changes land while the first fetch is still in flight; the
    // engine must not issue a second request for the same names.
    let (config_ack, selection_ack) = futures::future::join(
        handle.update_config(Some(single_camera_config())),
        handle.update_active_streams(None),
    )
    .await;
    config_ack.expect("config update succeeds");
    selection_ack.expect("selection update succeeds");

    // Give the spawned fetch task a moment to start; a duplicate would have
    // been spawned by now too.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.lock().len(), 1);
    assert_eq!(
        calls.lock()[0],
        HashSet::from(["front_sub".to_string()])
    );
}

#[tokio::test]
async fn test_unanswered_names_are_refetched_on_later_changes() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(RecordingProvider {
        calls: Arc::clone(&calls),
        delay: Duration::from_millis(10),
    });
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::reported(true),
    );

    handle
        .update_config(Some(single_camera_config()))
        .await
        .expect("config update succeeds");

    // Let the first (empty-handed) fetch complete, then trigger another
    // input change: the still-missing name must be requested again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle
        .update_active_streams(None)
        .await
        .expect("selection update succeeds");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.lock().len(), 2);

    // Meanwhile the camera stayed resolved with audio degraded to false.
    let front = handle.live_state("front").expect("front resolved");
    assert!(!front.audio_for("front_sub").expect("probed").supports_audio);
}
