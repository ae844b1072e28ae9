//! Driving the engine with configuration and metadata decoded from the wire
//! shapes the platform actually exchanges.

use std::sync::Arc;

use anyhow::Result;
use lookout_core::capability::MediaCapabilities;
use lookout_core::config::{LookoutConfig, PlatformConfig};
use lookout_core::live::LiveStreamMode;
use lookout_core::metadata::{SimulationMetadataProvider, StreamMetadata};
use lookout_core::spawn_live_view_engine;
use tokio_test::assert_ok;

const PLATFORM_CONFIG_JSON: &str = r#"{
    "cameras": [
        {
            "name": "front",
            "live": {
                "streams": [
                    {"role": "main", "stream": "front_main"},
                    {"role": "sub", "stream": "front_sub"}
                ],
                "height": 480,
                "quality": 10
            }
        },
        {
            "name": "back",
            "live": {
                "streams": [
                    {"role": "main", "stream": "back_raw"}
                ]
            }
        },
        {
            "name": "garage",
            "enabled": false,
            "live": {
                "streams": [
                    {"role": "main", "stream": "garage_main"}
                ]
            }
        }
    ],
    "restream": {
        "front_main": {"sources": ["rtsp://10.0.0.5:8554/front_main"]},
        "front_sub": {"sources": ["rtsp://10.0.0.5:8554/front_sub"]}
    }
}"#;

const RELAY_STREAM_JSON: &str = r#"{
    "producers": [
        {
            "url": "rtsp://10.0.0.5:8554/front_main",
            "medias": [
                "video, recvonly, H264",
                "audio, recvonly, AAC",
                "audio, sendonly, PCMU"
            ]
        }
    ],
    "consumers": []
}"#;

#[tokio::test]
async fn test_wire_shapes_drive_full_negotiation() -> Result<()> {
    let config: PlatformConfig = serde_json::from_str(PLATFORM_CONFIG_JSON)?;
    let metadata: StreamMetadata = serde_json::from_str(RELAY_STREAM_JSON)?;

    let provider =
        Arc::new(SimulationMetadataProvider::new().with_stream("front_main", metadata));
    let handle = spawn_live_view_engine(
        LookoutConfig::default(),
        provider,
        MediaCapabilities::from_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/120.0.0.0 Safari/537.36",
        ),
    );

    assert_ok!(handle.update_config(Some(config)).await);

    // Disabled cameras never resolve; the other two always do.
    let states = handle.live_states();
    assert_eq!(states.len(), 2);
    assert!(!states.contains_key("garage"));

    assert_eq!(states["front"].preferred_mode, LiveStreamMode::Mse);
    assert!(states["front"].is_restreamed);
    assert_eq!(states["back"].preferred_mode, LiveStreamMode::Jsmpeg);

    // front_main's metadata carries a receivable AAC track; the sendonly
    // backchannel is not audio output.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        let front = handle.live_state("front").expect("front resolved");
        if front.audio_for("front_main").expect("probed").supports_audio {
            // front_sub has no metadata at the relay, so it stays silent.
            assert!(!front.audio_for("front_sub").expect("probed").supports_audio);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for audio support"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    Ok(())
}
