//! Engine state and the recomputation pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::commands::LiveViewCommand;
use super::EngineError;
use crate::capability::MediaCapabilities;
use crate::config::{LookoutConfig, PlatformConfig};
use crate::live::{ActiveStreamSelection, LiveModeResolver, LiveModeState, collector};
use crate::metadata::{MetadataCache, MetadataProvider, MetadataResult, StreamMetadata};

/// Shared, read-only view of the resolved per-camera states.
///
/// The actor republishes it after every recomputation; handles read it
/// synchronously without a mailbox round trip.
pub type LiveStateSnapshot = Arc<RwLock<HashMap<String, LiveModeState>>>;

/// The live-view engine: inputs, derived state, and the metadata pipeline.
///
/// Owned by the actor task; every method runs on that task, so recomputation
/// is single-threaded and sees consistent inputs.
pub struct LiveViewEngine {
    platform: Option<PlatformConfig>,
    active: Option<ActiveStreamSelection>,
    capabilities: MediaCapabilities,
    resolver: LiveModeResolver,
    cache: MetadataCache,
    pending_fetches: HashSet<String>,
    provider: Arc<dyn MetadataProvider>,
    completions: mpsc::UnboundedSender<LiveViewCommand>,
    snapshot: LiveStateSnapshot,
}

impl LiveViewEngine {
    pub fn new(
        config: LookoutConfig,
        provider: Arc<dyn MetadataProvider>,
        capabilities: MediaCapabilities,
        completions: mpsc::UnboundedSender<LiveViewCommand>,
        snapshot: LiveStateSnapshot,
    ) -> Self {
        let cache = MetadataCache::new(&config.metadata);
        Self {
            platform: None,
            active: None,
            capabilities,
            resolver: LiveModeResolver::new(),
            cache,
            pending_fetches: HashSet::new(),
            provider,
            completions,
            snapshot,
        }
    }

    /// Replaces the platform configuration and recomputes.
    pub fn update_config(&mut self, platform: Option<PlatformConfig>) {
        self.platform = platform;
        self.refresh();
    }

    /// Replaces the active stream selection and recomputes.
    pub fn update_active_streams(&mut self, selection: Option<ActiveStreamSelection>) {
        self.active = selection;
        self.refresh();
    }

    /// Replaces the client capability snapshot and recomputes.
    pub fn set_capabilities(&mut self, capabilities: MediaCapabilities) {
        self.capabilities = capabilities;
        self.refresh();
    }

    /// Re-derives one camera's preferred mode and restream flag.
    ///
    /// # Errors
    ///
    /// - `EngineError::CameraNotFound` - The camera is not part of the
    ///   current configuration
    pub fn reset_camera(&mut self, camera_name: &str) -> Result<LiveModeState, EngineError> {
        let state = self
            .resolver
            .reset(
                camera_name,
                self.platform.as_ref(),
                self.active.as_ref(),
                &self.capabilities,
            )
            .cloned()
            .ok_or_else(|| EngineError::CameraNotFound {
                name: camera_name.to_string(),
            })?;

        self.publish();
        Ok(state)
    }

    /// Merges a completed metadata fetch and recomputes audio support.
    ///
    /// Safe for stale completions: names no longer needed are merged and then
    /// ignored (or pruned by the retention policy on the next refresh), and
    /// merging identical metadata twice yields identical state.
    pub fn metadata_fetched(
        &mut self,
        names: HashSet<String>,
        result: MetadataResult<HashMap<String, StreamMetadata>>,
    ) {
        for name in &names {
            self.pending_fetches.remove(name);
        }

        match result {
            Ok(fetched) => {
                tracing::debug!(
                    "metadata arrived for {}/{} requested stream(s)",
                    fetched.len(),
                    names.len()
                );
                self.cache.merge(fetched);
                self.resolve_and_publish();
            }
            Err(error) => {
                // Affected streams keep supports_audio = false until a later
                // refresh retries them.
                tracing::warn!("metadata fetch failed for {} stream(s): {error}", names.len());
            }
        }
    }

    /// The full input-change pipeline: collect needed names, apply cache
    /// retention, kick off fetches for what is missing, then re-derive all
    /// states from whatever metadata is already available.
    fn refresh(&mut self) {
        let needed = collector::restreamed_stream_names(self.platform.as_ref());
        self.cache.apply_retention(&needed);

        let mut missing = self.cache.missing_from(&needed);
        missing.retain(|name| !self.pending_fetches.contains(name));
        if !missing.is_empty() {
            self.spawn_fetch(missing);
        }

        self.resolve_and_publish();
    }

    /// Starts a deferred fetch; resolution does not wait for it.
    fn spawn_fetch(&mut self, names: HashSet<String>) {
        tracing::debug!("fetching metadata for {} stream(s)", names.len());
        self.pending_fetches.extend(names.iter().cloned());

        let provider = Arc::clone(&self.provider);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = provider.fetch_metadata(&names).await;
            // Send failure means the actor is gone; the result is moot.
            let _ = completions.send(LiveViewCommand::MetadataFetched { names, result });
        });
    }

    fn resolve_and_publish(&mut self) {
        self.resolver.resolve_all(
            self.platform.as_ref(),
            self.active.as_ref(),
            &self.cache,
            &self.capabilities,
        );
        self.publish();
    }

    fn publish(&self) {
        *self.snapshot.write() = self.resolver.states().clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, CameraLiveConfig, RestreamEntry, StreamRole};
    use crate::live::LiveStreamMode;
    use crate::metadata::{MetadataError, ProducerMetadata, SimulationMetadataProvider};

    fn test_engine() -> (LiveViewEngine, LiveStateSnapshot) {
        let (completions, _receiver) = mpsc::unbounded_channel();
        let snapshot: LiveStateSnapshot = Arc::new(RwLock::new(HashMap::new()));
        let engine = LiveViewEngine::new(
            LookoutConfig::default(),
            Arc::new(SimulationMetadataProvider::new()),
            MediaCapabilities::reported(true),
            completions,
            Arc::clone(&snapshot),
        );
        (engine, snapshot)
    }

    fn platform() -> PlatformConfig {
        PlatformConfig {
            cameras: vec![CameraConfig {
                name: "front".to_string(),
                enabled: true,
                live: CameraLiveConfig {
                    streams: vec![StreamRole {
                        role: "sub".to_string(),
                        stream: "front_sub".to_string(),
                    }],
                    ..CameraLiveConfig::default()
                },
            }],
            restream: [("front_sub".to_string(), RestreamEntry::default())]
                .into_iter()
                .collect(),
        }
    }

    fn aac_metadata() -> StreamMetadata {
        StreamMetadata {
            producers: vec![ProducerMetadata {
                url: None,
                medias: vec!["audio, recvonly, AAC".to_string()],
            }],
        }
    }

    #[tokio::test]
    async fn test_update_config_publishes_snapshot() {
        let (mut engine, snapshot) = test_engine();
        assert!(snapshot.read().is_empty());

        engine.update_config(Some(platform()));

        let states = snapshot.read();
        assert_eq!(states.len(), 1);
        assert_eq!(states["front"].preferred_mode, LiveStreamMode::Mse);
    }

    #[tokio::test]
    async fn test_completion_refines_audio_in_place() {
        let (mut engine, snapshot) = test_engine();
        engine.update_config(Some(platform()));
        assert!(!snapshot.read()["front"].any_audio());

        engine.metadata_fetched(
            HashSet::from(["front_sub".to_string()]),
            Ok(HashMap::from([("front_sub".to_string(), aac_metadata())])),
        );

        let states = snapshot.read();
        assert!(states["front"].audio_for("front_sub").expect("probed").supports_audio);
        assert_eq!(states["front"].preferred_mode, LiveStreamMode::Mse);
    }

    #[tokio::test]
    async fn test_stale_completion_is_harmless() {
        let (mut engine, snapshot) = test_engine();
        engine.update_config(Some(platform()));
        let before = snapshot.read().clone();

        // A fetch completing for a stream nothing references anymore must
        // not corrupt the current derivation.
        engine.metadata_fetched(
            HashSet::from(["retired_stream".to_string()]),
            Ok(HashMap::from([(
                "retired_stream".to_string(),
                aac_metadata(),
            )])),
        );

        assert_eq!(*snapshot.read(), before);
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_states_intact() {
        let (mut engine, snapshot) = test_engine();
        engine.update_config(Some(platform()));
        let before = snapshot.read().clone();

        engine.metadata_fetched(
            HashSet::from(["front_sub".to_string()]),
            Err(MetadataError::Unavailable {
                reason: "relay down".to_string(),
            }),
        );

        assert_eq!(*snapshot.read(), before);
        assert!(!snapshot.read()["front"].any_audio());
    }

    #[tokio::test]
    async fn test_reset_requires_known_camera() {
        let (mut engine, _snapshot) = test_engine();
        engine.update_config(Some(platform()));

        assert!(engine.reset_camera("front").is_ok());
        assert_eq!(
            engine.reset_camera("ghost"),
            Err(EngineError::CameraNotFound {
                name: "ghost".to_string()
            })
        );
    }
}
