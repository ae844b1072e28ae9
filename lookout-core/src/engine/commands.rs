//! Command definitions for the live-view engine actor.

use std::collections::{HashMap, HashSet};

use tokio::sync::oneshot;

use super::EngineError;
use crate::capability::MediaCapabilities;
use crate::config::PlatformConfig;
use crate::live::{ActiveStreamSelection, LiveModeState};
use crate::metadata::{MetadataResult, StreamMetadata};

/// Commands processed by the live-view engine actor.
///
/// Each externally-visible command carries a response channel; the actor
/// acknowledges after the triggered recomputation has run, which makes
/// sequencing observable to callers.
pub enum LiveViewCommand {
    /// Replace the platform configuration (cameras and restream registry).
    /// `None` means the configuration collaborator has not loaded yet.
    UpdateConfig {
        config: Option<PlatformConfig>,
        responder: oneshot::Sender<()>,
    },
    /// Replace the per-session active stream selection.
    UpdateActiveStreams {
        selection: Option<ActiveStreamSelection>,
        responder: oneshot::Sender<()>,
    },
    /// Replace the client capability snapshot.
    SetCapabilities {
        capabilities: MediaCapabilities,
        responder: oneshot::Sender<()>,
    },
    /// Discard a manual transport override for one camera, re-deriving its
    /// preferred mode and restream flag from current inputs.
    ResetCamera {
        camera_name: String,
        responder: oneshot::Sender<Result<LiveModeState, EngineError>>,
    },
    /// Shut down the engine actor gracefully.
    Shutdown { responder: oneshot::Sender<()> },
    /// Internal completion message from a spawned metadata fetch.
    MetadataFetched {
        names: HashSet<String>,
        result: MetadataResult<HashMap<String, StreamMetadata>>,
    },
}
