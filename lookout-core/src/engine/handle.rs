//! Handle for communicating with the live-view engine actor.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use super::EngineError;
use super::commands::LiveViewCommand;
use super::core::LiveStateSnapshot;
use crate::capability::MediaCapabilities;
use crate::config::PlatformConfig;
use crate::live::{ActiveStreamSelection, LiveModeState};

/// Handle for the live-view engine actor.
///
/// Mutations go through the actor mailbox and are acknowledged once the
/// triggered recomputation has run. Reads come from the published snapshot
/// and never block on the actor. The handle can be cloned and shared freely.
#[derive(Clone)]
pub struct LiveViewHandle {
    sender: mpsc::Sender<LiveViewCommand>,
    states: LiveStateSnapshot,
}

impl LiveViewHandle {
    /// Creates a new handle with the given command sender and state snapshot.
    pub fn new(sender: mpsc::Sender<LiveViewCommand>, states: LiveStateSnapshot) -> Self {
        Self { sender, states }
    }

    /// Replaces the platform configuration; `None` means "not yet loaded".
    ///
    /// # Errors
    /// - `EngineError::Shutdown` - The engine actor is no longer running
    pub async fn update_config(&self, config: Option<PlatformConfig>) -> Result<(), EngineError> {
        let (responder, rx) = oneshot::channel();
        self.send(LiveViewCommand::UpdateConfig { config, responder })
            .await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Replaces the per-session active stream selection.
    ///
    /// # Errors
    /// - `EngineError::Shutdown` - The engine actor is no longer running
    pub async fn update_active_streams(
        &self,
        selection: Option<ActiveStreamSelection>,
    ) -> Result<(), EngineError> {
        let (responder, rx) = oneshot::channel();
        self.send(LiveViewCommand::UpdateActiveStreams {
            selection,
            responder,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Replaces the client capability snapshot.
    ///
    /// # Errors
    /// - `EngineError::Shutdown` - The engine actor is no longer running
    pub async fn set_capabilities(
        &self,
        capabilities: MediaCapabilities,
    ) -> Result<(), EngineError> {
        let (responder, rx) = oneshot::channel();
        self.send(LiveViewCommand::SetCapabilities {
            capabilities,
            responder,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Discards a manual transport override for one camera and returns its
    /// freshly derived state.
    ///
    /// # Errors
    /// - `EngineError::CameraNotFound` - The camera is not configured
    /// - `EngineError::Shutdown` - The engine actor is no longer running
    pub async fn reset_camera(&self, camera_name: &str) -> Result<LiveModeState, EngineError> {
        let (responder, rx) = oneshot::channel();
        self.send(LiveViewCommand::ResetCamera {
            camera_name: camera_name.to_string(),
            responder,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Shutdown)?
    }

    /// Shuts the engine actor down gracefully.
    ///
    /// # Errors
    /// - `EngineError::Shutdown` - The engine actor had already stopped
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (responder, rx) = oneshot::channel();
        self.send(LiveViewCommand::Shutdown { responder }).await?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Snapshot of all resolved camera states.
    pub fn live_states(&self) -> HashMap<String, LiveModeState> {
        self.states.read().clone()
    }

    /// Snapshot of one camera's resolved state.
    pub fn live_state(&self, camera_name: &str) -> Option<LiveModeState> {
        self.states.read().get(camera_name).cloned()
    }

    async fn send(&self, command: LiveViewCommand) -> Result<(), EngineError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| EngineError::Shutdown)
    }
}
