//! Actor implementation for the live-view engine.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::commands::LiveViewCommand;
use super::core::LiveViewEngine;
use super::handle::LiveViewHandle;
use crate::capability::MediaCapabilities;
use crate::config::LookoutConfig;
use crate::metadata::MetadataProvider;

/// Spawns the live-view engine actor and returns its handle.
///
/// The actor processes commands sequentially: configuration updates, stream
/// selection changes, resets, and metadata completions can never interleave
/// mid-derivation. Metadata fetches themselves run on separate tasks and
/// re-enter through the internal completion channel.
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() {
/// use std::sync::Arc;
///
/// use lookout_core::capability::MediaCapabilities;
/// use lookout_core::config::LookoutConfig;
/// use lookout_core::engine::spawn_live_view_engine;
/// use lookout_core::metadata::SimulationMetadataProvider;
///
/// let provider = Arc::new(SimulationMetadataProvider::new());
/// let handle = spawn_live_view_engine(
///     LookoutConfig::default(),
///     provider,
///     MediaCapabilities::reported(true),
/// );
/// # }
/// ```
pub fn spawn_live_view_engine(
    config: LookoutConfig,
    provider: Arc<dyn MetadataProvider>,
    capabilities: MediaCapabilities,
) -> LiveViewHandle {
    let (sender, receiver) = mpsc::channel(config.engine.mailbox_capacity);
    let (completion_sender, completion_receiver) = mpsc::unbounded_channel();
    let snapshot = Arc::new(RwLock::new(HashMap::new()));

    let engine = LiveViewEngine::new(
        config,
        provider,
        capabilities,
        completion_sender,
        Arc::clone(&snapshot),
    );

    tokio::spawn(async move {
        run_actor_loop(engine, receiver, completion_receiver).await;
    });

    LiveViewHandle::new(sender, snapshot)
}

/// Runs the actor's message processing loop until shutdown or until every
/// handle is dropped.
async fn run_actor_loop(
    mut engine: LiveViewEngine,
    mut receiver: mpsc::Receiver<LiveViewCommand>,
    mut completion_receiver: mpsc::UnboundedReceiver<LiveViewCommand>,
) {
    tracing::debug!("live-view engine actor started");

    loop {
        tokio::select! {
            Some(command) = receiver.recv() => {
                if !handle_command(&mut engine, command) {
                    break;
                }
            }
            Some(command) = completion_receiver.recv() => {
                if !handle_command(&mut engine, command) {
                    break;
                }
            }
            else => break,
        }
    }

    tracing::debug!("live-view engine actor stopped");
}

/// Handles a single command. Returns false to shut the actor down.
fn handle_command(engine: &mut LiveViewEngine, command: LiveViewCommand) -> bool {
    match command {
        LiveViewCommand::UpdateConfig { config, responder } => {
            engine.update_config(config);
            let _ = responder.send(());
        }

        LiveViewCommand::UpdateActiveStreams {
            selection,
            responder,
        } => {
            engine.update_active_streams(selection);
            let _ = responder.send(());
        }

        LiveViewCommand::SetCapabilities {
            capabilities,
            responder,
        } => {
            engine.set_capabilities(capabilities);
            let _ = responder.send(());
        }

        LiveViewCommand::ResetCamera {
            camera_name,
            responder,
        } => {
            let result = engine.reset_camera(&camera_name);
            let _ = responder.send(result);
        }

        LiveViewCommand::MetadataFetched { names, result } => {
            engine.metadata_fetched(names, result);
        }

        LiveViewCommand::Shutdown { responder } => {
            tracing::debug!("live-view engine actor shutting down");
            let _ = responder.send(());
            return false;
        }
    }

    true
}
