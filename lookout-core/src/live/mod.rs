//! Live-view transport negotiation.
//!
//! Per camera, the resolver derives which playback transport a client should
//! use, whether the camera's relevant stream goes through the restream relay,
//! and which streams can produce audio output. Transport selection is a pure
//! function of restream membership and client capability so it never waits on
//! the network; audio support is the only output allowed to change when
//! deferred metadata arrives.

pub mod audio;
pub mod collector;
pub mod mode;
pub mod resolver;
pub mod state;

use std::collections::HashMap;

pub use audio::{PLAYABLE_AUDIO_CODECS, supports_audio_output};
pub use collector::{relevant_stream, restreamed_stream_names};
pub use mode::{LiveStreamMode, preferred_mode};
pub use resolver::LiveModeResolver;
pub use state::{AudioSupport, LiveModeState};

/// Per-camera stream overrides chosen by the user for this session.
///
/// Maps camera name to the stream name the user picked. May cover only some
/// cameras; cameras without an entry use their first declared stream role.
pub type ActiveStreamSelection = HashMap<String, String>;
