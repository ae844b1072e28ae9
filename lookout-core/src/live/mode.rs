//! Playback transport modes and the preferred-mode derivation.

use serde::{Deserialize, Serialize};

use crate::capability::MediaCapabilities;

/// Playback transport a client uses to render a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStreamMode {
    /// Fragmented-media playback through Media Source Extensions.
    Mse,
    /// Real-time peer transport through the restream relay.
    Webrtc,
    /// Software-decoded fallback requiring neither restreaming nor MSE.
    Jsmpeg,
}

impl std::fmt::Display for LiveStreamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mse => write!(f, "mse"),
            Self::Webrtc => write!(f, "webrtc"),
            Self::Jsmpeg => write!(f, "jsmpeg"),
        }
    }
}

impl std::str::FromStr for LiveStreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mse" => Ok(Self::Mse),
            "webrtc" => Ok(Self::Webrtc),
            "jsmpeg" => Ok(Self::Jsmpeg),
            _ => Err(format!(
                "Invalid live stream mode: '{s}'. Valid options are: mse, webrtc, jsmpeg"
            )),
        }
    }
}

/// Derives the preferred transport for a camera.
///
/// A pure function of restream membership and client capability only;
/// metadata arrival never feeds into it, so transport selection is always
/// immediate. Without the relay only the software-decoded fallback works;
/// with the relay, MSE-capable clients use fragmented playback and everyone
/// else falls back to the relay's real-time peer transport.
pub fn preferred_mode(is_restreamed: bool, capabilities: &MediaCapabilities) -> LiveStreamMode {
    match (capabilities.supports_mse, is_restreamed) {
        (true, true) => LiveStreamMode::Mse,
        (false, true) => LiveStreamMode::Webrtc,
        (_, false) => LiveStreamMode::Jsmpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_mode_covers_all_combinations() {
        let mse = MediaCapabilities::reported(true);
        let no_mse = MediaCapabilities::reported(false);

        assert_eq!(preferred_mode(true, &mse), LiveStreamMode::Mse);
        assert_eq!(preferred_mode(true, &no_mse), LiveStreamMode::Webrtc);
        assert_eq!(preferred_mode(false, &mse), LiveStreamMode::Jsmpeg);
        assert_eq!(preferred_mode(false, &no_mse), LiveStreamMode::Jsmpeg);
    }

    #[test]
    fn test_mode_round_trips_through_strings() {
        for mode in [
            LiveStreamMode::Mse,
            LiveStreamMode::Webrtc,
            LiveStreamMode::Jsmpeg,
        ] {
            let parsed: LiveStreamMode = mode.to_string().parse().expect("mode parses");
            assert_eq!(parsed, mode);
        }

        assert!("hls".parse::<LiveStreamMode>().is_err());
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_string(&LiveStreamMode::Webrtc).expect("mode serializes");
        assert_eq!(json, r#""webrtc""#);
    }
}
