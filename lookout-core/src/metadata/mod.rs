//! Stream metadata fetching and caching.
//!
//! Restreamed streams carry technical metadata the relay exposes through its
//! streams API: the producers feeding a stream and the media tracks each one
//! offers. The engine fetches this lazily and tolerates it being absent at
//! any point in time; resolution never waits for it.

pub mod cache;
pub mod provider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{CachedMetadata, MetadataCache};
pub use provider::{HttpMetadataProvider, MetadataProvider, SimulationMetadataProvider};

/// Technical metadata for a single restreamed stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    /// Producers currently feeding the stream.
    #[serde(default)]
    pub producers: Vec<ProducerMetadata>,
}

/// One producer of a stream, with the media tracks it offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerMetadata {
    /// Source the producer pulls from, when the relay reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Media track descriptors in the relay's `kind, direction, codec` form,
    /// e.g. `"audio, recvonly, AAC"`.
    #[serde(default)]
    pub medias: Vec<String>,
}

impl ProducerMetadata {
    /// Codecs of audio tracks this producer can deliver to clients.
    ///
    /// Tracks the relay can only send (two-way talk backchannels) are not
    /// audio *output* and are skipped.
    pub fn receivable_audio_codecs(&self) -> impl Iterator<Item = &str> {
        self.medias.iter().filter_map(|media| {
            let mut parts = media.split(',').map(str::trim);
            match (parts.next(), parts.next()) {
                (Some("audio"), Some("recvonly")) => parts.next(),
                _ => None,
            }
        })
    }
}

impl StreamMetadata {
    /// Codecs of audio tracks any producer can deliver to clients.
    pub fn audio_codecs(&self) -> impl Iterator<Item = &str> {
        self.producers
            .iter()
            .flat_map(ProducerMetadata::receivable_audio_codecs)
    }
}

/// Errors from metadata providers.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP request to the relay failed.
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Relay answered with a non-success status.
    #[error("relay returned status {status} for stream '{stream}'")]
    RelayStatus {
        stream: String,
        status: reqwest::StatusCode,
    },

    /// Relay payload did not match the expected shape.
    #[error("malformed metadata payload for stream '{stream}': {source}")]
    MalformedPayload {
        stream: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider's endpoint URL cannot be constructed.
    #[error("invalid metadata endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The provider as a whole is unreachable.
    #[error("metadata provider unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;
