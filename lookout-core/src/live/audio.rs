//! Audio-output capability evaluation.

use crate::metadata::StreamMetadata;

/// Audio codecs browser MSE pipelines accept in fragmented MP4.
pub const PLAYABLE_AUDIO_CODECS: [&str; 4] = ["AAC", "OPUS", "MP3", "FLAC"];

/// Whether a stream can produce audible output for a client.
///
/// Pure: metadata that is absent, or present without a receivable audio track
/// in a playable codec, means no audio. Caching is the fetcher's concern.
pub fn supports_audio_output(metadata: Option<&StreamMetadata>) -> bool {
    metadata.is_some_and(|metadata| {
        metadata.audio_codecs().any(|codec| {
            PLAYABLE_AUDIO_CODECS
                .iter()
                .any(|playable| playable.eq_ignore_ascii_case(codec))
        })
    })
}
