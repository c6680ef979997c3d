//! Error taxonomy for the relay.

use thiserror::Error;

/// Every failure a request can end in.
///
/// Anything raised before the first payload byte becomes a JSON error
/// response. `StreamInterrupted` happens after the headers are committed and
/// is only ever logged.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Client-supplied identifier or quality token has the wrong shape
    #[error("Invalid request: {message}")]
    MalformedInput { message: String },

    /// The tool could not describe the video (private, deleted, blocked, upstream down)
    #[error("Video not found or inaccessible")]
    MetadataUnavailable { reason: String },

    /// The tool could not be started, or died before producing output
    #[error("Transcoding failed: {message}")]
    TranscodeFailed { message: String },

    /// The tool or the client connection failed mid-body
    #[error("Stream interrupted after {bytes_sent} bytes: {message}")]
    StreamInterrupted { message: String, bytes_sent: u64 },

    /// Every transcode slot stayed busy for the whole admission window
    #[error("Too many downloads in progress, try again shortly")]
    Overloaded,
}

impl RelayError {
    pub fn malformed(message: impl Into<String>) -> Self {
        RelayError::MalformedInput {
            message: message.into(),
        }
    }

    pub fn metadata(reason: impl Into<String>) -> Self {
        RelayError::MetadataUnavailable {
            reason: reason.into(),
        }
    }

    pub fn transcode(message: impl Into<String>) -> Self {
        RelayError::TranscodeFailed {
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_message_hides_reason() {
        let err = RelayError::metadata("ERROR: [youtube] abc: Private video");
        assert_eq!(err.to_string(), "Video not found or inaccessible");
    }

    #[test]
    fn test_malformed_message_is_readable() {
        let err = RelayError::malformed("bad id");
        assert_eq!(err.to_string(), "Invalid request: bad id");
    }
}
