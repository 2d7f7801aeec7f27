//! Upload validation
//!
//! Checks presence, MIME type and size of a submission before anything
//! touches the network. Server and client ceilings are separate values so
//! they can diverge.

use birdcall_common::config::{CLIENT_MAX_UPLOAD_BYTES, SERVER_MAX_UPLOAD_BYTES};
use thiserror::Error;

use crate::models::AudioSubmission;

/// Types accepted by the identification endpoint
pub const SERVER_ACCEPTED_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/flac",
    "audio/ogg",
    "audio/mp3",
];

/// Narrower set offered to upload clients for their pre-check
pub const CLIENT_ACCEPTED_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/x-m4a", "audio/ogg"];

const MIB: u64 = 1024 * 1024;

/// Validation failures (always the caller's fault, never retried)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No audio file provided")]
    MissingFile,

    #[error("Invalid file type. Allowed types: {}", .accepted.join(", "))]
    UnsupportedType {
        content_type: String,
        accepted: Vec<String>,
    },

    #[error("File size exceeds {} limit", format_limit(.limit))]
    UnsupportedSize { size: u64, limit: u64 },
}

fn format_limit(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Size ceiling and accepted MIME types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLimits {
    pub max_bytes: u64,
    pub accepted_types: Vec<String>,
}

impl AudioLimits {
    pub fn new(max_bytes: u64, accepted_types: &[&str]) -> Self {
        Self {
            max_bytes,
            accepted_types: accepted_types.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// 50 MiB, full server-side format set
    pub fn server() -> Self {
        Self::new(SERVER_MAX_UPLOAD_BYTES, SERVER_ACCEPTED_TYPES)
    }

    /// 10 MiB, client pre-check format set
    pub fn client() -> Self {
        Self::new(CLIENT_MAX_UPLOAD_BYTES, CLIENT_ACCEPTED_TYPES)
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        self.accepted_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    }
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self::server()
    }
}

/// Pure validator over a fixed set of limits
#[derive(Debug, Clone, Default)]
pub struct AudioValidator {
    limits: AudioLimits,
}

impl AudioValidator {
    pub fn new(limits: AudioLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &AudioLimits {
        &self.limits
    }

    /// Check payload presence, then type, then size
    pub fn validate(&self, submission: &AudioSubmission) -> Result<(), ValidationError> {
        if !submission.has_payload() {
            return Err(ValidationError::MissingFile);
        }

        if !self.limits.accepts(&submission.content_type) {
            return Err(ValidationError::UnsupportedType {
                content_type: submission.content_type.clone(),
                accepted: self.limits.accepted_types.clone(),
            });
        }

        if submission.declared_size > self.limits.max_bytes {
            return Err(ValidationError::UnsupportedSize {
                size: submission.declared_size,
                limit: self.limits.max_bytes,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(content_type: &str, size: usize) -> AudioSubmission {
        AudioSubmission::new(vec![1u8; size], content_type, "call.wav")
    }

    #[test]
    fn test_accepts_every_server_type() {
        let validator = AudioValidator::default();
        for content_type in SERVER_ACCEPTED_TYPES {
            assert!(
                validator.validate(&submission(content_type, 16)).is_ok(),
                "{} should be accepted",
                content_type
            );
        }
    }

    #[test]
    fn test_missing_payload() {
        let validator = AudioValidator::default();
        assert_eq!(
            validator.validate(&submission("audio/wav", 0)),
            Err(ValidationError::MissingFile)
        );
    }

    #[test]
    fn test_missing_payload_checked_before_type() {
        let validator = AudioValidator::default();
        assert_eq!(
            validator.validate(&submission("image/png", 0)),
            Err(ValidationError::MissingFile)
        );
    }

    #[test]
    fn test_rejects_non_audio_regardless_of_content() {
        let validator = AudioValidator::default();
        // A real WAV header does not rescue a wrong declared type
        let wav = AudioSubmission::new(&b"RIFF\x24\x00\x00\x00WAVEfmt "[..], "image/png", "call.wav");

        let err = validator.validate(&wav).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid file type. Allowed types: audio/mpeg, audio/wav, audio/wave, audio/x-wav, audio/flac, audio/ogg, audio/mp3"
        );
    }

    #[test]
    fn test_type_match_ignores_case_and_parameters() {
        let validator = AudioValidator::default();
        assert!(validator.validate(&submission("Audio/WAV", 16)).is_ok());
        assert!(validator.validate(&submission("audio/ogg; codecs=opus", 16)).is_ok());
        assert!(validator.validate(&submission("audio/oggx", 16)).is_err());
    }

    #[test]
    fn test_size_uses_declared_length() {
        let validator = AudioValidator::new(AudioLimits::server().with_max_bytes(100));

        let mut small_payload = submission("audio/wav", 10);
        small_payload.declared_size = 101;
        assert_eq!(
            validator.validate(&small_payload),
            Err(ValidationError::UnsupportedSize { size: 101, limit: 100 })
        );

        small_payload.declared_size = 100;
        assert!(validator.validate(&small_payload).is_ok());
    }

    #[test]
    fn test_server_limit_message() {
        let validator = AudioValidator::default();
        let mut big = submission("audio/wav", 1);
        big.declared_size = SERVER_MAX_UPLOAD_BYTES + 1;

        let err = validator.validate(&big).unwrap_err();
        assert_eq!(err.to_string(), "File size exceeds 50MB limit");
    }

    #[test]
    fn test_client_limits_are_stricter_and_independent() {
        let client = AudioValidator::new(AudioLimits::client());
        let server = AudioValidator::new(AudioLimits::server());

        let mut eleven_mib = submission("audio/wav", 1);
        eleven_mib.declared_size = 11 * MIB;
        assert!(server.validate(&eleven_mib).is_ok());
        assert!(matches!(
            client.validate(&eleven_mib),
            Err(ValidationError::UnsupportedSize { .. })
        ));

        // m4a is a client-side format only; flac is server-side only
        assert!(client.validate(&submission("audio/x-m4a", 16)).is_ok());
        assert!(server.validate(&submission("audio/x-m4a", 16)).is_err());
        assert!(client.validate(&submission("audio/flac", 16)).is_err());

        let widened = AudioValidator::new(AudioLimits::client().with_max_bytes(20 * MIB));
        assert!(widened.validate(&eleven_mib).is_ok());
        assert_eq!(client.limits().max_bytes, CLIENT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(&(10 * MIB)), "10MB");
        assert_eq!(format_limit(&1500), "1500 bytes");
    }
}
