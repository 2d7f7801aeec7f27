//! Audio upload as received from a caller

use bytes::Bytes;

/// Optional client-supplied context for a recording
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionMetadata {
    /// Free-text recording location
    pub location: Option<String>,
    /// Free-text recording timestamp
    pub recorded_at: Option<String>,
}

impl SubmissionMetadata {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.recorded_at.is_none()
    }
}

/// One uploaded recording
///
/// Exists for the duration of a single identification call. `declared_size`
/// is what the upload reported, which is what size limits are checked
/// against.
#[derive(Debug, Clone)]
pub struct AudioSubmission {
    /// Raw audio bytes
    pub payload: Bytes,
    /// MIME type declared by the uploader
    pub content_type: String,
    /// Byte length declared by the uploader
    pub declared_size: u64,
    /// Original filename (used to keep the extension in storage)
    pub filename: String,
    pub metadata: SubmissionMetadata,
}

impl AudioSubmission {
    /// Build a submission whose declared size is the payload length
    pub fn new(
        payload: impl Into<Bytes>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let payload = payload.into();
        Self {
            declared_size: payload.len() as u64,
            payload,
            content_type: content_type.into(),
            filename: filename.into(),
            metadata: SubmissionMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: SubmissionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }
}
