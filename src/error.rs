use thiserror::Error;

use crate::format::MediaKind;

/// Errors surfaced by the core entry points.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// The buffer is neither a JPEG nor a PNG.
    #[error("unsupported image format")]
    UnsupportedFormat,

    /// Structural parse failure in the container.
    #[error("malformed {kind} container at offset {offset}: {reason}")]
    MalformedContainer {
        kind: MediaKind,
        offset: usize,
        reason: String,
    },

    /// The container parsed but carries no EXIF unit.
    #[error("no EXIF metadata found")]
    NoExifFound,

    /// The redacted output failed verification and must not be used.
    #[error("redaction corrupted the image: {0}")]
    CorruptionOnRedaction(String),
}

impl ScrubError {
    pub(crate) fn malformed(kind: MediaKind, offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedContainer {
            kind,
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// A single IFD entry (or directory) that could not be resolved.
///
/// These never abort a walk; they are collected as warnings next to the
/// successfully decoded entries.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{fq_ifd_path}: tag {} at blob offset {offset}: {reason}", tag_label(.tag_id))]
pub struct TagResolutionFailure {
    pub fq_ifd_path: String,
    pub tag_id: Option<u16>,
    pub offset: usize,
    pub reason: String,
}

impl TagResolutionFailure {
    pub fn new(
        fq_ifd_path: impl Into<String>,
        tag_id: Option<u16>,
        offset: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            fq_ifd_path: fq_ifd_path.into(),
            tag_id,
            offset,
            reason: reason.into(),
        }
    }
}

fn tag_label(tag_id: &Option<u16>) -> String {
    match tag_id {
        Some(id) => format!("0x{id:04x}"),
        None => "-".to_string(),
    }
}
