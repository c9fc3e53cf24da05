//! Magic-byte format detection.

use serde::Serialize;
use std::fmt;

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// The container family of a buffer, decided once from its leading bytes.
///
/// # Example
///
/// ```rust
/// use exif_scrub::{classify, MediaKind};
///
/// assert_eq!(classify(&[0xFF, 0xD8, 0xFF, 0xE0]), MediaKind::Jpeg);
/// assert_eq!(classify(b"GIF89a"), MediaKind::Unsupported);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Jpeg,
    Png,
    Unsupported,
}

impl MediaKind {
    pub fn name(&self) -> &'static str {
        match self {
            MediaKind::Jpeg => "JPEG",
            MediaKind::Png => "PNG",
            MediaKind::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaKind::Unsupported)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a buffer by signature. Never fails.
pub fn classify(buffer: &[u8]) -> MediaKind {
    if buffer.starts_with(&PNG_SIGNATURE) {
        MediaKind::Png
    } else if buffer.starts_with(&JPEG_SOI) {
        MediaKind::Jpeg
    } else {
        MediaKind::Unsupported
    }
}
