//! # exif-scrub
//!
//! Locate, enumerate and strip EXIF metadata from JPEG and PNG files. Redaction
//! works on the container structure only: the EXIF-bearing segment or chunk is
//! cut out byte for byte and the image data is never re-encoded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_scrub::{extract_metadata, redact_metadata};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("photo.jpg")?;
//!
//!     // List what the file carries
//!     let extraction = extract_metadata(&bytes)?;
//!     for entry in &extraction.entries {
//!         println!("{} {} = {}", entry.fq_ifd_path, entry.tag_name, entry.value_string);
//!     }
//!
//!     // Strip it
//!     let clean = redact_metadata(&bytes)?;
//!     std::fs::write("photo.clean.jpg", clean)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Redaction Control
//!
//! ```rust,no_run
//! use exif_scrub::{redact_metadata_with, RedactOptions, RedactionPolicy};
//!
//! # fn main() -> anyhow::Result<()> {
//! let bytes = std::fs::read("photo.png")?;
//! let options = RedactOptions {
//!     policy: RedactionPolicy::ZeroFillThenExcise,
//!     verify_decode: false,
//! };
//! let result = redact_metadata_with(&bytes, &options)?;
//! println!("removed {} bytes", result.bytes_removed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`format`] — magic-byte classification
//! - [`container`] — JPEG segment and PNG chunk parsing, EXIF location
//! - [`exif`] — TIFF/IFD walking and tag decoding
//! - [`redact`] — byte-range excision
//! - [`verify`] — post-redaction re-parse and decode checks
//! - [`config`] — configuration types and loading/saving
//! - [`pipeline`] — file collection and in-place scrubbing

pub mod config;
pub mod container;
pub mod error;
pub mod exif;
pub mod format;
pub mod pipeline;
pub mod redact;
pub mod verify;

use serde::Serialize;

use crate::container::Container;

pub use crate::error::{ScrubError, ScrubResult, TagResolutionFailure};
pub use crate::exif::{IfdEntry, TagValue};
pub use crate::format::{MediaKind, classify};
pub use crate::redact::{RedactOptions, RedactionPolicy, RedactionResult};

/// Metadata read from one image.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub kind: MediaKind,
    pub entries: Vec<IfdEntry>,
    /// Entries or directories that could not be resolved.
    pub warnings: Vec<TagResolutionFailure>,
}

/// Enumerate the EXIF entries of a JPEG or PNG buffer.
///
/// A file without EXIF yields an empty extraction. When several EXIF units are
/// present only the first is read.
pub fn extract_metadata(buffer: &[u8]) -> ScrubResult<Extraction> {
    let container = Container::parse(buffer)?;
    let kind = container.kind();

    let Some(blob) = container.locate_exif() else {
        log::debug!("{kind}: no EXIF unit");
        return Ok(Extraction {
            kind,
            entries: Vec::new(),
            warnings: Vec::new(),
        });
    };

    log::debug!(
        "{kind}: EXIF at {}..{} ({} TIFF bytes)",
        blob.span_start,
        blob.span_end,
        blob.data.len()
    );
    let walked = exif::walk(blob.data);
    Ok(Extraction {
        kind,
        entries: walked.entries,
        warnings: walked.failures,
    })
}

/// Strip every EXIF unit with the default options (excision plus full verification).
pub fn redact_metadata(buffer: &[u8]) -> ScrubResult<Vec<u8>> {
    redact_metadata_with(buffer, &RedactOptions::default()).map(|result| result.output)
}

/// Strip every EXIF unit from `buffer` and verify the result.
///
/// Fails with [`ScrubError::NoExifFound`] when there is nothing to remove, so a
/// second pass over already-clean output is reported rather than silently
/// copied.
pub fn redact_metadata_with(buffer: &[u8], options: &RedactOptions) -> ScrubResult<RedactionResult> {
    let container = Container::parse(buffer)?;
    let kind = container.kind();

    let spans: Vec<_> = container.exif_blobs().iter().map(|blob| blob.span()).collect();
    if spans.is_empty() {
        return Err(ScrubError::NoExifFound);
    }

    let result = redact::redact(buffer, &spans, options.policy);
    verify::verify(kind, &result.output, options.verify_decode)?;
    log::debug!(
        "{kind}: removed {} EXIF unit(s), {} bytes",
        spans.len(),
        result.bytes_removed
    );
    Ok(result)
}
