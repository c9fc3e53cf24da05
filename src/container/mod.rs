//! Container parsing and EXIF location.
//!
//! Both supported formats are split into an ordered list of [`ContainerUnit`]s
//! (JPEG marker segments, PNG chunks). Units are contiguous: laying them end to end
//! reproduces the original buffer byte for byte, which is what lets the redactor
//! cut a unit out without touching anything else.
//!
//! - [`jpeg`] — marker segment walker
//! - [`png`] — chunk walker

pub mod jpeg;
pub mod png;

use std::fmt;
use std::ops::Range;

use crate::error::{ScrubError, ScrubResult};
use crate::format::{MediaKind, classify};

pub use jpeg::JpegContainer;
pub use png::PngContainer;

/// Semantic role of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitType {
    /// A JPEG marker segment or standalone marker.
    Marker(u8),
    /// JPEG entropy-coded data following the first SOS segment, through EOI.
    ScanData,
    /// The 8-byte PNG signature.
    Signature,
    /// A PNG chunk.
    Chunk([u8; 4]),
    /// Bytes after the logical end of the image (after EOI / IEND).
    Trailing,
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Marker(m) => f.write_str(&jpeg::marker_name(*m)),
            UnitType::ScanData => f.write_str("scan-data"),
            UnitType::Signature => f.write_str("signature"),
            UnitType::Chunk(t) => f.write_str(&String::from_utf8_lossy(t)),
            UnitType::Trailing => f.write_str("trailing"),
        }
    }
}

/// One parsed segment or chunk. The payload borrows from the original buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUnit<'a> {
    /// Offset of the first byte of the unit (fill bytes and marker included).
    pub offset: usize,
    /// Bytes before the payload: marker and length field (JPEG), length and type (PNG).
    pub header_len: usize,
    pub payload: &'a [u8],
    /// Bytes after the payload (PNG CRC).
    pub trailer_len: usize,
    pub unit_type: UnitType,
}

impl<'a> ContainerUnit<'a> {
    /// Total size of the unit in the buffer.
    pub fn len(&self) -> usize {
        self.header_len + self.payload.len() + self.trailer_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    pub fn span(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// The raw bytes of this unit within `buffer`, or `None` if `buffer` is
    /// too short to be the one this unit was parsed from.
    pub fn bytes<'b>(&self, buffer: &'b [u8]) -> Option<&'b [u8]> {
        buffer.get(self.span())
    }
}

/// A located EXIF payload: the TIFF-structured bytes plus the span of the
/// whole unit that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifBlob<'a> {
    pub data: &'a [u8],
    pub span_start: usize,
    pub span_end: usize,
    /// Index of the carrying unit in the container's unit list.
    pub unit_index: usize,
}

impl ExifBlob<'_> {
    pub fn span(&self) -> Range<usize> {
        self.span_start..self.span_end
    }

    pub fn span_len(&self) -> usize {
        self.span_end - self.span_start
    }
}

/// Shared contract of the per-format parsers.
pub trait ContainerFormat<'a> {
    fn kind(&self) -> MediaKind;

    fn units(&self) -> &[ContainerUnit<'a>];

    /// If `unit` carries EXIF, return the TIFF bytes inside it.
    fn exif_payload(&self, unit: &ContainerUnit<'a>) -> Option<&'a [u8]>;

    /// Every EXIF-bearing unit, in file order.
    fn exif_blobs(&self) -> Vec<ExifBlob<'a>> {
        self.units()
            .iter()
            .enumerate()
            .filter_map(|(unit_index, unit)| {
                self.exif_payload(unit).map(|data| ExifBlob {
                    data,
                    span_start: unit.offset,
                    span_end: unit.end(),
                    unit_index,
                })
            })
            .collect()
    }
}

/// A parsed image, tagged by format.
#[derive(Debug, Clone)]
pub enum Container<'a> {
    Jpeg(JpegContainer<'a>),
    Png(PngContainer<'a>),
}

impl<'a> Container<'a> {
    /// Classify and parse `buffer`.
    pub fn parse(buffer: &'a [u8]) -> ScrubResult<Self> {
        Self::parse_as(classify(buffer), buffer)
    }

    /// Parse `buffer` with the parser for `kind`.
    pub fn parse_as(kind: MediaKind, buffer: &'a [u8]) -> ScrubResult<Self> {
        match kind {
            MediaKind::Jpeg => Ok(Container::Jpeg(jpeg::parse(buffer)?)),
            MediaKind::Png => Ok(Container::Png(png::parse(buffer)?)),
            MediaKind::Unsupported => Err(ScrubError::UnsupportedFormat),
        }
    }

    fn format(&self) -> &dyn ContainerFormat<'a> {
        match self {
            Container::Jpeg(c) => c,
            Container::Png(c) => c,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.format().kind()
    }

    pub fn units(&self) -> &[ContainerUnit<'a>] {
        self.format().units()
    }

    pub fn exif_blobs(&self) -> Vec<ExifBlob<'a>> {
        self.format().exif_blobs()
    }

    /// The authoritative EXIF blob: the first one in file order.
    pub fn locate_exif(&self) -> Option<ExifBlob<'a>> {
        let blobs = self.exif_blobs();
        if blobs.len() > 1 {
            log::warn!(
                "{} carries {} EXIF units; reading the first at offset {}",
                self.kind(),
                blobs.len(),
                blobs[0].span_start
            );
        }
        blobs.into_iter().next()
    }

    /// Sum of unit sizes. Equals the buffer length for every successful parse.
    pub fn total_len(&self) -> usize {
        self.units().iter().map(ContainerUnit::len).sum()
    }
}
