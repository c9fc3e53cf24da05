//! EXIF (TIFF) metadata decoding.
//!
//! - [`tiff`] — byte order, header and raw entry primitives
//! - [`tags`] — static tag-name dictionary
//! - [`value`] — typed value decoding and display strings
//! - [`walker`] — fault-tolerant IFD traversal producing [`IfdEntry`] records

pub mod tags;
pub mod tiff;
pub mod value;
pub mod walker;

use serde::Serialize;

pub use tags::IfdKind;
pub use value::TagValue;
pub use walker::{WalkOutput, walk, walk_results};

/// One decoded tag.
///
/// `ifd_path` names the directory family (`IFD`, `IFD/Exif`, `IFD/GPS`,
/// `IFD/Exif/Iop`); `fq_ifd_path` also carries the chain index
/// (`IFD1`, `IFD1/Exif`). Unique on `(fq_ifd_path, tag_id)` within a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfdEntry {
    pub ifd_path: &'static str,
    pub fq_ifd_path: String,
    pub ifd_index: usize,
    pub tag_id: u16,
    pub tag_name: &'static str,
    pub tag_type_id: u16,
    pub tag_type_name: &'static str,
    pub unit_count: u32,
    pub value: TagValue,
    pub value_string: String,
}
