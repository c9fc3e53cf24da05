//! PNG chunk parsing.
//!
//! After the 8-byte signature, a PNG is a sequence of chunks:
//! - 4 bytes: length (big-endian, at most 2^31 - 1)
//! - 4 bytes: chunk type (ASCII)
//! - N bytes: data
//! - 4 bytes: CRC32
//!
//! EXIF lives in the `eXIf` ancillary chunk, whose data is a bare TIFF stream.

use super::{ContainerFormat, ContainerUnit, UnitType};
use crate::container::jpeg::EXIF_ID;
use crate::error::{ScrubError, ScrubResult};
use crate::format::{MediaKind, PNG_SIGNATURE};

pub const CHUNK_EXIF: [u8; 4] = *b"eXIf";
pub const CHUNK_IEND: [u8; 4] = *b"IEND";

const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_CRC_LEN: usize = 4;
const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Parsed PNG chunk list.
#[derive(Debug, Clone)]
pub struct PngContainer<'a> {
    units: Vec<ContainerUnit<'a>>,
}

impl<'a> ContainerFormat<'a> for PngContainer<'a> {
    fn kind(&self) -> MediaKind {
        MediaKind::Png
    }

    fn units(&self) -> &[ContainerUnit<'a>] {
        &self.units
    }

    fn exif_payload(&self, unit: &ContainerUnit<'a>) -> Option<&'a [u8]> {
        match unit.unit_type {
            // Some encoders copy the JPEG identifier into eXIf as well.
            UnitType::Chunk(CHUNK_EXIF) => Some(
                unit.payload
                    .strip_prefix(EXIF_ID.as_slice())
                    .unwrap_or(unit.payload),
            ),
            _ => None,
        }
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> ScrubError {
    ScrubError::malformed(MediaKind::Png, offset, reason)
}

/// Split a PNG buffer into chunks.
pub fn parse(data: &[u8]) -> ScrubResult<PngContainer<'_>> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(malformed(0, "missing PNG signature"));
    }

    let mut units = vec![ContainerUnit {
        offset: 0,
        header_len: PNG_SIGNATURE.len(),
        payload: &[],
        trailer_len: 0,
        unit_type: UnitType::Signature,
    }];
    let mut pos = PNG_SIGNATURE.len();

    while pos < data.len() {
        let start = pos;
        if data.len() - pos < CHUNK_HEADER_LEN {
            return Err(malformed(start, "truncated chunk header"));
        }

        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let chunk_type = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        let type_name = String::from_utf8_lossy(&chunk_type).into_owned();
        if length > MAX_CHUNK_LEN {
            return Err(malformed(
                start,
                format!("chunk {type_name} declares oversized length {length}"),
            ));
        }

        let data_start = pos + CHUNK_HEADER_LEN;
        let data_end = data_start + length as usize;
        let end = data_end + CHUNK_CRC_LEN;
        if end > data.len() {
            return Err(malformed(
                start,
                format!(
                    "chunk {type_name} declares {length} bytes but only {} remain",
                    data.len() - data_start
                ),
            ));
        }

        log::trace!("{type_name} at {start}, {length} bytes");
        units.push(ContainerUnit {
            offset: start,
            header_len: CHUNK_HEADER_LEN,
            payload: &data[data_start..data_end],
            trailer_len: CHUNK_CRC_LEN,
            unit_type: UnitType::Chunk(chunk_type),
        });
        pos = end;

        if chunk_type == CHUNK_IEND {
            if pos < data.len() {
                log::debug!("{} trailing bytes after IEND", data.len() - pos);
                units.push(ContainerUnit {
                    offset: pos,
                    header_len: 0,
                    payload: &data[pos..],
                    trailer_len: 0,
                    unit_type: UnitType::Trailing,
                });
            }
            break;
        }
    }

    Ok(PngContainer { units })
}
