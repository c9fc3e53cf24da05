//! Decoding of raw value bytes into typed tag values.

use serde::Serialize;
use std::fmt;

use super::tags::{self, IfdKind};
use super::tiff::{Endian, TagType};

/// Lists longer than this are elided in `value_string`.
const MAX_LISTED: usize = 32;
/// Byte dumps longer than this are elided in `value_string`.
const MAX_DUMPED: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

impl fmt::Display for SRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A decoded tag value.
///
/// Serialized untagged, so JSON consumers see plain strings, numbers and arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Bytes(Vec<u8>),
    Ascii(String),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Rationals(Vec<Rational>),
    SBytes(Vec<i8>),
    SShorts(Vec<i16>),
    SLongs(Vec<i32>),
    SRationals(Vec<SRational>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    /// UNDEFINED data a per-tag decoder turned into text.
    Text(String),
    /// UNDEFINED data with no specific decoder.
    Opaque(Vec<u8>),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Ascii(s) | TagValue::Text(s) => f.write_str(s),
            TagValue::Bytes(v) => write_list(f, v),
            TagValue::Shorts(v) => write_list(f, v),
            TagValue::Longs(v) => write_list(f, v),
            TagValue::Rationals(v) => write_list(f, v),
            TagValue::SBytes(v) => write_list(f, v),
            TagValue::SShorts(v) => write_list(f, v),
            TagValue::SLongs(v) => write_list(f, v),
            TagValue::SRationals(v) => write_list(f, v),
            TagValue::Floats(v) => write_list(f, v),
            TagValue::Doubles(v) => write_list(f, v),
            TagValue::Opaque(v) => write_dump(f, v),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().take(MAX_LISTED).enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    if items.len() > MAX_LISTED {
        write!(f, ", ... ({} values)", items.len())?;
    }
    Ok(())
}

fn write_dump(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, b) in bytes.iter().take(MAX_DUMPED).enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{b:02x}")?;
    }
    if bytes.len() > MAX_DUMPED {
        write!(f, " ... ({} bytes)", bytes.len())?;
    }
    Ok(())
}

/// Decode `bytes` (exactly `count * unit_size` long) according to `tag_type`.
/// UNDEFINED values are routed through the per-tag decoders.
pub fn decode(kind: IfdKind, tag: u16, tag_type: TagType, bytes: &[u8], endian: Endian) -> TagValue {
    match tag_type {
        TagType::Byte => TagValue::Bytes(bytes.to_vec()),
        TagType::Ascii => TagValue::Ascii(decode_ascii(bytes)),
        TagType::Short => TagValue::Shorts(
            bytes
                .chunks_exact(2)
                .map(|c| endian.u16_from([c[0], c[1]]))
                .collect(),
        ),
        TagType::Long => TagValue::Longs(bytes.chunks_exact(4).map(|c| u32_at(endian, c)).collect()),
        TagType::Rational => TagValue::Rationals(
            bytes
                .chunks_exact(8)
                .map(|c| Rational {
                    numerator: u32_at(endian, &c[..4]),
                    denominator: u32_at(endian, &c[4..]),
                })
                .collect(),
        ),
        TagType::SByte => TagValue::SBytes(bytes.iter().map(|&b| b as i8).collect()),
        TagType::SShort => TagValue::SShorts(
            bytes
                .chunks_exact(2)
                .map(|c| endian.u16_from([c[0], c[1]]) as i16)
                .collect(),
        ),
        TagType::SLong => {
            TagValue::SLongs(bytes.chunks_exact(4).map(|c| u32_at(endian, c) as i32).collect())
        }
        TagType::SRational => TagValue::SRationals(
            bytes
                .chunks_exact(8)
                .map(|c| SRational {
                    numerator: u32_at(endian, &c[..4]) as i32,
                    denominator: u32_at(endian, &c[4..]) as i32,
                })
                .collect(),
        ),
        TagType::Float => TagValue::Floats(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_bits(u32_at(endian, c)))
                .collect(),
        ),
        TagType::Double => TagValue::Doubles(
            bytes
                .chunks_exact(8)
                .map(|c| {
                    f64::from_bits(endian.u64_from([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                })
                .collect(),
        ),
        TagType::Undefined => decode_undefined(kind, tag, bytes, endian),
    }
}

fn u32_at(endian: Endian, c: &[u8]) -> u32 {
    endian.u32_from([c[0], c[1], c[2], c[3]])
}

/// ASCII values are NUL-terminated; some writers pad with more NULs or put UTF-8 in.
fn decode_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn decode_undefined(kind: IfdKind, tag: u16, bytes: &[u8], endian: Endian) -> TagValue {
    let decoded = match (kind, tag) {
        (IfdKind::Exif, tags::TAG_EXIF_VERSION)
        | (IfdKind::Exif, tags::TAG_FLASHPIX_VERSION)
        | (IfdKind::Interop, tags::TAG_INTEROP_VERSION) => decode_version(bytes),
        (IfdKind::Exif, tags::TAG_COMPONENTS_CONFIGURATION) => decode_components(bytes),
        (IfdKind::Exif, tags::TAG_USER_COMMENT)
        | (IfdKind::Gps, tags::TAG_GPS_PROCESSING_METHOD)
        | (IfdKind::Gps, tags::TAG_GPS_AREA_INFORMATION) => decode_encoded_text(bytes, endian),
        (IfdKind::Exif, tags::TAG_FILE_SOURCE) => match bytes {
            [3] => Some("Digital still camera".to_string()),
            [1] => Some("Film scanner".to_string()),
            [2] => Some("Reflection print scanner".to_string()),
            _ => None,
        },
        (IfdKind::Exif, tags::TAG_SCENE_TYPE) => match bytes {
            [1] => Some("Directly photographed".to_string()),
            _ => None,
        },
        _ => None,
    };
    match decoded {
        Some(text) => TagValue::Text(text),
        None => TagValue::Opaque(bytes.to_vec()),
    }
}

/// Version tags are four ASCII digits, e.g. `0232`.
fn decode_version(bytes: &[u8]) -> Option<String> {
    if bytes.len() == 4 && bytes.iter().all(u8::is_ascii_digit) {
        Some(String::from_utf8_lossy(bytes).into_owned())
    } else {
        None
    }
}

fn decode_components(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 4 {
        return None;
    }
    let mut out = String::new();
    for &b in bytes {
        let component = match b {
            0 => continue,
            1 => "Y",
            2 => "Cb",
            3 => "Cr",
            4 => "R",
            5 => "G",
            6 => "B",
            _ => return None,
        };
        out.push_str(component);
    }
    Some(out)
}

/// UserComment-style text: an 8-byte character code followed by the text.
fn decode_encoded_text(bytes: &[u8], endian: Endian) -> Option<String> {
    if bytes.len() < 8 {
        return None;
    }
    let (code, body) = bytes.split_at(8);
    let text = match code {
        b"ASCII\0\0\0" | b"JIS\0\0\0\0\0" | b"\0\0\0\0\0\0\0\0" => {
            String::from_utf8_lossy(body).into_owned()
        }
        b"UNICODE\0" => {
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|c| endian.u16_from([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => return None,
    };
    Some(text.trim_end_matches(['\0', ' ']).to_string())
}
