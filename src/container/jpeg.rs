//! JPEG marker segment parsing.
//!
//! A JPEG is `SOI`, then a run of marker segments (`FF xx`, big-endian length that
//! counts itself, payload), then `SOS` followed by entropy-coded data and `EOI`.
//! Walking stops at the first `SOS`: everything after its header is kept as one
//! opaque scan-data unit, since metadata segments never follow it in practice and
//! the scan data must be preserved untouched anyway.

use super::{ContainerFormat, ContainerUnit, UnitType};
use crate::error::{ScrubError, ScrubResult};
use crate::format::{JPEG_SOI, MediaKind};

/// JPEG marker codes.
pub mod markers {
    pub const PREFIX: u8 = 0xFF;
    pub const TEM: u8 = 0x01;
    pub const SOF0: u8 = 0xC0;
    pub const DHT: u8 = 0xC4;
    pub const JPG: u8 = 0xC8;
    pub const DAC: u8 = 0xCC;
    pub const SOF15: u8 = 0xCF;
    pub const RST0: u8 = 0xD0;
    pub const RST7: u8 = 0xD7;
    pub const SOI: u8 = 0xD8;
    pub const EOI: u8 = 0xD9;
    pub const SOS: u8 = 0xDA;
    pub const DQT: u8 = 0xDB;
    pub const DNL: u8 = 0xDC;
    pub const DRI: u8 = 0xDD;
    pub const DHP: u8 = 0xDE;
    pub const EXP: u8 = 0xDF;
    pub const APP0: u8 = 0xE0;
    pub const APP1: u8 = 0xE1;
    pub const APP15: u8 = 0xEF;
    pub const COM: u8 = 0xFE;
}

/// Exif identifier code at the start of an APP1 EXIF payload.
pub const EXIF_ID: &[u8; 6] = b"Exif\0\0";

/// Human-readable marker name (`APP1`, `SOF2`, `RST3`, ...).
pub fn marker_name(marker: u8) -> String {
    use markers::*;
    match marker {
        SOI => "SOI".into(),
        EOI => "EOI".into(),
        SOS => "SOS".into(),
        DQT => "DQT".into(),
        DHT => "DHT".into(),
        DRI => "DRI".into(),
        DNL => "DNL".into(),
        DHP => "DHP".into(),
        EXP => "EXP".into(),
        DAC => "DAC".into(),
        JPG => "JPG".into(),
        COM => "COM".into(),
        TEM => "TEM".into(),
        SOF0..=SOF15 => format!("SOF{}", marker - SOF0),
        RST0..=RST7 => format!("RST{}", marker - RST0),
        APP0..=APP15 => format!("APP{}", marker - APP0),
        _ => format!("0x{marker:02X}"),
    }
}

/// Standalone markers carry no length field.
fn is_standalone(marker: u8) -> bool {
    marker == markers::TEM || (markers::RST0..=markers::RST7).contains(&marker)
}

/// Parsed JPEG segment list.
#[derive(Debug, Clone)]
pub struct JpegContainer<'a> {
    units: Vec<ContainerUnit<'a>>,
}

impl<'a> ContainerFormat<'a> for JpegContainer<'a> {
    fn kind(&self) -> MediaKind {
        MediaKind::Jpeg
    }

    fn units(&self) -> &[ContainerUnit<'a>] {
        &self.units
    }

    fn exif_payload(&self, unit: &ContainerUnit<'a>) -> Option<&'a [u8]> {
        match unit.unit_type {
            UnitType::Marker(markers::APP1) => unit.payload.strip_prefix(EXIF_ID.as_slice()),
            _ => None,
        }
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> ScrubError {
    ScrubError::malformed(MediaKind::Jpeg, offset, reason)
}

/// Split a JPEG buffer into marker segments.
pub fn parse(data: &[u8]) -> ScrubResult<JpegContainer<'_>> {
    if !data.starts_with(&JPEG_SOI) {
        return Err(malformed(0, "missing SOI marker"));
    }

    let mut units = vec![ContainerUnit {
        offset: 0,
        header_len: JPEG_SOI.len(),
        payload: &[],
        trailer_len: 0,
        unit_type: UnitType::Marker(markers::SOI),
    }];
    let mut pos = JPEG_SOI.len();

    while pos < data.len() {
        let start = pos;
        if data[pos] != markers::PREFIX {
            return Err(malformed(
                pos,
                format!("expected marker prefix, found 0x{:02x}", data[pos]),
            ));
        }

        // Any number of 0xFF fill bytes may precede a marker code.
        while pos < data.len() && data[pos] == markers::PREFIX {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(malformed(start, "buffer ends inside marker fill bytes"));
        }

        let marker = data[pos];
        pos += 1;

        match marker {
            0x00 => return Err(malformed(start, "stuffed 0xFF00 outside scan data")),
            markers::SOI => return Err(malformed(start, "unexpected second SOI")),
            markers::EOI => {
                units.push(ContainerUnit {
                    offset: start,
                    header_len: pos - start,
                    payload: &[],
                    trailer_len: 0,
                    unit_type: UnitType::Marker(markers::EOI),
                });
                if pos < data.len() {
                    log::debug!("{} trailing bytes after EOI", data.len() - pos);
                    units.push(trailing(data, pos));
                }
                break;
            }
            m if is_standalone(m) => {
                units.push(ContainerUnit {
                    offset: start,
                    header_len: pos - start,
                    payload: &[],
                    trailer_len: 0,
                    unit_type: UnitType::Marker(m),
                });
                continue;
            }
            _ => {}
        }

        if pos + 2 > data.len() {
            return Err(malformed(
                start,
                format!("truncated length field for {}", marker_name(marker)),
            ));
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 {
            return Err(malformed(
                start,
                format!("{} declares invalid length {length}", marker_name(marker)),
            ));
        }
        let end = pos + length;
        if end > data.len() {
            return Err(malformed(
                start,
                format!(
                    "{} declares {} payload bytes but only {} remain",
                    marker_name(marker),
                    length - 2,
                    data.len() - (pos + 2)
                ),
            ));
        }

        let unit = ContainerUnit {
            offset: start,
            header_len: pos + 2 - start,
            payload: &data[pos + 2..end],
            trailer_len: 0,
            unit_type: UnitType::Marker(marker),
        };
        log::trace!("{} at {start}, {} bytes", unit.unit_type, unit.len());
        units.push(unit);
        pos = end;

        if marker == markers::SOS {
            if pos < data.len() {
                units.push(ContainerUnit {
                    offset: pos,
                    header_len: 0,
                    payload: &data[pos..],
                    trailer_len: 0,
                    unit_type: UnitType::ScanData,
                });
            }
            break;
        }
    }

    Ok(JpegContainer { units })
}

fn trailing(data: &[u8], pos: usize) -> ContainerUnit<'_> {
    ContainerUnit {
        offset: pos,
        header_len: 0,
        payload: &data[pos..],
        trailer_len: 0,
        unit_type: UnitType::Trailing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn sample() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(markers::APP0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0"));
        data.extend(segment(markers::APP1, b"Exif\0\0II*\0\x08\0\0\0\0\0"));
        data.extend(segment(0xEB, b"vendor blob"));
        data.extend(segment(markers::DQT, &[0u8; 65]));
        data.extend(segment(markers::SOS, &[1, 1, 0, 0, 0x3F, 0]));
        data.extend_from_slice(&[0x12, 0xFF, 0x00, 0x34, 0xFF, 0xD0, 0x56]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn walks_segments_until_scan() {
        let data = sample();
        let jpeg = parse(&data).unwrap();
        let names: Vec<String> = jpeg.units().iter().map(|u| u.unit_type.to_string()).collect();
        assert_eq!(
            names,
            ["SOI", "APP0", "APP1", "APP11", "DQT", "SOS", "scan-data"]
        );
        let total: usize = jpeg.units().iter().map(ContainerUnit::len).sum();
        assert_eq!(total, data.len());
        assert!(jpeg.units().last().unwrap().payload.ends_with(&[0xFF, 0xD9]));
    }

    #[test]
    fn units_are_contiguous() {
        let data = sample();
        let jpeg = parse(&data).unwrap();
        for pair in jpeg.units().windows(2) {
            assert_eq!(pair[0].end(), pair[1].offset);
        }
    }

    #[test]
    fn unknown_segments_are_kept() {
        let data = sample();
        let jpeg = parse(&data).unwrap();
        let vendor = jpeg
            .units()
            .iter()
            .find(|u| u.unit_type == UnitType::Marker(0xEB))
            .unwrap();
        assert_eq!(vendor.payload, b"vendor blob");
    }

    #[test]
    fn exif_payload_strips_identifier() {
        let data = sample();
        let jpeg = parse(&data).unwrap();
        let blobs = jpeg.exif_blobs();
        assert_eq!(blobs.len(), 1);
        assert!(blobs[0].data.starts_with(b"II*\0"));
        assert_eq!(blobs[0].span_start, 2 + 18);
        assert_eq!(blobs[0].span_len(), 4 + 16);
    }

    #[test]
    fn xmp_app1_is_not_exif() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(markers::APP1, b"http://ns.adobe.com/xap/1.0/\0<x/>"));
        data.extend_from_slice(&[0xFF, 0xD9]);
        let jpeg = parse(&data).unwrap();
        assert!(jpeg.exif_blobs().is_empty());
    }

    #[test]
    fn fill_bytes_belong_to_next_unit() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xFF];
        data.extend(segment(markers::COM, b"hi"));
        data.extend_from_slice(&[0xFF, 0xD9]);
        let jpeg = parse(&data).unwrap();
        let com = &jpeg.units()[1];
        assert_eq!(com.offset, 2);
        assert_eq!(com.header_len, 6);
        assert_eq!(com.payload, b"hi");
    }

    #[test]
    fn standalone_markers_have_no_length() {
        let data = [0xFF, 0xD8, 0xFF, 0xD3, 0xFF, 0x01, 0xFF, 0xD9];
        let jpeg = parse(&data).unwrap();
        let names: Vec<String> = jpeg.units().iter().map(|u| u.unit_type.to_string()).collect();
        assert_eq!(names, ["SOI", "RST3", "TEM", "EOI"]);
    }

    #[test]
    fn bytes_after_eoi_become_trailing_unit() {
        let data = [0xFF, 0xD8, 0xFF, 0xD9, 0xAA, 0xBB];
        let jpeg = parse(&data).unwrap();
        let last = jpeg.units().last().unwrap();
        assert_eq!(last.unit_type, UnitType::Trailing);
        assert_eq!(last.payload, &[0xAA, 0xBB]);
    }

    #[test]
    fn exhausted_buffer_without_scan_is_accepted() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(markers::APP0, b"JFIF\0"));
        let jpeg = parse(&data).unwrap();
        assert_eq!(jpeg.units().len(), 2);
    }

    #[test]
    fn overrunning_segment_is_malformed() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x01, 0x00];
        data.extend_from_slice(b"Exif\0\0II");
        match parse(&data) {
            Err(ScrubError::MalformedContainer { kind, offset, .. }) => {
                assert_eq!(kind, MediaKind::Jpeg);
                assert_eq!(offset, 2);
            }
            other => panic!("expected MalformedContainer, got {other:?}"),
        }
    }

    #[test]
    fn truncated_inputs_never_panic() {
        let sets: &[&[u8]] = &[
            b"\xff\xd8\xff",
            b"\xff\xd8\xff\xe1",
            b"\xff\xd8\xff\xe1\x00",
            b"\xff\xd8\xff\xe1\x00\x01",
            b"\xff\xd8\x00",
            b"\xff\xd8\xff\x00",
            b"\xff\xd8\xff\xd8",
        ];
        for &data in sets {
            assert!(
                matches!(parse(data), Err(ScrubError::MalformedContainer { .. })),
                "{data:02x?}"
            );
        }
    }

    #[test]
    fn marker_names() {
        assert_eq!(marker_name(0xC2), "SOF2");
        assert_eq!(marker_name(0xED), "APP13");
        assert_eq!(marker_name(0xD5), "RST5");
        assert_eq!(marker_name(0x42), "0x42");
    }
}
