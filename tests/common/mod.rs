//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use image::{ImageFormat, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::{Bytes, ImageEXIF};
use std::io::Cursor;

/// Encode a small gradient with the `image` crate.
pub fn encode(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 96]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// Big-endian TIFF writer with absolute-offset bookkeeping left to the caller.
struct Be(Vec<u8>);

impl Be {
    fn u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn entry(&mut self, tag: u16, kind: u16, count: u32, value: u32) {
        self.u16(tag);
        self.u16(kind);
        self.u32(count);
        self.u32(value);
    }

    fn at(&self, expected: u32) {
        assert_eq!(self.0.len(), expected as usize, "fixture layout drifted");
    }
}

const fn dir_len(entries: u32) -> u32 {
    2 + 12 * entries + 4
}

/// A camera-style TIFF blob: IFD0 (Make, Model) with Exif and GPS sub-directories.
///
/// GPS position is 37°46'30.00"N 122°25'10.00"W.
pub fn gps_tiff(make: &str) -> Vec<u8> {
    let make = format!("{make:<5.5}\0");
    let model = b"Phone 12\0\0";
    let datetime = b"2021:06:01 12:00:00\0";

    let make_at = 8 + dir_len(4);
    let model_at = make_at + 6;
    let exif_at = model_at + 10;
    let datetime_at = exif_at + dir_len(1);
    let gps_at = datetime_at + 20;
    let lat_at = gps_at + dir_len(4);
    let lon_at = lat_at + 24;

    let mut t = Be(b"MM".to_vec());
    t.u16(42);
    t.u32(8);

    t.u16(4);
    t.entry(0x010F, 2, 6, make_at);
    t.entry(0x0110, 2, 10, model_at);
    t.entry(0x8769, 4, 1, exif_at);
    t.entry(0x8825, 4, 1, gps_at);
    t.u32(0);
    t.at(make_at);
    t.0.extend_from_slice(make.as_bytes());
    t.at(model_at);
    t.0.extend_from_slice(model);

    t.at(exif_at);
    t.u16(1);
    t.entry(0x9003, 2, 20, datetime_at);
    t.u32(0);
    t.at(datetime_at);
    t.0.extend_from_slice(datetime);

    t.at(gps_at);
    t.u16(4);
    t.entry(0x0001, 2, 2, u32::from_be_bytes(*b"N\0\0\0"));
    t.entry(0x0002, 5, 3, lat_at);
    t.entry(0x0003, 2, 2, u32::from_be_bytes(*b"W\0\0\0"));
    t.entry(0x0004, 5, 3, lon_at);
    t.u32(0);
    t.at(lat_at);
    for v in [37, 1, 46, 1, 3000, 100] {
        t.u32(v);
    }
    t.at(lon_at);
    for v in [122, 1, 25, 1, 1000, 100] {
        t.u32(v);
    }
    t.0
}

/// IFD0 entries of [`faulty_tiff`] that resolve on their own.
pub const SOUND_ENTRIES: [(u16, u16, u32, u32); 1] = [
    (0x0112, 3, 1, 6), // Orientation = 6
];

/// A little-endian TIFF blob whose IFD0 mixes good and broken entries.
pub fn faulty_tiff() -> Vec<u8> {
    le_tiff(&[
        SOUND_ENTRIES[0],
        (0x0131, 2, 40, 0x0000_FFFF), // Software, value offset past the end
        (0x0132, 42, 1, 0),           // unknown field type
        (0x0112, 3, 1, 1),            // duplicate Orientation
    ])
}

/// A little-endian TIFF blob with a single IFD0 of (tag, type, count, value) entries.
pub fn le_tiff(entries: &[(u16, u16, u32, u32)]) -> Vec<u8> {
    let mut t = b"II\x2A\x00\x08\x00\x00\x00".to_vec();
    t.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for &(tag, kind, count, value) in entries {
        t.extend_from_slice(&tag.to_le_bytes());
        t.extend_from_slice(&kind.to_le_bytes());
        t.extend_from_slice(&count.to_le_bytes());
        t.extend_from_slice(&value.to_le_bytes());
    }
    t.extend_from_slice(&0u32.to_le_bytes());
    t
}

/// JPEG with the given TIFF blob in an APP1 EXIF segment (inserted by img-parts).
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(encode(ImageFormat::Jpeg))).unwrap();
    jpeg.set_exif(Some(Bytes::copy_from_slice(tiff)));
    jpeg.encoder().bytes().to_vec()
}

/// PNG with the given TIFF blob in an eXIf chunk (inserted by img-parts).
pub fn png_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut png = Png::from_bytes(Bytes::from(encode(ImageFormat::Png))).unwrap();
    png.set_exif(Some(Bytes::copy_from_slice(tiff)));
    png.encoder().bytes().to_vec()
}

/// A raw APP1 EXIF segment, marker included.
pub fn app1_segment(tiff: &[u8]) -> Vec<u8> {
    let mut seg = vec![0xFF, 0xE1];
    seg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    seg.extend_from_slice(b"Exif\0\0");
    seg.extend_from_slice(tiff);
    seg
}

/// JPEG carrying one APP1 EXIF segment per blob, all right after SOI.
pub fn jpeg_with_segments<T: AsRef<[u8]>>(tiffs: &[T]) -> Vec<u8> {
    let clean = encode(ImageFormat::Jpeg);
    let mut out = clean[..2].to_vec();
    for tiff in tiffs {
        out.extend(app1_segment(tiff.as_ref()));
    }
    out.extend_from_slice(&clean[2..]);
    out
}

/// EXIF as seen by img-parts, independently of this crate's parser.
pub fn oracle_jpeg_exif(data: &[u8]) -> Option<Vec<u8>> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(data)).unwrap();
    jpeg.exif().map(|b| b.to_vec())
}

pub fn oracle_png_exif(data: &[u8]) -> Option<Vec<u8>> {
    let png = Png::from_bytes(Bytes::copy_from_slice(data)).unwrap();
    png.exif().map(|b| b.to_vec())
}
