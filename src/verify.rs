//! Post-redaction checks: structural re-parse and a full image decode.

use crate::container::Container;
use crate::error::{ScrubError, ScrubResult};
use crate::format::MediaKind;

/// Check that `output` is still a well-formed `kind` image with no EXIF left.
///
/// When `decode` is set the pixels are decoded too. The structural
/// re-parse always runs.
pub fn verify(kind: MediaKind, output: &[u8], decode: bool) -> ScrubResult<()> {
    let container = Container::parse_as(kind, output)
        .map_err(|e| ScrubError::CorruptionOnRedaction(format!("output does not re-parse: {e}")))?;

    let residual = container.exif_blobs().len();
    if residual > 0 {
        return Err(ScrubError::CorruptionOnRedaction(format!(
            "{residual} EXIF unit(s) remain after redaction"
        )));
    }

    if decode {
        check_decodable(output).map_err(|e| {
            ScrubError::CorruptionOnRedaction(format!("output does not decode: {e}"))
        })?;
    }
    Ok(())
}

/// Decode `buffer` with the format-agnostic decoder, discarding the pixels.
pub fn check_decodable(buffer: &[u8]) -> Result<(), image::ImageError> {
    image::load_from_memory(buffer).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| image::Rgb([(x * 30) as u8, (y * 30) as u8, 128]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn clean_images_pass() {
        verify(MediaKind::Jpeg, &encode(ImageFormat::Jpeg), true).unwrap();
        verify(MediaKind::Png, &encode(ImageFormat::Png), true).unwrap();
    }

    #[test]
    fn residual_exif_is_corruption() {
        let clean = encode(ImageFormat::Jpeg);
        let mut data = clean[..2].to_vec();
        data.extend_from_slice(&[0xFF, 0xE1, 0x00, 0x10]);
        data.extend_from_slice(b"Exif\0\0II*\0\x08\0\0\0");
        data.extend_from_slice(&clean[2..]);
        let err = verify(MediaKind::Jpeg, &data, false).unwrap_err();
        assert!(matches!(err, ScrubError::CorruptionOnRedaction(_)));
    }

    #[test]
    fn structural_damage_is_corruption() {
        let mut data = encode(ImageFormat::Png);
        data.truncate(20);
        let err = verify(MediaKind::Png, &data, false).unwrap_err();
        assert!(err.to_string().contains("re-parse"));
    }

    #[test]
    fn undecodable_output_fails_only_when_decoding() {
        // Parses as a JPEG (SOI, SOS, scan bytes) but has no frame header.
        let data = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x12, 0x34, 0xFF, 0xD9];
        verify(MediaKind::Jpeg, &data, false).unwrap();
        assert!(matches!(
            verify(MediaKind::Jpeg, &data, true),
            Err(ScrubError::CorruptionOnRedaction(_))
        ));
    }
}
