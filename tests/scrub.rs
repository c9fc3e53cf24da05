mod common;

use common::*;
use exif_scrub::container::Container;
use exif_scrub::{
    MediaKind, RedactOptions, RedactionPolicy, ScrubError, TagValue, extract_metadata,
    redact_metadata, redact_metadata_with,
};
use image::ImageFormat;

// ── extraction ───────────────────────────────────────────────────────

#[test]
fn gps_jpeg_lists_every_directory() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    let extraction = extract_metadata(&data).unwrap();
    assert_eq!(extraction.kind, MediaKind::Jpeg);
    assert!(extraction.warnings.is_empty(), "{:?}", extraction.warnings);

    let rows: Vec<_> = extraction
        .entries
        .iter()
        .map(|e| (e.fq_ifd_path.as_str(), e.tag_name, e.value_string.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            ("IFD", "Make", "Apple"),
            ("IFD", "Model", "Phone 12"),
            ("IFD/Exif", "DateTimeOriginal", "2021:06:01 12:00:00"),
            ("IFD/GPS", "GPSLatitudeRef", "N"),
            ("IFD/GPS", "GPSLatitude", "37/1, 46/1, 3000/100"),
            ("IFD/GPS", "GPSLongitudeRef", "W"),
            ("IFD/GPS", "GPSLongitude", "122/1, 25/1, 1000/100"),
        ]
    );

    let lat = &extraction.entries[4];
    assert_eq!(lat.tag_id, 0x0002);
    assert_eq!(lat.tag_type_id, 5);
    assert_eq!(lat.tag_type_name, "RATIONAL");
    assert_eq!(lat.unit_count, 3);
    assert_eq!(lat.ifd_path, "IFD/GPS");
    assert_eq!(lat.ifd_index, 0);
    assert!(matches!(&lat.value, TagValue::Rationals(v) if v.len() == 3));
}

#[test]
fn png_exif_chunk_is_read() {
    let data = png_with_exif(&gps_tiff("Canon"));
    let extraction = extract_metadata(&data).unwrap();
    assert_eq!(extraction.kind, MediaKind::Png);
    assert_eq!(extraction.entries.len(), 7);
    assert_eq!(extraction.entries[0].value_string, "Canon");
}

#[test]
fn jpeg_without_exif_is_empty() {
    let data = encode(ImageFormat::Jpeg);
    let extraction = extract_metadata(&data).unwrap();
    assert!(extraction.entries.is_empty());
    assert!(extraction.warnings.is_empty());
}

#[test]
fn entries_are_unique() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    let entries = extract_metadata(&data).unwrap().entries;
    let mut keys: Vec<_> = entries.iter().map(|e| (e.fq_ifd_path.clone(), e.tag_id)).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), entries.len());
}

#[test]
fn bad_entries_become_warnings() {
    let data = jpeg_with_exif(&faulty_tiff());
    let extraction = extract_metadata(&data).unwrap();
    assert_eq!(extraction.entries.len(), 1);
    assert_eq!(extraction.entries[0].tag_name, "Orientation");
    assert_eq!(extraction.entries[0].value_string, "6");

    let failed: Vec<_> = extraction.warnings.iter().map(|w| w.tag_id).collect();
    assert_eq!(failed, [Some(0x0131), Some(0x0132), Some(0x0112)]);

    // The sound siblings resolve exactly as they do without the broken entries.
    let baseline = extract_metadata(&jpeg_with_exif(&le_tiff(&SOUND_ENTRIES))).unwrap();
    assert!(baseline.warnings.is_empty());
    assert_eq!(baseline.entries, extraction.entries);
}

#[test]
fn invalid_tiff_header_is_one_warning() {
    let data = jpeg_with_segments(&[b"XX\0\0garbage"]);
    let extraction = extract_metadata(&data).unwrap();
    assert!(extraction.entries.is_empty());
    assert_eq!(extraction.warnings.len(), 1);
}

#[test]
fn entry_json_shape() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    let extraction = extract_metadata(&data).unwrap();
    let json = serde_json::to_value(&extraction.entries[0]).unwrap();
    for key in [
        "ifd_path",
        "fq_ifd_path",
        "ifd_index",
        "tag_id",
        "tag_name",
        "tag_type_id",
        "tag_type_name",
        "unit_count",
        "value",
        "value_string",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["value"], "Apple");
    assert_eq!(json["tag_id"], 0x010F);
}

#[test]
fn first_exif_segment_is_authoritative() {
    let first = gps_tiff("Apple");
    let second = gps_tiff("Nikon");
    let data = jpeg_with_segments(&[&first, &second]);
    let extraction = extract_metadata(&data).unwrap();
    assert_eq!(extraction.entries[0].value_string, "Apple");
    assert_eq!(extraction.entries.len(), 7);
}

// ── redaction ────────────────────────────────────────────────────────

#[test]
fn gps_jpeg_redacts_cleanly() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    assert!(oracle_jpeg_exif(&data).is_some());

    let result = redact_metadata_with(&data, &RedactOptions::default()).unwrap();
    let app1_len = 2 + 2 + 6 + gps_tiff("Apple").len();
    assert_eq!(result.bytes_removed, app1_len);
    assert_eq!(result.output.len(), data.len() - result.bytes_removed);

    assert!(oracle_jpeg_exif(&result.output).is_none());
    assert!(extract_metadata(&result.output).unwrap().entries.is_empty());
    image::load_from_memory(&result.output).unwrap();
}

#[test]
fn png_redacts_cleanly() {
    let data = png_with_exif(&gps_tiff("Canon"));
    assert!(oracle_png_exif(&data).is_some());

    let output = redact_metadata(&data).unwrap();
    assert!(oracle_png_exif(&output).is_none());
    assert_eq!(output.len(), data.len() - (12 + gps_tiff("Canon").len()));
    image::load_from_memory_with_format(&output, ImageFormat::Png).unwrap();
}

#[test]
fn only_the_exif_unit_is_touched() {
    let clean = encode(ImageFormat::Jpeg);
    let data = jpeg_with_segments(&[&gps_tiff("Apple")]);
    assert_eq!(redact_metadata(&data).unwrap(), clean);
}

#[test]
fn redaction_without_exif_fails() {
    let data = encode(ImageFormat::Png);
    assert!(matches!(redact_metadata(&data), Err(ScrubError::NoExifFound)));
}

#[test]
fn redaction_is_idempotent() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    let once = redact_metadata(&data).unwrap();
    assert!(matches!(redact_metadata(&once), Err(ScrubError::NoExifFound)));
}

#[test]
fn every_exif_segment_is_removed() {
    let first = gps_tiff("Apple");
    let second = faulty_tiff();
    let data = jpeg_with_segments(&[&first, &second]);

    let container = Container::parse(&data).unwrap();
    assert_eq!(container.exif_blobs().len(), 2);

    let result = redact_metadata_with(&data, &RedactOptions::default()).unwrap();
    assert_eq!(result.bytes_removed, (10 + first.len()) + (10 + second.len()));
    assert!(Container::parse(&result.output).unwrap().exif_blobs().is_empty());
    assert!(oracle_jpeg_exif(&result.output).is_none());
}

#[test]
fn policies_produce_identical_output() {
    for data in [
        jpeg_with_exif(&gps_tiff("Apple")),
        png_with_exif(&gps_tiff("Apple")),
        jpeg_with_segments(&[&gps_tiff("Apple"), &faulty_tiff()]),
    ] {
        let excise = redact_metadata_with(&data, &RedactOptions::default()).unwrap();
        let zero_fill = redact_metadata_with(
            &data,
            &RedactOptions {
                policy: RedactionPolicy::ZeroFillThenExcise,
                verify_decode: true,
            },
        )
        .unwrap();
        assert_eq!(excise, zero_fill);
    }
}

#[test]
fn every_unit_is_accounted_for() {
    for data in [
        jpeg_with_exif(&gps_tiff("Apple")),
        png_with_exif(&gps_tiff("Apple")),
        encode(ImageFormat::Jpeg),
        encode(ImageFormat::Png),
    ] {
        let container = Container::parse(&data).unwrap();
        assert_eq!(container.total_len(), data.len());
        let rebuilt: Vec<u8> = container
            .units()
            .iter()
            .flat_map(|u| u.bytes(&data).unwrap().iter().copied())
            .collect();
        assert_eq!(rebuilt, data);
    }
}

// ── malformed input ──────────────────────────────────────────────────

#[test]
fn truncated_jpeg_is_malformed() {
    let data = jpeg_with_exif(&gps_tiff("Apple"));
    let truncated = &data[..40];
    assert!(matches!(
        extract_metadata(truncated),
        Err(ScrubError::MalformedContainer { kind: MediaKind::Jpeg, .. })
    ));
    assert!(matches!(
        redact_metadata(truncated),
        Err(ScrubError::MalformedContainer { .. })
    ));
}

#[test]
fn unsupported_buffers_are_rejected() {
    for data in [&b"GIF89a......"[..], b"", b"\xFF"] {
        assert!(matches!(extract_metadata(data), Err(ScrubError::UnsupportedFormat)));
        assert!(matches!(redact_metadata(data), Err(ScrubError::UnsupportedFormat)));
    }
}
