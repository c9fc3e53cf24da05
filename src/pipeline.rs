use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::ScrubError;
use crate::format::{MediaKind, classify};
use crate::{Extraction, extract_metadata, redact_metadata_with, verify};

/// Bytes needed to classify a file (the PNG signature is the longest magic).
const SNIFF_LEN: usize = 8;

/// The result of scrubbing a single file.
///
/// # Example
///
/// ```rust,no_run
/// use exif_scrub::config::Config;
/// use exif_scrub::pipeline::scrub_file;
///
/// let config = Config::default();
/// let result = scrub_file("photo.jpg".as_ref(), &config);
///
/// if result.error.is_none() && result.changed {
///     println!("Removed {} bytes ({} tags)", result.bytes_removed, result.entries_found);
///     if let Some(ref backup) = result.backup_path {
///         println!("Backup: {}", backup.display());
///     }
/// }
/// ```
#[derive(Debug)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Tags read from the authoritative EXIF blob before redaction.
    pub entries_found: usize,
    pub bytes_removed: usize,
    /// `true` only when the file on disk was rewritten.
    pub changed: bool,
    pub backup_path: Option<PathBuf>,
    /// Why the file was deliberately left alone (e.g. it does not decode).
    pub skipped: Option<String>,
    pub error: Option<String>,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            kind: MediaKind::Unsupported,
            entries_found: 0,
            bytes_removed: 0,
            changed: false,
            backup_path: None,
            skipped: None,
            error: None,
        }
    }
}

/// Collect JPEG and PNG files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Files are kept by their leading magic
/// bytes, not their extension.
///
/// # Example
///
/// ```rust,no_run
/// use exif_scrub::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Classify a file from its first bytes. Unreadable files are unsupported.
pub fn sniff_file(path: &Path) -> MediaKind {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    match File::open(path).and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut head)) {
        Ok(_) => classify(&head),
        Err(e) => {
            log::debug!("Cannot read {}: {e}", path.display());
            MediaKind::Unsupported
        }
    }
}

fn is_supported_image(path: &Path) -> bool {
    sniff_file(path).is_supported()
}

/// Create a backup of the original file.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup_path = path.with_extension(format!(
        "{}.bak",
        path.extension().unwrap_or_default().to_string_lossy()
    ));

    if !backup_path.exists() {
        std::fs::copy(path, &backup_path).context("Failed to create backup")?;
        log::debug!("Backup created: {}", backup_path.display());
    }

    Ok(backup_path)
}

/// Read a file and enumerate its EXIF entries.
pub fn inspect_file(path: &Path) -> Result<Extraction> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    extract_metadata(&bytes).with_context(|| format!("Failed to inspect {}", path.display()))
}

/// Strip EXIF from one file in place.
///
/// 1. **Read** the file and classify it by magic bytes
/// 2. **Check** that the original decodes; files that don't are passed through untouched
/// 3. **Redact** every EXIF unit and verify the output
/// 4. **Write** the output over the original, after an optional `.bak` backup
///
/// A file without EXIF is reported as unchanged, not as an error. With
/// `output.dry_run` set, steps 1 to 3 run and nothing is written.
pub fn scrub_file(path: &Path, config: &Config) -> ProcessResult {
    let mut result = ProcessResult::new(path);

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.error = Some(format!("Failed to read file: {e}"));
            return result;
        }
    };

    result.kind = classify(&bytes);
    if !result.kind.is_supported() {
        result.error = Some(ScrubError::UnsupportedFormat.to_string());
        return result;
    }

    if let Err(e) = verify::check_decodable(&bytes) {
        log::warn!("{} does not decode, leaving it untouched: {e}", path.display());
        result.skipped = Some(format!("original does not decode: {e}"));
        return result;
    }

    match extract_metadata(&bytes) {
        Ok(extraction) => result.entries_found = extraction.entries.len(),
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    }

    let redaction = match redact_metadata_with(&bytes, &config.redaction) {
        Ok(redaction) => redaction,
        Err(ScrubError::NoExifFound) => {
            log::info!("  {}: no EXIF", path.display());
            return result;
        }
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    };
    result.bytes_removed = redaction.bytes_removed;

    if config.output.dry_run {
        log::info!(
            "  {}: would remove {} bytes ({} tags)",
            path.display(),
            redaction.bytes_removed,
            result.entries_found
        );
        return result;
    }

    if config.output.backup_originals {
        match backup_file(path) {
            Ok(backup) => result.backup_path = Some(backup),
            Err(e) => {
                result.error = Some(format!("Failed to backup original: {e:#}"));
                return result;
            }
        }
    }

    match std::fs::write(path, &redaction.output) {
        Ok(()) => {
            result.changed = true;
            log::info!(
                "  {}: removed {} bytes ({} tags)",
                path.display(),
                redaction.bytes_removed,
                result.entries_found
            );
        }
        Err(e) => result.error = Some(format!("Failed to write file: {e}")),
    }

    result
}
