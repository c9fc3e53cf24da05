//! IFD traversal over a raw TIFF blob.
//!
//! Walks IFD0, its next-link chain, and the Exif/GPS/Interop sub-directories.
//! Every entry produces either an [`IfdEntry`] or a [`TagResolutionFailure`];
//! a bad entry never stops the walk.
//!
//! Decoded values are charged against a budget equal to the blob length. A
//! well-formed blob never exceeds it since its values don't overlap; entries
//! that all point at one shared region do, and the excess ones fail instead of
//! each copying the region again.

use std::collections::HashSet;

use super::IfdEntry;
use super::tags::{self, IfdKind, UNKNOWN_TAG};
use super::tiff::{
    Endian, IFD_ENTRY_LEN, INLINE_VALUE_LEN, RawEntry, TIFF_HEADER_LEN, TagType, read_raw_entry,
    read_tiff_header,
};
use super::value;
use crate::error::TagResolutionFailure;

/// Deepest sub-directory nesting followed (IFD -> Exif -> Iop is depth 2).
const MAX_DEPTH: usize = 8;
/// Longest IFD0 next-link chain followed.
const MAX_CHAIN: usize = 16;
/// TIFF type id 13 (IFD) is accepted for sub-directory pointers.
const TYPE_IFD: u16 = 13;

/// Entries and warnings from one walk, each in visitation order.
#[derive(Debug, Default)]
pub struct WalkOutput {
    pub entries: Vec<IfdEntry>,
    pub failures: Vec<TagResolutionFailure>,
}

/// Walk `blob` and split the per-entry results. Each failure is logged.
pub fn walk(blob: &[u8]) -> WalkOutput {
    let mut out = WalkOutput::default();
    for result in walk_results(blob) {
        match result {
            Ok(entry) => out.entries.push(entry),
            Err(failure) => {
                log::warn!("{failure}");
                out.failures.push(failure);
            }
        }
    }
    out
}

/// Walk `blob` and return one result per visited entry or broken directory.
pub fn walk_results(blob: &[u8]) -> Vec<Result<IfdEntry, TagResolutionFailure>> {
    let (endian, ifd0) = match read_tiff_header(blob) {
        Ok(header) => header,
        Err(reason) => {
            return vec![Err(TagResolutionFailure::new(
                IfdKind::Root.path(),
                None,
                0,
                reason,
            ))];
        }
    };

    let mut walker = Walker {
        data: blob,
        endian,
        visited: HashSet::new(),
        value_budget: blob.len(),
        results: Vec::new(),
    };
    walker.walk_chain(ifd0 as usize);
    walker.results
}

struct Walker<'a> {
    data: &'a [u8],
    endian: Endian,
    visited: HashSet<usize>,
    /// Value bytes still allowed to be decoded in this walk.
    value_budget: usize,
    results: Vec<Result<IfdEntry, TagResolutionFailure>>,
}

impl Walker<'_> {
    fn fail(&mut self, fq_ifd_path: &str, tag_id: Option<u16>, offset: usize, reason: String) {
        self.results
            .push(Err(TagResolutionFailure::new(fq_ifd_path, tag_id, offset, reason)));
    }

    fn walk_chain(&mut self, mut offset: usize) {
        let mut index = 0;
        while offset != 0 {
            let fq_path = if index == 0 {
                IfdKind::Root.path().to_string()
            } else {
                format!("{}{index}", IfdKind::Root.path())
            };
            if index >= MAX_CHAIN {
                self.fail(
                    &fq_path,
                    None,
                    offset,
                    format!("IFD chain longer than {MAX_CHAIN} directories"),
                );
                break;
            }
            match self.visit_dir(IfdKind::Root, &fq_path, index, offset, 0) {
                Some(next) => offset = next,
                None => break,
            }
            index += 1;
        }
    }

    /// Visit one directory. Returns its next-IFD link, or `None` if the
    /// directory itself could not be read.
    fn visit_dir(
        &mut self,
        kind: IfdKind,
        fq_path: &str,
        ifd_index: usize,
        offset: usize,
        depth: usize,
    ) -> Option<usize> {
        if depth > MAX_DEPTH {
            self.fail(fq_path, None, offset, format!("nesting deeper than {MAX_DEPTH}"));
            return None;
        }
        if offset < TIFF_HEADER_LEN || offset >= self.data.len() {
            self.fail(
                fq_path,
                None,
                offset,
                format!("directory offset out of range (blob is {} bytes)", self.data.len()),
            );
            return None;
        }
        if !self.visited.insert(offset) {
            self.fail(fq_path, None, offset, "directory already visited (offset cycle)".into());
            return None;
        }
        let Some(declared) = self.endian.read_u16(self.data, offset) else {
            self.fail(fq_path, None, offset, "truncated entry count".into());
            return None;
        };

        let first_entry = offset + 2;
        let fit = (self.data.len() - first_entry) / IFD_ENTRY_LEN;
        let count = usize::from(declared).min(fit);
        if count < usize::from(declared) {
            self.fail(
                fq_path,
                None,
                offset,
                format!("directory declares {declared} entries but only {fit} fit"),
            );
        }
        log::debug!("{fq_path} at {offset}: {count} entries");

        // A tag counts as taken once an occurrence of it resolves; copies
        // after that are duplicates, copies after a failed one get their turn.
        let mut taken = HashSet::new();
        for i in 0..count {
            let position = first_entry + i * IFD_ENTRY_LEN;
            let Some(raw) = read_raw_entry(self.endian, self.data, position) else {
                break;
            };
            if taken.contains(&raw.tag) {
                self.fail(fq_path, Some(raw.tag), position, "duplicate tag in directory".into());
                continue;
            }
            let resolved = match kind.child(raw.tag) {
                Some(child) => self.follow_pointer(fq_path, child, &raw, depth),
                None => {
                    let result = self.resolve(kind, fq_path, ifd_index, &raw);
                    let ok = result.is_ok();
                    self.results.push(result);
                    ok
                }
            };
            if resolved {
                taken.insert(raw.tag);
            }
        }

        let next = self
            .endian
            .read_u32(self.data, first_entry + usize::from(declared) * IFD_ENTRY_LEN)
            .unwrap_or(0);
        Some(next as usize)
    }

    /// Returns `false` if the pointer entry itself is unusable.
    fn follow_pointer(&mut self, fq_path: &str, child: IfdKind, raw: &RawEntry, depth: usize) -> bool {
        if !matches!(raw.type_id, 4 | TYPE_IFD) || raw.count != 1 {
            self.fail(
                fq_path,
                Some(raw.tag),
                raw.position,
                format!(
                    "unreadable {} pointer (type {}, count {})",
                    child.segment(),
                    raw.type_id,
                    raw.count
                ),
            );
            return false;
        }
        let child_path = format!("{fq_path}/{}", child.segment());
        // Sub-directories have no chain of their own; their next link is ignored.
        self.visit_dir(child, &child_path, 0, raw.value_offset as usize, depth + 1);
        true
    }

    fn resolve(
        &mut self,
        kind: IfdKind,
        fq_path: &str,
        ifd_index: usize,
        raw: &RawEntry,
    ) -> Result<IfdEntry, TagResolutionFailure> {
        let data = self.data;
        let failure = |reason: String| {
            TagResolutionFailure::new(fq_path, Some(raw.tag), raw.position, reason)
        };

        let tag_type = TagType::from_id(raw.type_id)
            .ok_or_else(|| failure(format!("unknown field type {}", raw.type_id)))?;
        let size = (raw.count as usize)
            .checked_mul(tag_type.unit_size())
            .ok_or_else(|| failure(format!("value size overflows ({} units)", raw.count)))?;

        let start = if size <= INLINE_VALUE_LEN {
            raw.value_field()
        } else {
            raw.value_offset as usize
        };
        let bytes = start
            .checked_add(size)
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                failure(format!(
                    "{size}-byte value at offset {start} overruns {}-byte blob",
                    data.len()
                ))
            })?;
        if size > self.value_budget {
            return Err(failure(format!(
                "{size}-byte value exceeds the remaining decode budget of {} bytes",
                self.value_budget
            )));
        }
        self.value_budget -= size;

        let value = value::decode(kind, raw.tag, tag_type, bytes, self.endian);
        Ok(IfdEntry {
            ifd_path: kind.path(),
            fq_ifd_path: fq_path.to_string(),
            ifd_index,
            tag_id: raw.tag,
            tag_name: tags::tag_name(kind, raw.tag).unwrap_or(UNKNOWN_TAG),
            tag_type_id: raw.type_id,
            tag_type_name: tag_type.name(),
            unit_count: raw.count,
            value_string: value.to_string(),
            value,
        })
    }
}
