//! Byte-range excision of EXIF-bearing container units.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the EXIF spans are removed. Both policies produce identical bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionPolicy {
    /// Copy everything outside the spans into a fresh buffer.
    #[default]
    Excise,
    /// Zero the spans in a working copy, then trim them out.
    ZeroFillThenExcise,
}

/// Caller-controlled redaction behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedactOptions {
    pub policy: RedactionPolicy,
    /// Decode the output with a generic image decoder after redaction.
    /// The structural re-parse always runs.
    pub verify_decode: bool,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            policy: RedactionPolicy::Excise,
            verify_decode: true,
        }
    }
}

/// A redacted copy of the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionResult {
    pub output: Vec<u8>,
    pub bytes_removed: usize,
}

/// Remove every span from `buffer`. Spans may arrive in any order; overlapping
/// or adjacent spans are merged so no byte is counted twice.
pub fn redact(buffer: &[u8], spans: &[Range<usize>], policy: RedactionPolicy) -> RedactionResult {
    let spans = normalize(buffer.len(), spans);
    let bytes_removed = spans.iter().map(|s| s.len()).sum();

    let output = match policy {
        RedactionPolicy::Excise => excise(buffer, &spans),
        RedactionPolicy::ZeroFillThenExcise => {
            let mut working = buffer.to_vec();
            for span in &spans {
                working[span.clone()].fill(0);
            }
            excise(&working, &spans)
        }
    };

    debug_assert_eq!(output.len(), buffer.len() - bytes_removed);
    log::debug!(
        "removed {bytes_removed} bytes in {} span(s) ({policy:?})",
        spans.len()
    );
    RedactionResult {
        output,
        bytes_removed,
    }
}

fn excise(buffer: &[u8], spans: &[Range<usize>]) -> Vec<u8> {
    let removed: usize = spans.iter().map(|s| s.len()).sum();
    let mut output = Vec::with_capacity(buffer.len() - removed);
    let mut cursor = 0;
    for span in spans {
        output.extend_from_slice(&buffer[cursor..span.start]);
        cursor = span.end;
    }
    output.extend_from_slice(&buffer[cursor..]);
    output
}

/// Clamp to the buffer, drop empty spans, sort, merge.
fn normalize(len: usize, spans: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut sorted: Vec<Range<usize>> = spans
        .iter()
        .map(|s| s.start.min(len)..s.end.min(len))
        .filter(|s| s.start < s.end)
        .collect();
    sorted.sort_by_key(|s| s.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}
