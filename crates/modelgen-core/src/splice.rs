//! Rendering of the version block and its replacement inside the
//! marker-delimited region of the generated models file.

use anyhow::{Context as _, Result};
use std::path::Path;
use thiserror::Error;

use crate::config::MissingMarkers;
use crate::template::TemplateEngine;
use crate::versions::VersionTable;

pub const VERSIONS_TEMPLATE: &str = "versions.ts.tera";

/// The pair of literal lines bounding the generated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpliceError {
    #[error("marker '{0}' not found")]
    MissingMarker(String),

    #[error("marker '{marker}' appears on lines {lines:?}, expected exactly once")]
    DuplicateMarker { marker: String, lines: Vec<usize> },

    #[error("end marker on line {end_line} comes before start marker on line {start_line}")]
    OutOfOrder { start_line: usize, end_line: usize },

    #[error("{0} marker is empty")]
    EmptyMarker(&'static str),
}

impl<'a> Markers<'a> {
    /// Markers with surrounding whitespace removed. Both must be non-empty.
    pub fn new(start: &'a str, end: &'a str) -> Result<Self, SpliceError> {
        let start = start.trim();
        let end = end.trim();
        if start.is_empty() {
            return Err(SpliceError::EmptyMarker("start"));
        }
        if end.is_empty() {
            return Err(SpliceError::EmptyMarker("end"));
        }
        Ok(Self { start, end })
    }

    fn normalized(self) -> Result<Self, SpliceError> {
        Self::new(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    Replaced,
    Appended,
    Unchanged,
}

#[derive(Debug)]
struct MarkerHit {
    line: usize,
    start: usize,
    end: usize,
}

/// Render the `MODEL_VERSIONS` block, markers included, without a trailing newline.
pub fn render_block(
    engine: &TemplateEngine,
    markers: Markers<'_>,
    versions: &VersionTable,
) -> Result<String> {
    let markers = markers.normalized()?;
    let mut ctx = tera::Context::new();
    ctx.insert("block_start", markers.start);
    ctx.insert("block_end", markers.end);
    ctx.insert("versions", versions);
    let rendered = engine.render(VERSIONS_TEMPLATE, &ctx)?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

/// Every line whose trimmed text is exactly `marker`.
fn find_marker(content: &str, marker: &str) -> Vec<MarkerHit> {
    let mut hits = Vec::new();
    let mut offset = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        let from_text = line.trim_start();
        if from_text.trim_end() == marker {
            let start = offset + (line.len() - from_text.len());
            hits.push(MarkerHit {
                line: index + 1,
                start,
                end: start + marker.len(),
            });
        }
        offset += line.len();
    }
    hits
}

fn unique_marker(content: &str, marker: &str) -> Result<Option<MarkerHit>, SpliceError> {
    let mut hits = find_marker(content, marker);
    if hits.len() > 1 {
        return Err(SpliceError::DuplicateMarker {
            marker: marker.to_string(),
            lines: hits.iter().map(|h| h.line).collect(),
        });
    }
    Ok(hits.pop())
}

fn append_block(content: &str, block: &str) -> String {
    let mut out = String::with_capacity(content.len() + block.len() + 2);
    out.push_str(content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(block);
    out.push('\n');
    out
}

/// Replace the region from the start marker through the end marker
/// (inclusive) with `block`. Text outside the region is kept byte for byte.
///
/// Both markers must occur exactly once, start before end. When neither is
/// present the block is appended or an error returned, per `on_missing`.
pub fn splice(
    content: &str,
    markers: Markers<'_>,
    block: &str,
    on_missing: MissingMarkers,
) -> Result<(String, SpliceOutcome), SpliceError> {
    let Markers {
        start: start_marker,
        end: end_marker,
    } = markers.normalized()?;

    let start = unique_marker(content, start_marker)?;
    let end = unique_marker(content, end_marker)?;

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) if on_missing == MissingMarkers::Append => {
            return Ok((append_block(content, block), SpliceOutcome::Appended));
        }
        (None, _) => return Err(SpliceError::MissingMarker(start_marker.to_string())),
        (Some(_), None) => return Err(SpliceError::MissingMarker(end_marker.to_string())),
    };

    if end.line <= start.line {
        return Err(SpliceError::OutOfOrder {
            start_line: start.line,
            end_line: end.line,
        });
    }

    let mut spliced =
        String::with_capacity(content.len() - (end.end - start.start) + block.len());
    spliced.push_str(&content[..start.start]);
    spliced.push_str(block);
    spliced.push_str(&content[end.end..]);

    let outcome = if spliced == content {
        SpliceOutcome::Unchanged
    } else {
        SpliceOutcome::Replaced
    };
    Ok((spliced, outcome))
}

/// Splice `block` into the file at `path`, writing it back when it changed.
pub fn splice_file(
    path: &Path,
    markers: Markers<'_>,
    block: &str,
    on_missing: MissingMarkers,
) -> Result<SpliceOutcome> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (spliced, outcome) = splice(&content, markers, block, on_missing)
        .with_context(|| format!("Cannot update version block in {}", path.display()))?;
    if outcome != SpliceOutcome::Unchanged {
        crate::utils::write_file(path, &spliced)?;
    }
    Ok(outcome)
}
