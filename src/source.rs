//! Extraction of the source lines backing a graph node.

use crate::db::Db;
use crate::error::{QueryError, QueryResult, UnavailableSource};
use crate::model::{NodeMeta, SourceSlice, is_external_id};
use crate::util::split_lines;

/// 1-based inclusive line range after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start_line: i64,
    pub end_line: i64,
}

/// Apply the defaulting policy for missing line metadata.
///
/// | `line`  | `end_line` | start | end            |
/// |---------|------------|-------|----------------|
/// | `l`     | `e`        | `l`   | `e`            |
/// | `l`     | absent     | `l`   | `l`            |
/// | absent  | `e`        | 1     | `e`            |
/// | absent  | absent     | 1     | last line      |
pub fn resolve_line_range(line: Option<i64>, end_line: Option<i64>, line_count: usize) -> LineRange {
    let (start_line, end_line) = match (line, end_line) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start),
        (None, Some(end)) => (1, end),
        (None, None) => (1, line_count as i64),
    };
    LineRange {
        start_line,
        end_line,
    }
}

/// Join the lines covered by `range`.
///
/// No clamping is done beyond keeping indexes inside the buffer: a range that
/// starts past the end of the file, or ends before it starts, yields an empty
/// string rather than an error. Malformed analysis data therefore shows up as
/// an empty snippet.
pub fn slice_range(lines: &[&str], range: LineRange) -> String {
    let start = range.start_line.saturating_sub(1).max(0) as usize;
    let end = range.end_line.max(0) as usize;
    let end = end.min(lines.len());
    if start >= end {
        return String::new();
    }
    lines[start..end].join("\n")
}

/// Slice `content` for a node's stored `line`/`end_line`.
pub fn slice_source(content: &str, line: Option<i64>, end_line: Option<i64>) -> (LineRange, String) {
    let lines = split_lines(content);
    let range = resolve_line_range(line, end_line, lines.len());
    let code = slice_range(&lines, range);
    (range, code)
}

/// Return the source lines for a validated node id.
pub fn get_source(db: &Db, id: &str) -> QueryResult<SourceSlice> {
    if is_external_id(id) {
        let meta = db
            .get_node(id)?
            .map(|node| NodeMeta {
                name: node.name,
                package: node.package,
                type_info: node.type_info,
            })
            .unwrap_or_default();
        return Err(UnavailableSource::External(meta).into());
    }

    let node = db.get_node(id)?.ok_or_else(|| QueryError::NotFound {
        id: id.to_string(),
    })?;
    let file = match node.file.filter(|file| !file.is_empty()) {
        Some(file) => file,
        None => {
            return Err(UnavailableSource::NoFileMetadata {
                name: node.name,
                package: node.package,
            }
            .into());
        }
    };
    let source = db
        .get_source_file(&file)?
        .ok_or(UnavailableSource::FileMissing { file })?;

    let (range, code) = slice_source(&source.content, node.line, node.end_line);
    Ok(SourceSlice {
        file_name: source.file,
        start_line: range.start_line,
        end_line: range.end_line,
        code,
    })
}
