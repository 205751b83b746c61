//! Catalog preparation: raw anime CSV in, normalized JSON Lines out.
//!
//! The raw file is a quoted CSV whose synopses freely contain commas,
//! newlines, and doubled-quote escapes. Preparation validates the required
//! columns, drops incomplete rows, folds each surviving row into one
//! `combined_text`, and writes the normalized artifact the index build
//! consumes.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::RecError;
use crate::types::NormalizedItem;

/// Columns the raw catalog must provide, matched by exact name.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "Genres", "Synopsis"];

/// Prepare the raw catalog at `raw_path` into a normalized JSON Lines file
/// at `output_path`, overwriting any previous artifact. Returns the output
/// path on success.
///
/// Every failure surfaces as `DataPreparation`; the underlying kind
/// (`Schema`, `NotFound`, IO) stays reachable through [`RecError::root`].
pub fn prepare(raw_path: &Path, output_path: &Path) -> Result<PathBuf, RecError> {
    prepare_inner(raw_path, output_path)
        .map_err(|e| RecError::data_prep(format!("preparing {}", raw_path.display()), e))
}

fn prepare_inner(raw_path: &Path, output_path: &Path) -> Result<PathBuf, RecError> {
    if !raw_path.exists() {
        return Err(RecError::NotFound(format!(
            "catalog file {}",
            raw_path.display()
        )));
    }

    tracing::info!(path = %raw_path.display(), "Loading raw catalog");

    let raw = fs::read_to_string(raw_path)?;
    let mut records = parse_csv(&raw);
    if records.is_empty() {
        return Err(RecError::Schema("catalog has no header row".into()));
    }
    let header = records.remove(0);

    let mut missing = Vec::new();
    let mut indices = [0usize; REQUIRED_COLUMNS.len()];
    for (i, col) in REQUIRED_COLUMNS.iter().enumerate() {
        match header.iter().position(|h| h == col) {
            Some(idx) => indices[i] = idx,
            None => missing.push(*col),
        }
    }
    if !missing.is_empty() {
        return Err(RecError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let width = header.len();
    let mut items = Vec::new();
    let mut dropped = 0usize;
    for record in &records {
        // Rows with a malformed shape or any blank field are dropped whole,
        // never patched up.
        if record.len() != width || record.iter().any(|f| f.trim().is_empty()) {
            dropped += 1;
            continue;
        }
        let name = &record[indices[0]];
        let genres = &record[indices[1]];
        let synopsis = &record[indices[2]];
        items.push(NormalizedItem {
            combined_text: format!("Title: {name}\nGenres: {genres}\nOverview: {synopsis}"),
        });
    }

    tracing::info!(
        rows = records.len(),
        kept = items.len(),
        dropped,
        "Catalog rows validated"
    );

    let file = fs::File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    for item in &items {
        let line =
            serde_json::to_string(item).map_err(|e| RecError::Serialization(e.to_string()))?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;

    tracing::info!(path = %output_path.display(), items = items.len(), "Normalized catalog written");

    Ok(output_path.to_path_buf())
}

/// Load a normalized catalog written by [`prepare`], in file order.
pub fn load_normalized(path: &Path) -> Result<Vec<NormalizedItem>, RecError> {
    if !path.exists() {
        return Err(RecError::NotFound(format!(
            "normalized catalog {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)?;
    let mut items = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item: NormalizedItem = serde_json::from_str(line).map_err(|e| {
            RecError::Corruption(format!("normalized catalog line {}: {}", lineno + 1, e))
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Minimal RFC-4180-style CSV reader: quoted fields, doubled-quote escapes,
/// and commas or newlines inside quotes. CRLF and LF endings both accepted;
/// blank lines are skipped. Returns one record per row, header included.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {} // CRLF: the LF closes the record
            '\n' => {
                record.push(std::mem::take(&mut field));
                if record.len() == 1 && record[0].is_empty() {
                    record.clear();
                } else {
                    records.push(std::mem::take(&mut record));
                }
            }
            _ => field.push(c),
        }
    }

    // Final record when the file lacks a trailing newline.
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
