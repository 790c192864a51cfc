use std::path::Path;

use anyhow::{bail, Context, Result};
use log::debug;

use super::model::{Dataset, Record};

/// Columns every student table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Gender",
    "EthnicGroup",
    "ParentEduc",
    "ParentMaritalStatus",
    "LunchType",
    "PracticeSport",
    "WklyStudyHours",
    "MathScore",
    "ReadingScore",
    "WritingScore",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the student table from a CSV file.
///
/// Layout: header row with column names, one student per row. A leading
/// index column written by `DataFrame.to_csv()` (empty header, or
/// `Unnamed: N` once round-tripped through pandas) is dropped.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    // (source index, column name) for every column we keep
    let kept: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_index_artifact(h))
        .map(|(i, h)| (i, h.clone()))
        .collect();

    if kept.len() != headers.len() {
        debug!("dropping {} index column(s)", headers.len() - kept.len());
    }

    for required in REQUIRED_COLUMNS {
        if !kept.iter().any(|(_, h)| h == required) {
            bail!("CSV missing '{required}' column");
        }
    }

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        // The reader is not flexible: a ragged row surfaces as an error here.
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let record: Record = kept
            .iter()
            .map(|(i, name)| (name.clone(), row.get(*i).unwrap_or("").to_string()))
            .collect();
        records.push(record);
    }

    let column_names = kept.into_iter().map(|(_, h)| h).collect();
    Ok(Dataset::new(column_names, records))
}

fn is_index_artifact(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed:")
}
