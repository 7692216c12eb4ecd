//! Output projection and CSV writing for the clean and ambiguous tables.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::error::ExportError;
use crate::matching::{MatchOutcome, ScoredCandidate};
use crate::models::{InputTable, Table};
use crate::pairs::{self, JoinPair};

/// The shared column shape of both outputs: input join columns, prefixed
/// reference join columns, requested extra reference fields, optional score.
#[derive(Debug, Clone)]
pub struct Projection {
    input_columns: Vec<String>,
    ref_columns: Vec<String>,
    ref_column_indices: Vec<usize>,
    add_fields: Vec<String>,
    add_field_indices: Vec<usize>,
    show_score: bool,
}

impl Projection {
    pub fn new(
        join_pairs: &[JoinPair],
        add_fields: &[String],
        show_score: bool,
        reference: &Table,
    ) -> Result<Self, ExportError> {
        let input_columns = pairs::input_columns(join_pairs);
        let ref_columns = pairs::reference_columns(join_pairs);
        let ref_column_indices = ref_columns
            .iter()
            .map(|c| {
                reference
                    .column_index(c)
                    .ok_or_else(|| ExportError::ColumnReference { column: c.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let add_field_indices = add_fields
            .iter()
            .map(|f| {
                reference
                    .column_index(f)
                    .ok_or_else(|| ExportError::ColumnReference { column: f.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            input_columns,
            ref_columns,
            ref_column_indices,
            add_fields: add_fields.to_vec(),
            add_field_indices,
            show_score,
        })
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.input_columns.clone();
        for col in &self.ref_columns {
            headers.push(format!("ref_{col}"));
        }
        headers.extend(self.add_fields.iter().cloned());
        if self.show_score {
            headers.push("avg_score".to_string());
        }
        headers
    }

    /// One output row: the input record's join values plus the candidate's
    /// reference values, or empty reference fields without a candidate.
    fn row(
        &self,
        input_values: &[String],
        reference: &Table,
        candidate: Option<&ScoredCandidate>,
    ) -> Vec<String> {
        let mut row: Vec<String> = input_values.to_vec();
        for &col in &self.ref_column_indices {
            row.push(match candidate {
                Some(c) => reference.value(c.ref_index, col).to_string(),
                None => String::new(),
            });
        }
        for &col in &self.add_field_indices {
            row.push(match candidate {
                Some(c) => reference.value(c.ref_index, col).to_string(),
                None => String::new(),
            });
        }
        if self.show_score {
            row.push(match candidate {
                Some(c) => format!("{:.2}", c.avg_score),
                None => String::new(),
            });
        }
        row
    }
}

/// Write the clean table: exactly one row per input record. Unmatched rows
/// carry empty reference fields; ambiguous rows carry their deterministic
/// representative.
pub fn write_clean(
    path: &str,
    projection: &Projection,
    input: &InputTable,
    reference: &Table,
    outcomes: &[MatchOutcome],
) -> Result<(), ExportError> {
    let mut rows = Vec::with_capacity(input.records.len());
    for (record, outcome) in input.records.iter().zip(outcomes) {
        rows.push(projection.row(&record.values, reference, outcome.representative()));
    }
    write_table(path, &projection.headers(), &rows)
}

/// Write the ambiguous table: one row per tied rank-1 candidate of every
/// ambiguous input record. No file is created when there are no ambiguous
/// rows; returns whether a file was written.
pub fn write_ambiguous(
    path: &str,
    projection: &Projection,
    input: &InputTable,
    reference: &Table,
    outcomes: &[MatchOutcome],
) -> Result<bool, ExportError> {
    let mut rows = Vec::new();
    for (record, outcome) in input.records.iter().zip(outcomes) {
        if let MatchOutcome::Ambiguous(tied) = outcome {
            for candidate in tied {
                rows.push(projection.row(&record.values, reference, Some(candidate)));
            }
        }
    }
    if rows.is_empty() {
        return Ok(false);
    }
    write_table(path, &projection.headers(), &rows)?;
    Ok(true)
}

/// Write header + rows to a `.tmp` sibling and rename it into place, so the
/// target path never holds a partially written file.
fn write_table(path: &str, headers: &[String], rows: &[Vec<String>]) -> Result<(), ExportError> {
    let tmp_path = tmp_sibling(path);
    let file = File::create(&tmp_path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    let mut writer = WriterBuilder::new().from_writer(buf_writer);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    drop(writer);
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

fn tmp_sibling(path: &str) -> PathBuf {
    let mut name = Path::new(path)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    Path::new(path).with_file_name(name)
}
