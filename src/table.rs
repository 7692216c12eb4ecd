//! Delimited table loading.
//!
//! Header detection and row parsing go through the same delimiter sniff and
//! the same `csv::ReaderBuilder` configuration, so the header a caller sees
//! is always the header the loader parsed.

use std::fs::File;
use std::io::{BufRead, BufReader};

use csv::ReaderBuilder;

use crate::error::TableError;
use crate::models::Table;

/// Sniff candidates, in tie-break priority order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

fn open(path: &str) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::FileAccess {
        path: path.to_string(),
        source,
    })
}

/// Pick the candidate delimiter with the most occurrences in the first line.
/// Comma wins ties. The first line must be non-empty.
pub fn sniff_delimiter(path: &str) -> Result<u8, TableError> {
    let file = open(path)?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|source| TableError::FileAccess {
            path: path.to_string(),
            source,
        })?;
    if first_line.trim().is_empty() {
        return Err(TableError::HeaderParse {
            path: path.to_string(),
        });
    }
    let mut best = b',';
    let mut best_count = 0usize;
    for &delim in &DELIMITERS {
        let count = first_line.bytes().filter(|&b| b == delim).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }
    Ok(best)
}

fn reader_for(path: &str, delimiter: u8) -> Result<csv::Reader<File>, TableError> {
    let file = open(path)?;
    Ok(ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file))
}

/// Ordered column names from the file's first row.
pub fn read_header(path: &str) -> Result<Vec<String>, TableError> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = reader_for(path, delimiter)?;
    let headers = reader.headers().map_err(|source| TableError::Parse {
        path: path.to_string(),
        source,
    })?;
    let names: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(TableError::HeaderParse {
            path: path.to_string(),
        });
    }
    Ok(names)
}

/// Load a whole table into memory. Short rows are padded to the header width.
pub fn load_table(path: &str) -> Result<Table, TableError> {
    let headers = read_header(path)?;
    let delimiter = sniff_delimiter(path)?;
    let mut reader = reader_for(path, delimiter)?;
    let width = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| TableError::Parse {
            path: path.to_string(),
            source,
        })?;
        let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
        row.resize(width, String::new());
        rows.push(row);
    }
    Ok(Table::new(headers, rows))
}
