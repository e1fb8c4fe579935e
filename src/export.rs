//! CSV persistence for report tables.
//!
//! Layout: row index labels in the leading column(s), then one column per
//! table column. Flat columns get a single header row; nested columns get two
//! (pivot value, then metric), with the index names on the last header row.
//! `NaN` cells are written empty.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::table::{Columns, ReportTable, RowIndex};

/// Shape of a CSV file's header and index region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvLayout {
    pub header_rows: usize,
    pub index_columns: usize,
}

impl CsvLayout {
    pub fn of(table: &ReportTable) -> Self {
        Self {
            header_rows: table.columns().depth(),
            index_columns: table.index().names().len(),
        }
    }
}

pub fn write_csv<W: Write>(table: &ReportTable, writer: W) -> AppResult<()> {
    let mut csv = csv::WriterBuilder::new().from_writer(writer);

    let index_names = table.index().names();
    let header_rows = table.columns().header_rows();
    let last = header_rows.len() - 1;

    for (level, labels) in header_rows.into_iter().enumerate() {
        let mut record = if level == last {
            index_names.clone()
        } else {
            vec![String::new(); index_names.len()]
        };
        record.extend(labels);
        csv.write_record(&record)?;
    }

    for (row, values) in table.values().iter().enumerate() {
        let mut record = table.index().labels(row);
        record.extend(values.iter().map(|v| format_value(*v)));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes `table` to `path`, creating parent directories as needed.
pub fn write_csv_file(table: &ReportTable, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_csv(table, File::create(path)?)
}

pub fn read_csv<R: Read>(reader: R, layout: CsvLayout) -> AppResult<ReportTable> {
    if !(1..=2).contains(&layout.header_rows) || layout.index_columns == 0 {
        return Err(AppError::Pipeline(format!(
            "unsupported CSV layout: {} header rows, {} index columns",
            layout.header_rows, layout.index_columns
        )));
    }

    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let records = csv
        .records()
        .collect::<Result<Vec<csv::StringRecord>, _>>()?;

    if records.len() < layout.header_rows {
        return Err(AppError::Pipeline(format!(
            "CSV has {} rows, expected at least {} header rows",
            records.len(),
            layout.header_rows
        )));
    }
    let (headers, body) = records.split_at(layout.header_rows);
    let width = layout.index_columns;

    let tail = |record: &csv::StringRecord| -> Vec<String> {
        record.iter().skip(width).map(str::to_string).collect()
    };
    let last_header = &headers[headers.len() - 1];
    let columns = if layout.header_rows == 1 {
        Columns::Flat(tail(last_header))
    } else {
        Columns::Nested(tail(&headers[0]).into_iter().zip(tail(last_header)).collect())
    };
    let names: Vec<String> = last_header.iter().take(width).map(str::to_string).collect();

    let mut keys = Vec::with_capacity(body.len());
    let mut values = Vec::with_capacity(body.len());
    for (row, record) in body.iter().enumerate() {
        if record.len() != width + columns.len() {
            return Err(AppError::Pipeline(format!(
                "CSV row {row} has {} fields, expected {}",
                record.len(),
                width + columns.len()
            )));
        }
        keys.push(record.iter().take(width).map(str::to_string).collect::<Vec<_>>());
        values.push(
            record
                .iter()
                .skip(width)
                .map(|cell| parse_value(row, cell))
                .collect::<AppResult<Vec<f64>>>()?,
        );
    }

    Ok(ReportTable::from_parts(
        restore_index(names, keys),
        columns,
        values,
    ))
}

/// A single unnamed index column of integers is a positional index.
fn restore_index(names: Vec<String>, keys: Vec<Vec<String>>) -> RowIndex {
    if names.len() == 1 && names[0].is_empty() {
        let positions = keys
            .iter()
            .map(|key| key[0].parse::<usize>().ok())
            .collect::<Option<Vec<_>>>();
        if let Some(positions) = positions {
            return RowIndex::Positional(positions);
        }
    }
    RowIndex::Labeled { names, keys }
}

/// Plain decimal notation, never exponent form; whole numbers have no
/// fractional part.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_value(row: usize, cell: &str) -> AppResult<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse()
        .map_err(|_| AppError::Pipeline(format!("CSV row {row}: value {cell:?} is not numeric")))
}
