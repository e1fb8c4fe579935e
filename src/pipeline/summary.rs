use crate::analytics::Page;
use crate::error::ExtractionError;
use crate::table::{Columns, ReportTable};

use super::naming::ColumnNaming;
use super::rows::{build_row_index, coerce_row};

/// Extracts the un-pivoted metrics of a page: one column per metric header
/// entry, one row per data row, values from each row's first value group.
pub fn format_summary(page: &Page, naming: &ColumnNaming) -> Result<ReportTable, ExtractionError> {
    let entries = page
        .metric_header()
        .and_then(|header| header.metric_header_entries.as_ref())
        .ok_or(ExtractionError::MissingField(
            "columnHeader.metricHeader.metricHeaderEntries",
        ))?;

    let columns: Vec<String> = entries
        .iter()
        .map(|entry| naming.resolve(&entry.name))
        .collect();

    let values = page
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let raw = row
                .metrics
                .as_ref()
                .and_then(|groups| groups.first())
                .and_then(|group| group.values.as_ref())
                .ok_or(ExtractionError::MissingField("data.rows[].metrics[0].values"))?;
            coerce_row(i, raw, columns.len())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReportTable::from_parts(
        build_row_index(page),
        Columns::Flat(columns),
        values,
    ))
}
