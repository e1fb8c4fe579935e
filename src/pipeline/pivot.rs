use crate::analytics::Page;
use crate::error::ExtractionError;
use crate::table::{Columns, ReportTable};

use super::naming::ColumnNaming;
use super::rows::{build_row_index, coerce_row};

/// Separator for pivots over more than one dimension, where an entry carries
/// several dimension values.
const PIVOT_VALUE_SEPARATOR: &str = ", ";

/// Extracts the pivoted metrics of a page as (pivot value, metric) columns.
///
/// Only the first pivot header group is read, paired with each row's first
/// pivot value region. A page without pivot headers gives an empty table.
pub fn format_pivot(page: &Page, naming: &ColumnNaming) -> Result<ReportTable, ExtractionError> {
    let Some(group) = page
        .metric_header()
        .and_then(|header| header.pivot_headers.as_ref())
        .and_then(|groups| groups.first())
    else {
        return Ok(ReportTable::empty());
    };

    let entries = group
        .pivot_header_entries
        .as_ref()
        .ok_or(ExtractionError::MissingField(
            "columnHeader.metricHeader.pivotHeaders[0].pivotHeaderEntries",
        ))?;
    if entries.is_empty() {
        return Ok(ReportTable::empty());
    }

    let columns = entries
        .iter()
        .map(|entry| {
            let metric = entry.metric.as_ref().ok_or(ExtractionError::MissingField(
                "columnHeader.metricHeader.pivotHeaders[0].pivotHeaderEntries[].metric",
            ))?;
            Ok((
                entry.dimension_values.join(PIVOT_VALUE_SEPARATOR),
                naming.resolve(&metric.name),
            ))
        })
        .collect::<Result<Vec<_>, ExtractionError>>()?;

    let values = page
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let raw = row
                .metrics
                .as_ref()
                .and_then(|groups| groups.first())
                .and_then(|group| group.pivot_value_regions.as_ref())
                .and_then(|regions| regions.first())
                .and_then(|region| region.values.as_ref())
                .ok_or(ExtractionError::MissingField(
                    "data.rows[].metrics[0].pivotValueRegions[0].values",
                ))?;
            coerce_row(i, raw, columns.len())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReportTable::from_parts(
        build_row_index(page),
        Columns::Nested(columns),
        values,
    ))
}
