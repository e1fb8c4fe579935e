use opentelemetry::KeyValue;

use crate::analytics::Page;
use crate::error::ExtractionError;
use crate::table::ReportTable;
use crate::telemetry::metrics::PAGE_EXTRACTION_FAILURES;

use super::naming::ColumnNaming;
use super::pivot::format_pivot;
use super::summary::format_summary;

/// One page turned into a table, plus whatever had to be discarded on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedPage {
    pub table: ReportTable,
    pub summary_error: Option<ExtractionError>,
    pub pivot_error: Option<ExtractionError>,
    pub merge_error: Option<ExtractionError>,
}

impl FormattedPage {
    /// True when part of the page was replaced by an empty table.
    pub fn is_degraded(&self) -> bool {
        self.summary_error.is_some() || self.pivot_error.is_some() || self.merge_error.is_some()
    }
}

/// Formats one page: summary and pivot tables side by side on the shared row
/// index. A table that cannot be extracted is replaced by an empty one and
/// the reason is kept on the result.
pub fn format_report(page: &Page, naming: &ColumnNaming) -> FormattedPage {
    let (summary, summary_error) = recover(format_summary(page, naming), "summary");
    let (pivot, pivot_error) = recover(format_pivot(page, naming), "pivot");

    let (table, merge_error) = merge(summary, pivot);

    FormattedPage {
        table,
        summary_error,
        pivot_error,
        merge_error,
    }
}

fn merge(summary: ReportTable, pivot: ReportTable) -> (ReportTable, Option<ExtractionError>) {
    let (summary_rows, pivot_rows) = (summary.row_count(), pivot.row_count());
    match summary.hconcat(pivot) {
        Ok(table) => (table, None),
        Err(err) => {
            tracing::error!(error = %err, "Summary and pivot tables disagree, dropping page");
            PAGE_EXTRACTION_FAILURES.add(1, &[KeyValue::new("report.table", "merge")]);
            let reason = ExtractionError::RowCountMismatch {
                summary: summary_rows,
                pivot: pivot_rows,
            };
            (ReportTable::empty(), Some(reason))
        }
    }
}

fn recover(
    result: Result<ReportTable, ExtractionError>,
    table: &'static str,
) -> (ReportTable, Option<ExtractionError>) {
    match result {
        Ok(extracted) => (extracted, None),
        Err(err) => {
            tracing::warn!(table, error = %err, "Malformed page, substituting an empty table");
            PAGE_EXTRACTION_FAILURES.add(1, &[KeyValue::new("report.table", table)]);
            (ReportTable::empty(), Some(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Columns, RowIndex};
    use serde_json::json;

    fn page(value: serde_json::Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    fn summary_only_page() -> Page {
        page(json!({
            "columnHeader": {
                "dimensions": ["ga:language"],
                "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions"}]}
            },
            "data": {"rows": [
                {"dimensions": ["en"], "metrics": [{"values": ["10"]}]},
                {"dimensions": ["fr"], "metrics": [{"values": ["5"]}]}
            ]}
        }))
    }

    fn pivot_page() -> Page {
        page(json!({
            "columnHeader": {
                "dimensions": ["ga:language"],
                "metricHeader": {
                    "metricHeaderEntries": [{"name": "ga:sessions"}],
                    "pivotHeaders": [{
                        "pivotHeaderEntries": [
                            {"dimensionNames": ["ga:deviceCategory"], "dimensionValues": ["mobile"], "metric": {"name": "ga:pageviews"}},
                            {"dimensionNames": ["ga:deviceCategory"], "dimensionValues": ["desktop"], "metric": {"name": "ga:pageviews"}}
                        ]
                    }]
                }
            },
            "data": {"rows": [
                {"dimensions": ["en"], "metrics": [{"values": ["10"], "pivotValueRegions": [{"values": ["6", "4"]}]}]},
                {"dimensions": ["fr"], "metrics": [{"values": ["5"], "pivotValueRegions": [{"values": ["1", "2"]}]}]}
            ]}
        }))
    }

    #[test]
    fn test_without_pivot_equals_summary() {
        let page = summary_only_page();
        let formatted = format_report(&page, &ColumnNaming::Suffix);
        let summary = format_summary(&page, &ColumnNaming::Suffix).unwrap();

        assert_eq!(formatted.table, summary);
        assert!(!formatted.is_degraded());
    }

    #[test]
    fn test_pivot_merge_lifts_summary_columns() {
        let formatted = format_report(&pivot_page(), &ColumnNaming::Suffix);

        assert_eq!(
            formatted.table.columns(),
            &Columns::Nested(vec![
                (String::new(), "sessions".to_string()),
                ("mobile".to_string(), "pageviews".to_string()),
                ("desktop".to_string(), "pageviews".to_string()),
            ])
        );
        assert_eq!(
            formatted.table.values(),
            &[vec![10.0, 6.0, 4.0], vec![5.0, 1.0, 2.0]]
        );
    }

    #[test]
    fn test_pivot_groups_match_distinct_values() {
        let formatted = format_report(&pivot_page(), &ColumnNaming::Suffix);
        let columns = formatted.table.columns();

        assert_eq!(columns.depth(), 2);
        // The lifted summary contributes the empty outer label.
        assert_eq!(columns.groups(), vec!["", "mobile", "desktop"]);
    }

    #[test]
    fn test_format_is_idempotent() {
        let page = pivot_page();
        assert_eq!(
            format_report(&page, &ColumnNaming::Suffix),
            format_report(&page, &ColumnNaming::Suffix)
        );
    }

    #[test]
    fn test_broken_summary_keeps_pivot() {
        let page = page(json!({
            "columnHeader": {
                "dimensions": ["ga:language"],
                "metricHeader": {
                    "metricHeaderEntries": [{"name": "ga:sessions"}],
                    "pivotHeaders": [{
                        "pivotHeaderEntries": [
                            {"dimensionValues": ["mobile"], "metric": {"name": "ga:pageviews"}}
                        ]
                    }]
                }
            },
            "data": {"rows": [
                {"dimensions": ["en"], "metrics": [{"values": ["oops"], "pivotValueRegions": [{"values": ["6"]}]}]}
            ]}
        }));

        let formatted = format_report(&page, &ColumnNaming::Suffix);
        assert!(formatted.is_degraded());
        assert!(matches!(
            formatted.summary_error,
            Some(ExtractionError::NotNumeric { .. })
        ));
        assert_eq!(formatted.pivot_error, None);
        assert_eq!(formatted.merge_error, None);
        assert_eq!(
            formatted.table.columns(),
            &Columns::Nested(vec![("mobile".to_string(), "pageviews".to_string())])
        );
    }

    #[test]
    fn test_row_count_disagreement_is_recorded() {
        let summary = ReportTable::from_parts(
            RowIndex::positional(2),
            Columns::Flat(vec!["sessions".to_string()]),
            vec![vec![1.0], vec![2.0]],
        );
        let pivot = ReportTable::from_parts(
            RowIndex::positional(1),
            Columns::Nested(vec![("mobile".to_string(), "pageviews".to_string())]),
            vec![vec![3.0]],
        );

        let (table, reason) = merge(summary, pivot);
        assert!(table.is_empty());
        assert_eq!(
            reason,
            Some(ExtractionError::RowCountMismatch {
                summary: 2,
                pivot: 1
            })
        );
    }

    #[test]
    fn test_empty_rows_keep_header_columns() {
        let page = page(json!({
            "columnHeader": {
                "dimensions": ["ga:language"],
                "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions"}]}
            },
            "data": {"rows": []}
        }));

        let formatted = format_report(&page, &ColumnNaming::Suffix);
        assert_eq!(formatted.table.row_count(), 0);
        assert_eq!(
            formatted.table.columns(),
            &Columns::Flat(vec!["sessions".to_string()])
        );
    }
}
