use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dimensions, metrics and date range of one report query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpecification {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// --- Request body ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportsRequest {
    pub report_requests: Vec<ReportRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,
    pub date_ranges: Vec<DateRange>,
    pub metrics: Vec<MetricExpression>,
    pub dimensions: Vec<DimensionName>,
    pub page_size: u32,
    pub page_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricExpression {
    pub expression: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionName {
    pub name: String,
}

impl GetReportsRequest {
    pub fn for_page(
        spec: &ReportSpecification,
        view_id: &str,
        page_size: u32,
        page_token: &str,
    ) -> Self {
        Self {
            report_requests: vec![ReportRequest {
                view_id: view_id.to_string(),
                date_ranges: vec![spec.date_range],
                metrics: spec
                    .metrics
                    .iter()
                    .map(|m| MetricExpression {
                        expression: m.clone(),
                    })
                    .collect(),
                dimensions: spec
                    .dimensions
                    .iter()
                    .map(|d| DimensionName { name: d.clone() })
                    .collect(),
                page_size,
                page_token: page_token.to_string(),
            }],
        }
    }
}

// --- Response body ---
//
// Every structural field is optional: a response with a broken shape must
// still decode so the formatter can report exactly what is missing.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetReportsResponse {
    #[serde(default)]
    pub reports: Vec<Page>,
}

/// One report object of a `batchGet` response, i.e. one page of results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub column_header: Option<ColumnHeader>,
    pub data: Option<ReportData>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    pub dimensions: Option<Vec<String>>,
    pub metric_header: Option<MetricHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    pub metric_header_entries: Option<Vec<MetricHeaderEntry>>,
    pub pivot_headers: Option<Vec<PivotHeader>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricHeaderEntry {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotHeader {
    pub pivot_header_entries: Option<Vec<PivotHeaderEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotHeaderEntry {
    #[serde(default)]
    pub dimension_values: Vec<String>,
    pub metric: Option<MetricHeaderEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub rows: Option<Vec<ReportRow>>,
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportRow {
    pub dimensions: Option<Vec<String>>,
    pub metrics: Option<Vec<DateRangeValues>>,
}

/// Metric values of one row for one date range. Values stay raw JSON so a
/// non-numeric cell surfaces as an extraction error rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeValues {
    pub values: Option<Vec<Value>>,
    pub pivot_value_regions: Option<Vec<PivotValueRegion>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PivotValueRegion {
    pub values: Option<Vec<Value>>,
}

impl Page {
    /// The continuation token, if the backend reported more pages.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Total rows of the report across all pages, as announced by the backend.
    pub fn total_rows(&self) -> Option<u64> {
        self.data.as_ref().and_then(|d| d.row_count)
    }

    pub fn rows(&self) -> &[ReportRow] {
        self.data
            .as_ref()
            .and_then(|d| d.rows.as_deref())
            .unwrap_or(&[])
    }

    pub fn metric_header(&self) -> Option<&MetricHeader> {
        self.column_header
            .as_ref()
            .and_then(|h| h.metric_header.as_ref())
    }

    pub fn dimension_headers(&self) -> Option<&[String]> {
        self.column_header
            .as_ref()
            .and_then(|h| h.dimensions.as_deref())
    }
}
