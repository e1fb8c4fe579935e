use serde_json::Value;

use crate::analytics::Page;
use crate::error::ExtractionError;
use crate::table::RowIndex;

use super::naming::strip_prefix;

/// Builds the row index shared by the summary and pivot tables of a page.
///
/// Any problem with the dimension data (no dimension headers, a row without
/// dimensions, a tuple of the wrong width) yields a positional index instead
/// of failing.
pub fn build_row_index(page: &Page) -> RowIndex {
    labeled_index(page).unwrap_or_else(|| RowIndex::positional(page.rows().len()))
}

fn labeled_index(page: &Page) -> Option<RowIndex> {
    let names: Vec<String> = page
        .dimension_headers()?
        .iter()
        .map(|name| strip_prefix(name).to_string())
        .collect();
    if names.is_empty() {
        return None;
    }

    let keys = page
        .rows()
        .iter()
        .map(|row| {
            let dimensions = row.dimensions.as_ref()?;
            (dimensions.len() == names.len()).then(|| dimensions.clone())
        })
        .collect::<Option<Vec<_>>>()?;

    Some(RowIndex::Labeled { names, keys })
}

/// Coerces one row of raw metric values to floats.
pub fn coerce_row(row: usize, values: &[Value], expected: usize) -> Result<Vec<f64>, ExtractionError> {
    if values.len() != expected {
        return Err(ExtractionError::RowShape {
            row,
            expected,
            found: values.len(),
        });
    }

    values
        .iter()
        .enumerate()
        .map(|(column, value)| {
            coerce(value).ok_or_else(|| ExtractionError::NotNumeric {
                row,
                column,
                value: value.to_string(),
            })
        })
        .collect()
}

fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: serde_json::Value) -> Page {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_composite_row_keys() {
        let page = page(json!({
            "columnHeader": {"dimensions": ["ga:yearMonth", "ga:language"]},
            "data": {"rows": [
                {"dimensions": ["202001", "en"]},
                {"dimensions": ["202001", "fr"]}
            ]}
        }));

        assert_eq!(
            build_row_index(&page),
            RowIndex::Labeled {
                names: vec!["yearMonth".to_string(), "language".to_string()],
                keys: vec![
                    vec!["202001".to_string(), "en".to_string()],
                    vec!["202001".to_string(), "fr".to_string()],
                ],
            }
        );
    }

    #[test]
    fn test_missing_dimension_headers_gives_positional_index() {
        let page = page(json!({
            "columnHeader": {},
            "data": {"rows": [{"metrics": []}, {"metrics": []}]}
        }));
        assert_eq!(build_row_index(&page), RowIndex::Positional(vec![0, 1]));
    }

    #[test]
    fn test_ragged_dimension_tuple_gives_positional_index() {
        let page = page(json!({
            "columnHeader": {"dimensions": ["ga:language", "ga:country"]},
            "data": {"rows": [
                {"dimensions": ["en", "US"]},
                {"dimensions": ["fr"]}
            ]}
        }));
        assert_eq!(build_row_index(&page), RowIndex::Positional(vec![0, 1]));
    }

    #[test]
    fn test_coerce_row_accepts_strings_and_numbers() {
        let values = vec![json!("10"), json!(2.5), json!(" 3 ")];
        assert_eq!(coerce_row(0, &values, 3).unwrap(), vec![10.0, 2.5, 3.0]);
    }

    #[test]
    fn test_coerce_row_rejects_text() {
        let values = vec![json!("10"), json!("n/a")];
        assert_eq!(
            coerce_row(4, &values, 2),
            Err(ExtractionError::NotNumeric {
                row: 4,
                column: 1,
                value: "\"n/a\"".to_string(),
            })
        );
    }

    #[test]
    fn test_coerce_row_rejects_wrong_width() {
        let values = vec![json!("10")];
        assert_eq!(
            coerce_row(0, &values, 2),
            Err(ExtractionError::RowShape {
                row: 0,
                expected: 2,
                found: 1,
            })
        );
    }
}
