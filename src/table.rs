//! In-memory report tables.
//!
//! A [`ReportTable`] is a dense grid of `f64` cells labeled by a row index
//! (dimension value tuples, or plain positions) and a one- or two-level
//! column index.

use crate::error::{AppError, AppResult};

/// Row labels of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// One key tuple per row, one element per named dimension.
    Labeled {
        names: Vec<String>,
        keys: Vec<Vec<String>>,
    },
    /// Unlabeled rows, numbered from zero within the page they came from.
    Positional(Vec<usize>),
}

impl RowIndex {
    pub fn positional(len: usize) -> Self {
        RowIndex::Positional((0..len).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            RowIndex::Labeled { keys, .. } => keys.len(),
            RowIndex::Positional(positions) => positions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the index levels; a positional index has a single unnamed level.
    pub fn names(&self) -> Vec<String> {
        match self {
            RowIndex::Labeled { names, .. } => names.clone(),
            RowIndex::Positional(_) => vec![String::new()],
        }
    }

    pub fn labels(&self, row: usize) -> Vec<String> {
        match self {
            RowIndex::Labeled { keys, .. } => keys[row].clone(),
            RowIndex::Positional(positions) => vec![positions[row].to_string()],
        }
    }

    /// Appends `other` below `self`, or `None` when the two schemes differ.
    fn concat(self, other: RowIndex) -> Option<RowIndex> {
        match (self, other) {
            (
                RowIndex::Labeled {
                    names,
                    keys: mut head,
                },
                RowIndex::Labeled {
                    names: other_names,
                    keys: tail,
                },
            ) if names == other_names => {
                head.extend(tail);
                Some(RowIndex::Labeled { names, keys: head })
            }
            (RowIndex::Positional(mut head), RowIndex::Positional(tail)) => {
                head.extend(tail);
                Some(RowIndex::Positional(head))
            }
            _ => None,
        }
    }
}

/// Column labels of a table: plain metric names, or (pivot value, metric) pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    Flat(Vec<String>),
    Nested(Vec<(String, String)>),
}

impl Columns {
    pub fn len(&self) -> usize {
        match self {
            Columns::Flat(labels) => labels.len(),
            Columns::Nested(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of header levels.
    pub fn depth(&self) -> usize {
        match self {
            Columns::Flat(_) => 1,
            Columns::Nested(_) => 2,
        }
    }

    /// Promotes flat labels to two levels with an empty outer label.
    pub fn lifted(self) -> Columns {
        match self {
            Columns::Flat(labels) => Columns::Nested(
                labels
                    .into_iter()
                    .map(|metric| (String::new(), metric))
                    .collect(),
            ),
            nested => nested,
        }
    }

    /// Distinct outer labels in first-seen order; empty for flat columns.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        if let Columns::Nested(labels) = self {
            for (group, _) in labels {
                if !groups.contains(&group.as_str()) {
                    groups.push(group.as_str());
                }
            }
        }
        groups
    }

    /// One row of labels per header level, outermost first.
    pub fn header_rows(&self) -> Vec<Vec<String>> {
        match self {
            Columns::Flat(labels) => vec![labels.clone()],
            Columns::Nested(labels) => vec![
                labels.iter().map(|(group, _)| group.clone()).collect(),
                labels.iter().map(|(_, metric)| metric.clone()).collect(),
            ],
        }
    }
}

/// How row labels behave when pages are stacked into one report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowIndexMode {
    /// Keep each page's labels as they are.
    #[default]
    Preserve,
    /// Replace the stacked index with positions `0..n`.
    Reset,
}

impl std::str::FromStr for RowIndexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(RowIndexMode::Preserve),
            "reset" => Ok(RowIndexMode::Reset),
            other => Err(format!("unknown row index mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    index: RowIndex,
    columns: Columns,
    values: Vec<Vec<f64>>,
}

impl ReportTable {
    /// Builds a table from parts whose shapes already agree: one value row per
    /// index entry, one value per column.
    pub fn from_parts(index: RowIndex, columns: Columns, values: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        debug_assert!(values.iter().all(|row| row.len() == columns.len()));
        Self {
            index,
            columns,
            values,
        }
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::from_parts(RowIndex::positional(0), Columns::Flat(Vec::new()), Vec::new())
    }

    /// True when the table has neither rows nor columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.columns.is_empty()
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Places `other`'s columns to the right of this table's columns.
    ///
    /// Both tables must describe the same rows; the row index of `self` is
    /// kept. Flat columns are lifted when the other side is nested.
    pub fn hconcat(self, other: ReportTable) -> AppResult<ReportTable> {
        if other.is_empty() {
            return Ok(self);
        }
        if self.is_empty() {
            return Ok(other);
        }
        if self.row_count() != other.row_count() {
            return Err(AppError::Pipeline(format!(
                "cannot join tables side by side: {} rows vs {} rows",
                self.row_count(),
                other.row_count()
            )));
        }

        let (left, right) = align_depth(self.columns, other.columns);
        let columns = match (left, right) {
            (Columns::Flat(mut a), Columns::Flat(b)) => {
                a.extend(b);
                Columns::Flat(a)
            }
            (Columns::Nested(mut a), Columns::Nested(b)) => {
                a.extend(b);
                Columns::Nested(a)
            }
            _ => unreachable!("align_depth returns equal depths"),
        };

        let values = self
            .values
            .into_iter()
            .zip(other.values)
            .map(|(mut row, tail)| {
                row.extend(tail);
                row
            })
            .collect();

        Ok(ReportTable::from_parts(self.index, columns, values))
    }

    /// Stacks `other` below this table.
    ///
    /// Columns are the union of both sides in first-seen order; cells a side
    /// does not have are `NaN`.
    pub fn append_rows(self, other: ReportTable, mode: RowIndexMode) -> ReportTable {
        let total = self.row_count() + other.row_count();
        let stacked = if other.is_empty() {
            self
        } else if self.is_empty() {
            other
        } else {
            let (left, right) = align_depth(self.columns, other.columns);
            let (columns, positions) = match (left, right) {
                (Columns::Flat(a), Columns::Flat(b)) => {
                    let (merged, positions) = union(a, b.as_slice());
                    (Columns::Flat(merged), positions)
                }
                (Columns::Nested(a), Columns::Nested(b)) => {
                    let (merged, positions) = union(a, b.as_slice());
                    (Columns::Nested(merged), positions)
                }
                _ => unreachable!("align_depth returns equal depths"),
            };

            let width = columns.len();
            let mut values: Vec<Vec<f64>> = self
                .values
                .into_iter()
                .map(|mut row| {
                    row.resize(width, f64::NAN);
                    row
                })
                .collect();
            for row in other.values {
                let mut placed = vec![f64::NAN; width];
                for (value, &position) in row.into_iter().zip(&positions) {
                    placed[position] = value;
                }
                values.push(placed);
            }

            let index = match self.index.concat(other.index) {
                Some(index) => index,
                None => {
                    tracing::warn!(
                        rows = total,
                        "Pages disagree on row labels, falling back to a positional index"
                    );
                    RowIndex::positional(total)
                }
            };

            ReportTable::from_parts(index, columns, values)
        };

        match mode {
            RowIndexMode::Preserve => stacked,
            RowIndexMode::Reset => ReportTable {
                index: RowIndex::positional(stacked.row_count()),
                ..stacked
            },
        }
    }
}

fn align_depth(left: Columns, right: Columns) -> (Columns, Columns) {
    if left.depth() == right.depth() {
        (left, right)
    } else {
        (left.lifted(), right.lifted())
    }
}

/// Merges `right` into `left`, returning the merged labels and where each of
/// `right`'s labels landed.
///
/// Repeated labels match by occurrence: the k-th copy on the right lands on
/// the k-th copy on the left, or on a new column when the left has fewer.
fn union<L: Clone + PartialEq>(left: Vec<L>, right: &[L]) -> (Vec<L>, Vec<usize>) {
    if left.as_slice() == right {
        let positions = (0..right.len()).collect();
        return (left, positions);
    }

    let mut merged = left;
    let mut claimed = vec![false; merged.len()];
    let mut positions = Vec::with_capacity(right.len());
    for label in right {
        let free = merged
            .iter()
            .zip(&claimed)
            .position(|(l, taken)| !taken && l == label);
        let position = match free {
            Some(position) => position,
            None => {
                merged.push(label.clone());
                claimed.push(false);
                merged.len() - 1
            }
        };
        claimed[position] = true;
        positions.push(position);
    }
    (merged, positions)
}
