use crate::catalog::DisplayNames;

/// How metric identifiers become column labels.
#[derive(Debug, Clone, Default)]
pub enum ColumnNaming {
    /// Text after the last `:` (`ga:sessions` -> `sessions`).
    #[default]
    Suffix,
    /// Display-name table; identifiers missing from it become `""`.
    Lookup(DisplayNames),
}

impl ColumnNaming {
    pub fn resolve(&self, identifier: &str) -> String {
        match self {
            ColumnNaming::Suffix => strip_prefix(identifier).to_string(),
            ColumnNaming::Lookup(names) => names.get(identifier).unwrap_or_default().to_string(),
        }
    }
}

pub fn strip_prefix(identifier: &str) -> &str {
    identifier.rsplit(':').next().unwrap_or(identifier)
}
