use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};

use crate::analytics::client::DEFAULT_ENDPOINT;
use crate::error::{AppError, AppResult};
use crate::pipeline::fetch::DEFAULT_PAGE_SIZE;
use crate::table::RowIndexMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub credentials_file: PathBuf,
    pub views_file: PathBuf,
    pub report_catalog_file: Option<PathBuf>,
    pub display_names_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub report_period: String,
    pub page_size: u32,
    pub end_date: NaiveDate,
    pub row_index_mode: RowIndexMode,
    pub analytics_endpoint: String,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source; empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            environment: or("ENVIRONMENT", "development"),
            credentials_file: or("CREDENTIALS_FILE", "config/api-keys.json").into(),
            views_file: or("VIEWS_FILE", "config/views.json").into(),
            report_catalog_file: var("REPORT_CATALOG_FILE").map(PathBuf::from),
            display_names_file: var("DISPLAY_NAMES_FILE").map(PathBuf::from),
            output_dir: or("OUTPUT_DIR", "reports").into(),
            report_period: or("REPORT_PERIOD", "yearMonth"),
            page_size: match var("PAGE_SIZE") {
                Some(raw) => parse("PAGE_SIZE", &raw)?,
                None => DEFAULT_PAGE_SIZE,
            },
            end_date: match var("END_DATE") {
                Some(raw) => parse("END_DATE", &raw)?,
                None => Utc::now().date_naive(),
            },
            row_index_mode: match var("ROW_INDEX_MODE") {
                Some(raw) => raw.parse().map_err(AppError::Config)?,
                None => RowIndexMode::default(),
            },
            analytics_endpoint: or("ANALYTICS_ENDPOINT", DEFAULT_ENDPOINT),
            otel_service_name: or("OTEL_SERVICE_NAME", "analytics-report-backup"),
            otel_exporter_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse<T>(key: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} must be valid ({raw:?}): {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppResult<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.environment, "development");
        assert_eq!(config.credentials_file, PathBuf::from("config/api-keys.json"));
        assert_eq!(config.views_file, PathBuf::from("config/views.json"));
        assert_eq!(config.report_catalog_file, None);
        assert_eq!(config.display_names_file, None);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.report_period, "yearMonth");
        assert_eq!(config.page_size, 100_000);
        assert_eq!(config.row_index_mode, RowIndexMode::Preserve);
        assert_eq!(config.analytics_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.otel_exporter_endpoint, None);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("ENVIRONMENT", "production"),
            ("PAGE_SIZE", "500"),
            ("END_DATE", "2021-06-30"),
            ("ROW_INDEX_MODE", "reset"),
            ("DISPLAY_NAMES_FILE", "config/names.json"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.page_size, 500);
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2021, 6, 30).unwrap());
        assert_eq!(config.row_index_mode, RowIndexMode::Reset);
        assert_eq!(
            config.display_names_file,
            Some(PathBuf::from("config/names.json"))
        );
        assert_eq!(
            config.otel_exporter_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config(&[("OTEL_EXPORTER_OTLP_ENDPOINT", ""), ("OUTPUT_DIR", " ")]).unwrap();

        assert_eq!(config.otel_exporter_endpoint, None);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            [("PAGE_SIZE", "lots")],
            [("END_DATE", "yesterday")],
            [("ROW_INDEX_MODE", "shuffle")],
        ] {
            assert!(matches!(config(&vars), Err(AppError::Config(_))));
        }
    }
}
