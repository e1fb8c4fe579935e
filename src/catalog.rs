//! Run configuration loaded once at start-up: the views to back up, the
//! report catalog and the optional display-name table.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::analytics::{DateRange, ReportSpecification};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewDetails {
    name: String,
    start_date: NaiveDate,
}

/// Parses `{ "<viewId>": { "name": ..., "startDate": "YYYY-MM-DD" } }`,
/// keeping file order.
pub fn parse_views(json: &str) -> AppResult<Vec<View>> {
    let map: Map<String, Value> = serde_json::from_str(json)?;
    map.into_iter()
        .map(|(id, details)| {
            let details: ViewDetails = serde_json::from_value(details)
                .map_err(|e| AppError::Config(format!("view {id}: {e}")))?;
            Ok(View {
                id,
                name: details.name,
                start_date: details.start_date,
            })
        })
        .collect()
}

pub fn load_views(path: impl AsRef<Path>) -> AppResult<Vec<View>> {
    parse_views(&read_config_file(path.as_ref())?)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportDefinition {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
}

impl ReportDefinition {
    /// The query for this report, with the period dimension (`ga:<period>`)
    /// placed before the report's own dimensions.
    pub fn specification(&self, period: &str, date_range: DateRange) -> ReportSpecification {
        let mut dimensions = Vec::with_capacity(self.dimensions.len() + 1);
        dimensions.push(format!("ga:{period}"));
        dimensions.extend(self.dimensions.iter().cloned());

        ReportSpecification {
            dimensions,
            metrics: self.metrics.clone(),
            date_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub category: String,
    pub name: String,
    pub definition: ReportDefinition,
}

/// Ordered report category -> sub-report -> definition table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportCatalog {
    entries: Vec<CatalogEntry>,
}

impl ReportCatalog {
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let categories: Map<String, Value> = serde_json::from_str(json)?;
        let mut entries = Vec::new();

        for (category, reports) in categories {
            let Value::Object(reports) = reports else {
                return Err(AppError::Config(format!(
                    "report category {category} must be an object"
                )));
            };
            for (name, definition) in reports {
                let definition: ReportDefinition = serde_json::from_value(definition)
                    .map_err(|e| AppError::Config(format!("report {category}/{name}: {e}")))?;
                if definition.metrics.is_empty() {
                    return Err(AppError::Config(format!(
                        "report {category}/{name} has no metrics"
                    )));
                }
                entries.push(CatalogEntry {
                    category: category.clone(),
                    name,
                    definition,
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    /// The standard backup menu: audience, acquisition, behavior and
    /// conversion reports.
    pub fn builtin() -> Self {
        const AUDIENCE: &[&str] = &[
            "ga:users",
            "ga:newUsers",
            "ga:sessions",
            "ga:bounceRate",
            "ga:pageviewsPerSession",
            "ga:avgSessionDuration",
            "ga:transactions",
            "ga:transactionRevenue",
            "ga:transactionsPerSession",
            "ga:revenuePerTransaction",
        ];
        const AUDIENCE_BEHAVIOR: &[&str] = &["ga:sessions", "ga:pageviews"];
        const BEHAVIOR: &[&str] = &[
            "ga:pageviews",
            "ga:uniquePageviews",
            "ga:timeOnPage",
            "ga:entrances",
            "ga:bounceRate",
            "ga:exits",
            "ga:pageValue",
        ];
        const EXITS: &[&str] = &["ga:exits", "ga:pageviews"];
        const EVENTS: &[&str] = &[
            "ga:totalEvents",
            "ga:uniqueEvents",
            "ga:eventValue",
            "ga:avgEventValue",
        ];
        const GOALS: &[&str] = &["ga:goalCompletionsAll", "ga:goalValueAll"];
        const ECOMM_PRODUCT: &[&str] = &[
            "ga:itemRevenue",
            "ga:uniquePurchases",
            "ga:itemQuantity",
            "ga:revenuePerItem",
            "ga:itemsPerPurchase",
            "ga:productRefunds",
        ];
        const ECOMM_SALES: &[&str] = &[
            "ga:transactionRevenue",
            "ga:transactionTax",
            "ga:transactionShipping",
            "ga:refundAmount",
            "ga:itemQuantity",
        ];

        let menu: &[(&str, &str, &[&str], &[&str])] = &[
            ("Audience", "Geo_Language", &["ga:language"], AUDIENCE),
            ("Audience", "Behavior_NewVsReturning", &["ga:userType"], AUDIENCE),
            (
                "Audience",
                "Behavior_Frequency",
                &["ga:sessionCount", "ga:daysSinceLastSession"],
                AUDIENCE_BEHAVIOR,
            ),
            (
                "Audience",
                "Behavior_Engagement",
                &["ga:sessionDurationBucket", "ga:pageDepth"],
                AUDIENCE_BEHAVIOR,
            ),
            (
                "Audience",
                "Technology_Browser_OS",
                &["ga:browser", "ga:operatingSystem"],
                AUDIENCE,
            ),
            ("Audience", "Technology_Network", &["ga:networkLocation"], AUDIENCE),
            ("Audience", "Mobile", &["ga:mobileDeviceInfo"], AUDIENCE),
            (
                "Audience",
                "Geo_Location",
                &["ga:continent", "ga:country", "ga:city"],
                AUDIENCE,
            ),
            ("Acquisition", "Channels", &["ga:source", "ga:medium"], AUDIENCE),
            ("Acquisition", "Treemaps", &["ga:channelGrouping"], AUDIENCE),
            ("Acquisition", "Campaigns", &["ga:campaign"], AUDIENCE),
            ("Behavior", "All_Pages", &["ga:pagePath", "ga:pageTitle"], BEHAVIOR),
            (
                "Behavior",
                "Landing_Pages",
                &["ga:landingPagePath", "ga:pageTitle"],
                AUDIENCE,
            ),
            ("Behavior", "Exit_Pages", &["ga:exitPagePath", "ga:pageTitle"], EXITS),
            (
                "Behavior",
                "Top_Events",
                &["ga:eventCategory", "ga:eventAction", "ga:eventLabel"],
                EVENTS,
            ),
            ("Behavior", "Events_Pages", &["ga:exitPagePath", "ga:pageTitle"], EVENTS),
            ("Conversions", "Goals", &["ga:goalCompletionLocation"], GOALS),
            (
                "Conversions",
                "Ecomm_Product_Performance",
                &["ga:productName", "ga:productBrand", "ga:productSku"],
                ECOMM_PRODUCT,
            ),
            (
                "Conversions",
                "Ecomm_Sales_Performance",
                &["ga:transactionId"],
                ECOMM_SALES,
            ),
        ];

        fn owned(ids: &[&str]) -> Vec<String> {
            ids.iter().map(|id| id.to_string()).collect()
        }

        Self {
            entries: menu
                .iter()
                .map(|(category, name, dimensions, metrics)| CatalogEntry {
                    category: category.to_string(),
                    name: name.to_string(),
                    definition: ReportDefinition {
                        dimensions: owned(dimensions),
                        metrics: owned(metrics),
                    },
                })
                .collect(),
        }
    }
}

/// Human-readable names for metric and dimension identifiers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DisplayNames(HashMap<String, String>);

impl DisplayNames {
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.0.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(serde_json::from_str(&read_config_file(path.as_ref())?)?)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn read_config_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))
}
