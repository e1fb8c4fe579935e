use std::time::Instant;

use opentelemetry::KeyValue;

use crate::analytics::{GetReportsRequest, Page, ReportSpecification, ReportingBackend};
use crate::error::{AppError, AppResult};
use crate::telemetry::metrics::{
    ANALYTICS_FETCH_DURATION, ANALYTICS_FETCH_ERRORS, ANALYTICS_PAGES_FETCHED,
};

/// Token sent with the first request of a report.
pub const START_PAGE_TOKEN: &str = "0";
pub const DEFAULT_PAGE_SIZE: u32 = 100_000;

/// Walks the pages of one report, one backend call per page.
///
/// The sequence ends after the first page without a continuation token, or
/// right after a failed call; it cannot be restarted.
pub struct PageFetcher<'a> {
    backend: &'a dyn ReportingBackend,
    spec: &'a ReportSpecification,
    view_id: &'a str,
    page_size: u32,
    next_token: Option<String>,
    pages_fetched: usize,
}

impl<'a> PageFetcher<'a> {
    pub fn new(
        backend: &'a dyn ReportingBackend,
        spec: &'a ReportSpecification,
        view_id: &'a str,
        page_size: u32,
    ) -> Self {
        Self {
            backend,
            spec,
            view_id,
            page_size,
            next_token: Some(START_PAGE_TOKEN.to_string()),
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub async fn next_page(&mut self) -> Option<AppResult<Page>> {
        let token = self.next_token.take()?;
        let request = GetReportsRequest::for_page(self.spec, self.view_id, self.page_size, &token);

        let start = Instant::now();
        let result = self.backend.batch_get(&request).await;
        let backend_kv = KeyValue::new("analytics.backend", self.backend.name().to_string());
        ANALYTICS_FETCH_DURATION.record(start.elapsed().as_secs_f64(), &[backend_kv.clone()]);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                ANALYTICS_FETCH_ERRORS.add(1, &[backend_kv]);
                return Some(Err(AppError::Fetch(format!(
                    "page {} of view {}: {err:#}",
                    self.pages_fetched + 1,
                    self.view_id
                ))));
            }
        };

        let Some(page) = response.reports.into_iter().next() else {
            ANALYTICS_FETCH_ERRORS.add(1, &[backend_kv]);
            return Some(Err(AppError::Fetch(format!(
                "page {} of view {}: response contained no reports",
                self.pages_fetched + 1,
                self.view_id
            ))));
        };

        self.next_token = page.continuation().map(str::to_string);
        self.pages_fetched += 1;
        ANALYTICS_PAGES_FETCHED.add(1, &[backend_kv]);

        tracing::debug!(
            view_id = %self.view_id,
            page = self.pages_fetched,
            page_token = %token,
            rows = page.rows().len(),
            total_rows = page.total_rows(),
            has_more = self.next_token.is_some(),
            "Fetched report page"
        );

        Some(Ok(page))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::analytics::{DateRange, GetReportsResponse};

    /// Backend that replays scripted responses and records every request.
    pub(crate) struct ScriptedBackend {
        responses: Mutex<VecDeque<anyhow::Result<GetReportsResponse>>>,
        pub(crate) requests: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(responses: Vec<anyhow::Result<GetReportsResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn page_tokens(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r["reportRequests"][0]["pageToken"].as_str().unwrap().to_string())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl ReportingBackend for ScriptedBackend {
        async fn batch_get(
            &self,
            request: &GetReportsRequest,
        ) -> anyhow::Result<GetReportsResponse> {
            self.requests
                .lock()
                .unwrap()
                .push(serde_json::to_value(request).unwrap());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    pub(crate) fn language_response(rows: &[(&str, &str)], next: Option<&str>) -> GetReportsResponse {
        let rows: Vec<_> = rows
            .iter()
            .map(|(lang, sessions)| json!({"dimensions": [lang], "metrics": [{"values": [sessions]}]}))
            .collect();
        let mut report = json!({
            "columnHeader": {
                "dimensions": ["ga:language"],
                "metricHeader": {"metricHeaderEntries": [{"name": "ga:sessions"}]}
            },
            "data": {"rows": rows}
        });
        if let Some(token) = next {
            report["nextPageToken"] = json!(token);
        }
        serde_json::from_value(json!({"reports": [report]})).unwrap()
    }

    pub(crate) fn spec() -> ReportSpecification {
        ReportSpecification {
            dimensions: vec!["ga:language".to_string()],
            metrics: vec!["ga:sessions".to_string()],
            date_range: DateRange {
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn test_pagination_follows_tokens_until_absent() {
        let backend = ScriptedBackend::new(vec![
            Ok(language_response(&[("en", "10")], Some("1"))),
            Ok(language_response(&[("fr", "5")], Some("2"))),
            Ok(language_response(&[("de", "3")], None)),
            Ok(language_response(&[("xx", "0")], None)),
        ]);
        let spec = spec();
        let mut fetcher = PageFetcher::new(&backend, &spec, "12345", 1);

        let mut pages = Vec::new();
        while let Some(page) = fetcher.next_page().await {
            pages.push(page.unwrap());
        }

        assert_eq!(pages.len(), 3);
        assert_eq!(fetcher.pages_fetched(), 3);
        assert_eq!(backend.page_tokens(), vec!["0", "1", "2"]);
        assert!(fetcher.next_page().await.is_none());
        assert_eq!(backend.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_request_carries_view_and_page_size() {
        let backend = ScriptedBackend::new(vec![Ok(language_response(&[], None))]);
        let spec = spec();
        let mut fetcher = PageFetcher::new(&backend, &spec, "98765", 25_000);

        assert_ok!(fetcher.next_page().await.unwrap());
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0]["reportRequests"][0]["viewId"], "98765");
        assert_eq!(requests[0]["reportRequests"][0]["pageSize"], 25_000);
    }

    #[tokio::test]
    async fn test_failure_ends_sequence() {
        let backend = ScriptedBackend::new(vec![
            Ok(language_response(&[("en", "10")], Some("1"))),
            Err(anyhow::anyhow!("403 forbidden")),
            Ok(language_response(&[("fr", "5")], None)),
        ]);
        let spec = spec();
        let mut fetcher = PageFetcher::new(&backend, &spec, "12345", 1);

        assert_ok!(fetcher.next_page().await.unwrap());
        let err = assert_err!(fetcher.next_page().await.unwrap());
        assert!(matches!(err, AppError::Fetch(ref msg) if msg.contains("403 forbidden")));
        assert!(fetcher.next_page().await.is_none());
        assert_eq!(backend.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_response_without_reports_is_an_error() {
        let backend = ScriptedBackend::new(vec![Ok(GetReportsResponse::default())]);
        let spec = spec();
        let mut fetcher = PageFetcher::new(&backend, &spec, "12345", 10);

        let result = fetcher.next_page().await.unwrap();
        assert!(matches!(result, Err(AppError::Fetch(_))));
        assert!(fetcher.next_page().await.is_none());
    }
}
