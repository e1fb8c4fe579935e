use serde::Deserialize;

use super::auth::{ServiceAccountKey, TokenSource};
use super::{GetReportsRequest, GetReportsResponse, ReportingBackend};

pub const DEFAULT_ENDPOINT: &str = "https://analyticsreporting.googleapis.com/v4/reports:batchGet";

/// Analytics Reporting API v4 client authenticated with a service account.
pub struct AnalyticsReportingClient {
    client: reqwest::Client,
    endpoint: String,
    tokens: TokenSource,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    status: Option<String>,
}

impl AnalyticsReportingClient {
    pub fn new(key: ServiceAccountKey, endpoint: &str) -> Self {
        let client = reqwest::Client::new();
        Self {
            tokens: TokenSource::new(client.clone(), key),
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ReportingBackend for AnalyticsReportingClient {
    async fn batch_get(&self, request: &GetReportsRequest) -> anyhow::Result<GetReportsResponse> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ApiError>(&error_body) {
                return Err(anyhow::anyhow!(
                    "Analytics API error ({}{}): {}",
                    status,
                    err.error
                        .status
                        .map(|s| format!(" {s}"))
                        .unwrap_or_default(),
                    err.error.message
                ));
            }
            return Err(anyhow::anyhow!(
                "Analytics API error ({}): {}",
                status,
                error_body
            ));
        }

        Ok(response.json().await?)
    }

    fn name(&self) -> &str {
        "analyticsreporting.v4"
    }
}
