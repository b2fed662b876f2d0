//! Prometheus client for the alerts API.
//!
//! Only the alert listing is needed here: the watcher polls
//! `/api/v1/alerts` with silenced and inhibited alerts filtered out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MeasureError;
use crate::record::Alert;
use crate::watcher::AlertSource;

/// Default Prometheus service URL (in-cluster monitoring stack)
const DEFAULT_PROMETHEUS_URL: &str = "https://prometheus-k8s.openshift-monitoring.svc:9091";

/// Configuration for the Prometheus client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Base URL for the Prometheus API
    pub base_url: String,
    /// Bearer token sent with every request
    pub bearer_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Verify the server certificate
    pub verify_tls: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROMETHEUS_URL.to_string(),
            bearer_token: None,
            timeout_secs: 30,
            verify_tls: true,
        }
    }
}

/// Alerts API response
#[derive(Debug, Deserialize)]
struct AlertsResponse {
    status: String,
    data: AlertsData,
}

#[derive(Debug, Deserialize)]
struct AlertsData {
    alerts: Vec<Alert>,
}

/// Prometheus client for listing alerts
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    config: PrometheusConfig,
    client: reqwest::Client,
}

impl PrometheusClient {
    /// Create a new Prometheus client with the given configuration.
    pub fn new(config: PrometheusConfig) -> Result<Self, MeasureError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, resource: &str) -> String {
        format!(
            "{}/api/v1/{resource}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// List alerts.
    ///
    /// A non-success HTTP status, a body without `data.alerts` or an API
    /// status other than `success` is an `AlertQuery` error; the caller
    /// decides whether that is fatal.
    pub async fn alerts(&self, silenced: bool, inhibited: bool) -> Result<Vec<Alert>, MeasureError> {
        let url = self.url("alerts");

        let mut request = self.client.get(&url).query(&[
            ("silenced", silenced.to_string()),
            ("inhibited", inhibited.to_string()),
        ]);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MeasureError::AlertQuery {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<AlertsResponse>(&body);
        let alerts_response = match parsed {
            Ok(parsed) if parsed.status == "success" => parsed,
            _ => {
                return Err(MeasureError::AlertQuery {
                    url,
                    status: status.as_u16(),
                    body,
                })
            }
        };
        let alerts = alerts_response.data.alerts;

        debug!(count = alerts.len(), "Fetched Prometheus alerts");

        Ok(alerts)
    }
}

#[async_trait]
impl AlertSource for PrometheusClient {
    async fn active_alerts(&self) -> Result<Vec<Alert>, MeasureError> {
        self.alerts(false, false).await
    }
}
