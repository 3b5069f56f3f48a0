use crate::core::nav::{FundId, NavPoint};
use crate::ingest::SchemeHistory;
use crate::providers::NavSource;
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// NAV history provider backed by the public mfapi.in JSON API.
pub struct MfApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl MfApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fundrec/0.1")
            .build()?;
        Ok(MfApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MfApiResponse {
    meta: MfApiMeta,
    #[serde(default)]
    data: Vec<MfApiRow>,
}

#[derive(Debug, Deserialize)]
struct MfApiMeta {
    scheme_name: String,
    #[serde(default)]
    scheme_category: String,
}

#[derive(Debug, Deserialize)]
struct MfApiRow {
    date: String,
    nav: String,
}

#[async_trait]
impl NavSource for MfApiProvider {
    async fn fetch_history(&self, fund_id: FundId) -> Result<SchemeHistory> {
        let url = format!("{}/mf/{}", self.base_url, fund_id);
        debug!("Requesting scheme history from {}", url);

        let response = with_retry(|| async { self.client.get(&url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send request for scheme: {fund_id}"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for scheme: {fund_id}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for scheme: {}", fund_id));
        }

        let api_response: MfApiResponse =
            serde_json::from_str(&response_text).with_context(|| {
                format!(
                    "Failed to parse provider response for scheme: {fund_id}. Response: '{response_text}'",
                )
            })?;

        // Rows arrive newest-first with string-typed values; rows with an
        // unparseable date or a non-positive NAV are dropped.
        let mut points: Vec<NavPoint> = api_response
            .data
            .iter()
            .filter_map(|row| {
                let date = chrono::NaiveDate::parse_from_str(&row.date, "%d-%m-%Y").ok()?;
                let value: f64 = row.nav.parse().ok()?;
                (value > 0.0).then_some(NavPoint {
                    fund_id,
                    date,
                    value,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);

        debug!(
            fund_id,
            points = points.len(),
            "Fetched scheme history from provider"
        );

        Ok(SchemeHistory {
            fund_id,
            scheme_name: api_response.meta.scheme_name,
            scheme_category: api_response.meta.scheme_category,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(fund_id: FundId, body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/mf/{fund_id}")))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_history_fetch() {
        let body = r#"{
            "meta": {
                "scheme_code": 100027,
                "scheme_name": "Grindlays Super Saver Income Fund - Direct Plan",
                "scheme_category": "Debt Scheme - Medium Duration Fund"
            },
            "data": [
                {"date": "03-01-2024", "nav": "102.50"},
                {"date": "02-01-2024", "nav": "101.00"},
                {"date": "01-01-2024", "nav": "100.00"}
            ]
        }"#;
        let server = create_mock_server(100027, body, 200).await;

        let provider = MfApiProvider::new(&server.uri()).unwrap();
        let history = provider.fetch_history(100027).await.unwrap();

        assert_eq!(
            history.scheme_name,
            "Grindlays Super Saver Income Fund - Direct Plan"
        );
        assert_eq!(history.coarse_category(), "debt");
        assert_eq!(history.plan_type(), "Direct");
        assert_eq!(history.points.len(), 3);
        // Rows are re-sorted oldest first.
        assert_eq!(history.points[0].value, 100.0);
        assert_eq!(history.points[2].value, 102.5);
        assert!(history.points.windows(2).all(|p| p[0].date < p[1].date));
    }

    #[tokio::test]
    async fn test_bad_rows_are_dropped() {
        let body = r#"{
            "meta": {"scheme_code": 1, "scheme_name": "Fund", "scheme_category": "Equity Scheme"},
            "data": [
                {"date": "02-01-2024", "nav": "101.00"},
                {"date": "not-a-date", "nav": "50.0"},
                {"date": "01-01-2024", "nav": "0.0"},
                {"date": "31-12-2023", "nav": "N.A."}
            ]
        }"#;
        let server = create_mock_server(1, body, 200).await;

        let provider = MfApiProvider::new(&server.uri()).unwrap();
        let history = provider.fetch_history(1).await.unwrap();
        assert_eq!(history.points.len(), 1);
        assert_eq!(history.points[0].value, 101.0);
    }

    #[tokio::test]
    async fn test_malformed_response_is_an_error() {
        let server = create_mock_server(1, r#"{ "not_meta": true }"#, 200).await;

        let provider = MfApiProvider::new(&server.uri()).unwrap();
        let result = provider.fetch_history(1).await;

        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Failed to parse provider response for scheme: 1"));
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let server = create_mock_server(1, "", 200).await;

        let provider = MfApiProvider::new(&server.uri()).unwrap();
        let result = provider.fetch_history(1).await;

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Received empty response for scheme: 1"
        );
    }
}
