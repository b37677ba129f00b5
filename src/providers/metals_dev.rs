use crate::core::price::{ProviderQuotes, SpotPriceProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Spot prices from the metals.dev `latest` endpoint.
pub struct MetalsDevProvider {
    base_url: String,
    api_key: String,
    currency: String,
    unit: String,
}

impl MetalsDevProvider {
    pub fn new(base_url: &str, api_key: &str, currency: &str, unit: &str) -> Self {
        MetalsDevProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            currency: currency.to_string(),
            unit: unit.to_string(),
        }
    }

    fn latest_url(&self) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/v1/latest", self.base_url),
            &[
                ("api_key", self.api_key.as_str()),
                ("currency", self.currency.as_str()),
                ("unit", self.unit.as_str()),
            ],
        )
        .with_context(|| format!("Invalid metals.dev base URL: {}", self.base_url))
    }
}

#[derive(Debug, Deserialize)]
struct MetalsDevResponse {
    status: String,
    metals: Option<MetalsDevMetals>,
    timestamps: Option<MetalsDevTimestamps>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetalsDevMetals {
    #[serde(with = "rust_decimal::serde::float")]
    gold: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    silver: Decimal,
}

#[derive(Debug, Deserialize)]
struct MetalsDevTimestamps {
    metal: String,
}

#[async_trait]
impl SpotPriceProvider for MetalsDevProvider {
    #[instrument(
        name = "MetalsDevFetch",
        skip(self),
        fields(currency = %self.currency, unit = %self.unit)
    )]
    async fn fetch_spot_prices(&self) -> Result<ProviderQuotes> {
        let url = self.latest_url()?;
        debug!("Requesting spot prices from {}/v1/latest", self.base_url);

        let client = reqwest::Client::builder()
            .user_agent("bullion/1.0")
            .build()?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for metals.dev latest prices", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for metals.dev latest prices",
                response.status()
            ));
        }

        let text = response.text().await?;
        let data: MetalsDevResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse metals.dev response: {}", e))?;

        if data.status != "success" {
            return Err(anyhow!(
                "metals.dev returned status '{}': {}",
                data.status,
                data.error_message.as_deref().unwrap_or("no error message")
            ));
        }

        let metals = data
            .metals
            .ok_or_else(|| anyhow!("No metal prices in metals.dev response"))?;

        let observed_at = data
            .timestamps
            .and_then(|ts| match DateTime::parse_from_rfc3339(&ts.metal) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    debug!(
                        "Could not parse metal timestamp '{}': {}. Falling back to current time.",
                        ts.metal, e
                    );
                    None
                }
            })
            .unwrap_or_else(Utc::now);

        Ok(ProviderQuotes {
            gold: metals.gold,
            silver: metals.silver,
            observed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status_code: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("currency", "AUD"))
            .and(query_param("unit", "toz"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer) -> MetalsDevProvider {
        MetalsDevProvider::new(&server.uri(), "test-key", "AUD", "toz")
    }

    #[tokio::test]
    async fn test_successful_spot_price_fetch() {
        let mock_response = r#"{
            "status": "success",
            "currency": "AUD",
            "unit": "toz",
            "metals": {"gold": 3612.45, "silver": 48.1, "platinum": 1500.0},
            "currencies": {"USD": 0.66},
            "timestamps": {"metal": "2024-06-01T09:30:00.000Z", "currency": "2024-06-01T09:29:00.000Z"}
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let quotes = provider(&mock_server).fetch_spot_prices().await.unwrap();

        assert_eq!(quotes.gold, "3612.45".parse::<Decimal>().unwrap());
        assert_eq!(quotes.silver, "48.1".parse::<Decimal>().unwrap());
        assert_eq!(quotes.gold.to_string(), "3612.45");
        assert_eq!(quotes.silver.to_string(), "48.1");
        assert_eq!(
            quotes.observed_at,
            "2024-06-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_uses_now() {
        let mock_response = r#"{
            "status": "success",
            "metals": {"gold": 3600, "silver": 48},
            "timestamps": {"metal": "yesterday"}
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let before = Utc::now();
        let quotes = provider(&mock_server).fetch_spot_prices().await.unwrap();
        assert!(quotes.observed_at >= before);
        assert_eq!(quotes.gold, Decimal::from(3600));
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = create_mock_server(500, "Server Error").await;

        let result = provider(&mock_server).fetch_spot_prices().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for metals.dev latest prices"
        );
    }

    #[tokio::test]
    async fn test_failure_status_in_payload() {
        let mock_response = r#"{"status": "failure", "error_code": 1101, "error_message": "Invalid API key"}"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let result = provider(&mock_server).fetch_spot_prices().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "metals.dev returned status 'failure': Invalid API key"
        );
    }

    #[tokio::test]
    async fn test_non_numeric_price_is_rejected() {
        let mock_response = r#"{"status": "success", "metals": {"gold": "n/a", "silver": 48.1}}"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let result = provider(&mock_server).fetch_spot_prices().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse metals.dev response")
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"metals": []}"#).await;

        let result = provider(&mock_server).fetch_spot_prices().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse metals.dev response")
        );
    }
}
