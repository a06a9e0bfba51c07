//! Exchange-rate client
//!
//! One GET per lookup against ExchangeRate-API's pair endpoint. No retry:
//! a failed lookup aborts the conversion that asked for it.

use crate::error::RateLookupError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current rate for one unit of `from` expressed in `to`.
    async fn pair_rate(&self, from: &str, to: &str) -> Result<f64, RateLookupError>;
}

pub struct ExchangeRateClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ExchangeRateClient {
    pub fn new(api_key: String, base_url: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn pair_url(&self, from: &str, to: &str) -> String {
        format!(
            "{}/v6/{}/pair/{}/{}",
            self.base_url,
            self.api_key,
            from.trim().to_uppercase(),
            to.trim().to_uppercase()
        )
    }
}

#[async_trait]
impl RateProvider for ExchangeRateClient {
    async fn pair_rate(&self, from: &str, to: &str) -> Result<f64, RateLookupError> {
        info!(from, to, "Fetching real-time exchange rate");

        let response = self
            .client
            .get(self.pair_url(from, to))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                // the URL path carries the API key
                let e = e.without_url();
                error!("Exchange rate request failed: {}", e);
                RateLookupError::Network(e.to_string())
            })?;

        let body: Value = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Exchange rate response was not JSON: {}", e);
            RateLookupError::MalformedResponse(e.to_string())
        })?;

        parse_pair_response(&body)
    }
}

/// Interpret the `{result, conversion_rate | error-type}` body.
pub fn parse_pair_response(body: &Value) -> Result<f64, RateLookupError> {
    let result = body
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| RateLookupError::MalformedResponse("missing 'result'".to_string()))?;

    if result != "success" {
        let kind = body
            .get("error-type")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(RateLookupError::Api(kind.to_string()));
    }

    let rate = body
        .get("conversion_rate")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            RateLookupError::MalformedResponse("missing 'conversion_rate'".to_string())
        })?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(RateLookupError::MalformedResponse(format!(
            "non-positive conversion_rate {}",
            rate
        )));
    }

    Ok(rate)
}

/// Fixed answer for every pair; for offline development and tests.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    outcome: Result<f64, RateLookupError>,
}

impl StaticRateProvider {
    pub fn rate(rate: f64) -> Self {
        Self { outcome: Ok(rate) }
    }

    pub fn failing(error: RateLookupError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn pair_rate(&self, _from: &str, _to: &str) -> Result<f64, RateLookupError> {
        self.outcome.clone()
    }
}
