use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::types::AtmRecord;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("response is not the expected JSON shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One region that contributed zero records, and why.
#[derive(Debug, Clone, Serialize)]
pub struct RegionFailure {
    pub region: String,
    pub error: String,
}

/// Outcome of querying every configured region. Failed regions are kept
/// alongside the successes so the page can show what is missing instead
/// of silently rendering a partial map.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub regions: Vec<(String, Vec<AtmRecord>)>,
    pub failures: Vec<RegionFailure>,
}

pub fn build_client(config: &ApiConfig) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("atm-map/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Queries the regions sequentially, in configured order. Never fails as
/// a whole: a region that errors after all attempts lands in `failures`.
pub async fn fetch_all(client: &Client, config: &ApiConfig) -> FetchReport {
    let mut report = FetchReport::default();

    for region in &config.regions {
        match fetch_region_with_retries(client, config, region).await {
            Ok(records) => {
                info!(%region, count = records.len(), "fetched region");
                report.regions.push((region.clone(), records));
            }
            Err(e) => {
                warn!(%region, error = %e, "region fetch failed, continuing without it");
                report.failures.push(RegionFailure {
                    region: region.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

async fn fetch_region_with_retries(
    client: &Client,
    config: &ApiConfig,
    region: &str,
) -> Result<Vec<AtmRecord>, FetchError> {
    let mut attempt = 0;
    loop {
        match fetch_region(client, &config.base_url, region).await {
            Ok(records) => return Ok(records),
            Err(e) if attempt < config.retries => {
                attempt += 1;
                warn!(%region, attempt, error = %e, "retrying region fetch");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_region(
    client: &Client,
    base_url: &str,
    region: &str,
) -> Result<Vec<AtmRecord>, FetchError> {
    let body = client
        .get(base_url)
        .query(&[("area", region)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    decode_records(&body)
}

pub fn decode_records(body: &str) -> Result<Vec<AtmRecord>, FetchError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_records() {
        let body = r#"[
            {
                "address": "пр. Независимости",
                "house": "4",
                "gps_x": "53.893009",
                "gps_y": "27.567444",
                "currency": "BYN",
                "install_place_full": "Отделение №1",
                "install_place": "123",
                "work_time_full": "Круглосуточно",
                "work_time": "",
                "ATM_error": "нет",
                "cash_in": "да",
                "some_new_field": "ignored"
            },
            {
                "address": "ул. Ленина",
                "house": "10"
            }
        ]"#;
        let records = decode_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].atm_error, "нет");
        assert_eq!(records[0].gps_x, "53.893009");
        // omitted fields default to empty
        assert_eq!(records[1].currency, "");
    }

    #[test]
    fn non_array_body_is_a_decode_error() {
        let err = decode_records(r#"{"error": "maintenance"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = decode_records("<html>502</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
