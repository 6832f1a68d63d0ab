use crate::response::AstronomyResponse;
use crate::source::MoonPhaseSource;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use dreammap_core::{DreamError, MoonConfig, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MoonClientConfig {
    pub base_url: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub default_place_id: String,
    pub timeout: Duration,
}

impl From<&MoonConfig> for MoonClientConfig {
    fn from(config: &MoonConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone().filter(|k| !k.is_empty()),
            secret_key: config.secret_key.clone().filter(|k| !k.is_empty()),
            default_place_id: config.default_place_id.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for MoonClientConfig {
    fn default() -> Self {
        Self::from(&MoonConfig::default())
    }
}

/// Client for the timeanddate astronomy API (`/astronomy`, version 3).
pub struct MoonPhaseClient {
    client: Client,
    config: MoonClientConfig,
}

impl MoonPhaseClient {
    pub fn new(config: MoonClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn query(&self, date: NaiveDate, place_id: &str) -> Result<Vec<(&'static str, String)>> {
        let (Some(access_key), Some(secret_key)) =
            (&self.config.access_key, &self.config.secret_key)
        else {
            return Err(DreamError::MoonPhaseUnavailable(
                "astronomy API credentials are not configured".to_string(),
            ));
        };

        Ok(vec![
            ("version", "3".to_string()),
            ("accesskey", access_key.clone()),
            ("secretkey", secret_key.clone()),
            ("placeid", place_id.to_string()),
            ("object", "moon".to_string()),
            ("types", "phase".to_string()),
            ("startdt", date.format("%Y-%m-%d").to_string()),
        ])
    }

    /// Sends the lookup and reads the whole body.
    async fn request(&self, query: &[(&'static str, String)]) -> Result<AstronomyResponse> {
        let response = self
            .client
            .get(format!("{}/astronomy", self.config.base_url))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                DreamError::MoonPhaseUnavailable(format!("astronomy request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(DreamError::MoonPhaseUnavailable(format!(
                "astronomy API error: HTTP {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            DreamError::MoonPhaseUnavailable(format!("invalid astronomy response: {}", e))
        })
    }
}

#[async_trait]
impl MoonPhaseSource for MoonPhaseClient {
    async fn fetch_raw_phase(
        &self,
        date: Option<NaiveDate>,
        location_id: Option<&str>,
    ) -> Result<String> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let place_id = location_id
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(self.config.default_place_id.as_str());
        let query = self.query(date, place_id)?;

        debug!(%date, place_id, "Requesting moon phase");

        let body = timeout(self.config.timeout, self.request(&query))
            .await
            .map_err(|_| {
                DreamError::MoonPhaseUnavailable(format!(
                    "astronomy request timed out after {:?}",
                    self.config.timeout
                ))
            })??;

        body.moon_phase_code()
            .map(str::to_string)
            .ok_or_else(|| {
                DreamError::MoonPhaseUnavailable(
                    "astronomy response has no moon phase for the first location".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_requires_credentials() {
        let client = MoonPhaseClient::new(MoonClientConfig::default());
        let date = NaiveDate::from_ymd_opt(2025, 12, 4).unwrap();
        assert!(matches!(
            client.query(date, "norway/oslo"),
            Err(DreamError::MoonPhaseUnavailable(_))
        ));
    }

    #[test]
    fn test_query_parameters() {
        let client = MoonPhaseClient::new(MoonClientConfig {
            access_key: Some("access".into()),
            secret_key: Some("secret".into()),
            ..MoonClientConfig::default()
        });
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let query = client.query(date, "usa/new-york").unwrap();

        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("version"), Some("3"));
        assert_eq!(get("placeid"), Some("usa/new-york"));
        assert_eq!(get("object"), Some("moon"));
        assert_eq!(get("types"), Some("phase"));
        assert_eq!(get("startdt"), Some("2025-03-07"));
    }

    #[test]
    fn test_missing_credentials_skip_network() {
        let client = MoonPhaseClient::new(MoonClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..MoonClientConfig::default()
        });
        let reading = tokio_test::block_on(client.fetch(None, Some("usa/new-york")));
        assert!(reading.is_unknown());
    }

    #[test]
    fn test_empty_keys_count_as_missing() {
        let config = MoonClientConfig::from(&MoonConfig {
            access_key: Some(String::new()),
            secret_key: Some("secret".into()),
            ..MoonConfig::default()
        });
        assert!(config.access_key.is_none());
    }
}
