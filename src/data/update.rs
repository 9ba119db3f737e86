//! Download of Bundesbank CPI series into the data directory

use crate::config::{Classification, Language, ParserConfig, Settings};
use crate::error::{CucopyError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

const BUNDESBANK_DOWNLOAD_URL: &str =
    "https://www.bundesbank.de/statistic-rmi/StatisticDownload";

/// Bundesbank time series download client (no API key required)
pub struct BundesbankClient {
    client: Client,
    base_url: String,
}

impl BundesbankClient {
    /// Create a new Bundesbank client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("rusty-cucopy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CucopyError::DataSource(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: BUNDESBANK_DOWNLOAD_URL.to_string(),
        })
    }

    /// Point the client at a mirror of the download endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Download URL of a series export in `language`'s CSV format
    pub fn series_url(&self, classification: Classification, language: Language) -> String {
        format!(
            "{}?tsId={}&mode=its&its_csvFormat={}&its_currency=default&its_dateFormat=default&its_from=&its_to=",
            self.base_url,
            classification.series_key(),
            language.code()
        )
    }

    /// Fetch a series and store it where [`Settings::series_path`] expects it
    pub async fn download_series(
        &self,
        settings: &Settings,
        classification: Classification,
        language: Language,
    ) -> Result<PathBuf> {
        let url = self.series_url(classification, language);
        log::info!("Downloading {} ({}) from {}", classification, language, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CucopyError::DataSource(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CucopyError::DataSource(format!(
                "Bundesbank returned error: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CucopyError::DataSource(format!("Failed to read response: {}", e)))?;

        let path = settings.series_path(&ParserConfig::for_language(language, classification));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;

        log::info!("Stored {} bytes at {}", body.len(), path.display());
        Ok(path)
    }

    /// Fetch several series one after another. Failures are logged and
    /// reported per series; the remaining series are still fetched.
    pub async fn download_all(
        &self,
        settings: &Settings,
        language: Language,
        classifications: &[Classification],
    ) -> Vec<(Classification, Result<PathBuf>)> {
        let mut outcomes = Vec::with_capacity(classifications.len());
        for &classification in classifications {
            let outcome = self.download_series(settings, classification, language).await;
            if let Err(e) = &outcome {
                log::warn!("Failed to download {}: {}", classification, e);
            }
            outcomes.push((classification, outcome));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_series_url() {
        let client = BundesbankClient::new().unwrap();
        let url = client.series_url(Classification::Energy, Language::En);
        assert!(url.starts_with(BUNDESBANK_DOWNLOAD_URL));
        assert!(url.contains("tsId=BBDP1.M.DE.N.VPI.C.NRGY00.I15.A"));
        assert!(url.contains("its_csvFormat=en"));
    }

    #[test]
    fn test_base_url_override() {
        let client = BundesbankClient::new()
            .unwrap()
            .with_base_url("http://localhost:8080/download");
        let url = client.series_url(Classification::All, Language::De);
        assert!(url.starts_with("http://localhost:8080/download?tsId=BBDP1.M.DE.N.VPI.C.A00000"));
    }

    #[tokio::test]
    async fn test_download_all_reports_each_failure() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::with_data_dir(dir.path());
        // Nothing listens on the discard port, so every request fails fast
        let client = BundesbankClient::new()
            .unwrap()
            .with_base_url("http://127.0.0.1:9/download");

        let wanted = [Classification::All, Classification::Energy];
        let outcomes = client.download_all(&settings, Language::De, &wanted).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, Classification::All);
        assert_eq!(outcomes[1].0, Classification::Energy);
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, Err(CucopyError::DataSource(_)))));
        assert!(!dir.path().join("de").exists());
    }

    #[tokio::test]
    async fn test_download_all_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::with_data_dir(dir.path());
        let client = BundesbankClient::new().unwrap();
        assert!(client.download_all(&settings, Language::En, &[]).await.is_empty());
    }
}
