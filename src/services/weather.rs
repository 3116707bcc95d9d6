//! wttr.in weather lookup.
//!
//! Fetches a one-line current-conditions summary ("Sonnig +18°C") for a
//! place name. Used only to enrich new rides; any failure degrades to
//! [`NOT_AVAILABLE`] and never blocks a write.
//! See: https://github.com/chubin/wttr.in#one-line-output

use reqwest::Url;
use std::time::Duration;

use crate::services::normalize::NOT_AVAILABLE;

/// Condition text and temperature, German labels. Sent verbatim: wttr.in
/// reads `%C` and `%t` as placeholders and `+` as a space.
const LOOKUP_QUERY: &str = "format=%C+%t&lang=de";

#[derive(Debug, thiserror::Error)]
enum WeatherError {
    #[error("invalid weather URL for '{0}'")]
    Url(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather service returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("empty response")]
    Empty,
}

/// Client for the wttr.in one-line API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Current weather at `place`, or `"N/A"` when it cannot be determined.
    pub async fn describe(&self, place: &str) -> String {
        let place = place.trim();
        if place.is_empty() {
            return NOT_AVAILABLE.to_string();
        }
        match self.fetch(place).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Weather lookup for '{}' failed: {}", place, e);
                NOT_AVAILABLE.to_string()
            }
        }
    }

    async fn fetch(&self, place: &str) -> Result<String, WeatherError> {
        let url = self.lookup_url(place)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }

        let body = response.text().await?;
        let summary = body.trim();
        if summary.is_empty() {
            return Err(WeatherError::Empty);
        }
        Ok(summary.to_string())
    }

    /// `{base}/{place}?format=%C+%t&lang=de`, with the place percent-encoded
    /// as a single path segment.
    fn lookup_url(&self, place: &str) -> Result<Url, WeatherError> {
        let mut url = Url::parse(&self.base_url).map_err(|_| WeatherError::Url(place.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| WeatherError::Url(place.to_string()))?
            .pop_if_empty()
            .push(place);
        url.set_query(Some(LOOKUP_QUERY));
        Ok(url)
    }
}
