use crate::types::lat_lon::LatLon;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::provider::GeocodingProvider;
use crate::weather_data::retry::{build_client, get_json, RetryPolicy};
use async_trait::async_trait;
use bon::bon;
use log::{debug, info};
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ONEMAP_SEARCH_URL: &str = "https://www.onemap.gov.sg/api/common/elastic/search";

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    found: u64,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "LATITUDE")]
    latitude: String,
    #[serde(rename = "LONGITUDE")]
    longitude: String,
}

/// Takes the first search hit. `Ok(None)` when nothing matched.
pub(crate) fn parse_search(
    postal_code: &str,
    response: SearchResponse,
) -> Result<Option<LatLon>, WeatherDataError> {
    if response.found == 0 {
        return Ok(None);
    }
    let failure = |message: String| WeatherDataError::GeocodingFailure {
        postal_code: postal_code.to_string(),
        message,
    };
    let first = response
        .results
        .first()
        .ok_or_else(|| failure(format!("{} match(es) reported but no results returned", response.found)))?;
    let latitude = first
        .latitude
        .trim()
        .parse::<f64>()
        .map_err(|e| failure(format!("invalid LATITUDE '{}': {}", first.latitude, e)))?;
    let longitude = first
        .longitude
        .trim()
        .parse::<f64>()
        .map_err(|e| failure(format!("invalid LONGITUDE '{}': {}", first.longitude, e)))?;
    Ok(Some(LatLon(latitude, longitude)))
}

/// [`GeocodingProvider`] backed by the OneMap search API.
#[derive(Debug, Clone)]
pub struct OneMapGeocoder {
    client: ClientWithMiddleware,
    search_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[bon]
impl OneMapGeocoder {
    #[builder]
    pub fn new(
        search_url: Option<String>,
        api_key: Option<String>,
        retry: Option<RetryPolicy>,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherDataError> {
        let retry = retry.unwrap_or_default();
        let client = build_client(
            Client::builder().timeout(timeout.unwrap_or(Duration::from_secs(10))),
            &retry,
        )?;
        Ok(Self {
            client,
            search_url: search_url.unwrap_or_else(|| DEFAULT_ONEMAP_SEARCH_URL.to_string()),
            api_key,
            retry,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl GeocodingProvider for OneMapGeocoder {
    async fn resolve(&self, postal_code: &str) -> Result<Option<LatLon>, WeatherDataError> {
        debug!("Resolving postal code {}", postal_code);
        let query = [
            ("searchVal", postal_code),
            ("returnGeom", "Y"),
            ("getAddrDetails", "N"),
            ("pageNum", "1"),
        ];
        let response: SearchResponse = get_json(
            &self.client,
            &self.retry,
            "onemap-search",
            &self.search_url,
            &query,
            self.api_key.as_deref(),
        )
        .await?;

        let location = parse_search(postal_code, response)?;
        match location {
            Some(LatLon(lat, lon)) => info!("Postal code {} resolved to ({}, {})", postal_code, lat, lon),
            None => info!("Postal code {} not found", postal_code),
        }
        Ok(location)
    }
}
