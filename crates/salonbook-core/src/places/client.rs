use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{LruCache, DEFAULT_CAPACITY};
use crate::models::Salon;

pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com";

const NEARBY_SEARCH_PATH: &str = "maps/api/place/nearbysearch/json";

/// Search radius around the user
pub const SEARCH_RADIUS_METERS: u32 = 5000;

const PLACE_TYPE: &str = "beauty_salon";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum PlacesError {
    #[error("Maps API key is not configured")]
    MissingApiKey,

    #[error("{0}")]
    Status(String),

    #[error("Places request failed with HTTP {0}")]
    Http(reqwest::StatusCode),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid places response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    name: Option<String>,
    geometry: Option<Geometry>,
    vicinity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl PlaceResult {
    fn into_salon(self) -> Option<Salon> {
        let location = self.geometry?.location;
        Some(Salon {
            id: self.place_id?,
            name: self.name.unwrap_or_default(),
            latitude: location.lat,
            longitude: location.lng,
            address: self.vicinity,
        })
    }
}

fn parse_nearby_response(body: &str) -> Result<Vec<Salon>, PlacesError> {
    let response: NearbyResponse =
        serde_json::from_str(body).map_err(|e| PlacesError::InvalidResponse(e.to_string()))?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        _ => {
            return Err(PlacesError::Status(
                response
                    .error_message
                    .unwrap_or_else(|| "Failed to fetch salons".to_string()),
            ))
        }
    }

    let total = response.results.len();
    let salons: Vec<Salon> = response
        .results
        .into_iter()
        .filter_map(PlaceResult::into_salon)
        .collect();
    if salons.len() < total {
        warn!(skipped = total - salons.len(), "Skipped places without id or location");
    }
    Ok(salons)
}

/// Client for the nearby salon search.
/// Clone is cheap - clones share the connection pool and the cache.
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: Url,
    api_key: String,
    cache: Arc<Mutex<LruCache<Vec<Salon>>>>,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, PlacesError> {
        let base_url = Url::parse(DEFAULT_PLACES_URL)
            .map_err(|e| PlacesError::InvalidResponse(e.to_string()))?;
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: Url) -> Result<Self, PlacesError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PlacesError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            cache: Arc::new(Mutex::new(LruCache::new(DEFAULT_CAPACITY))),
        })
    }

    fn search_url(&self, latitude: f64, longitude: f64) -> Result<Url, PlacesError> {
        let mut url = self
            .base_url
            .join(NEARBY_SEARCH_PATH)
            .map_err(|e| PlacesError::InvalidResponse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("location", &format!("{},{}", latitude, longitude))
            .append_pair("radius", &SEARCH_RADIUS_METERS.to_string())
            .append_pair("type", PLACE_TYPE)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Salons within `SEARCH_RADIUS_METERS` of the given point
    pub async fn fetch_nearby_salons(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<Salon>, PlacesError> {
        let url = self.search_url(latitude, longitude)?;
        let key = format!("{},{}", latitude, longitude);

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key);
        if let Some(salons) = cached {
            debug!(location = %key, "Nearby salons served from cache");
            return Ok(salons);
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::Http(status));
        }
        let body = response.text().await?;
        let salons = parse_nearby_response(&body)?;
        debug!(count = salons.len(), "Fetched nearby salons");

        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, salons.clone());
        Ok(salons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_response() {
        let body = r#"{
            "status": "OK",
            "html_attributions": [],
            "results": [
                {"place_id": "p1", "name": "Glow Studio", "vicinity": "12 Main St",
                 "geometry": {"location": {"lat": 6.9271, "lng": 79.8612}}, "rating": 4.6},
                {"place_id": "p2", "name": "No Geometry"}
            ]
        }"#;
        let salons = parse_nearby_response(body).unwrap();
        assert_eq!(salons.len(), 1);
        assert_eq!(salons[0].id, "p1");
        assert_eq!(salons[0].address_display(), "12 Main St");
        assert_eq!(salons[0].latitude, 6.9271);
    }

    #[test]
    fn test_zero_results_is_empty() {
        let salons = parse_nearby_response(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert!(salons.is_empty());
    }

    #[test]
    fn test_error_status_uses_server_message() {
        let err = parse_nearby_response(
            r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "The provided API key is invalid.");
    }

    #[test]
    fn test_error_status_default_message() {
        let err = parse_nearby_response(r#"{"status":"OVER_QUERY_LIMIT"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch salons");
    }

    #[test]
    fn test_search_url() {
        let client = PlacesClient::new("k").unwrap();
        let url = client.search_url(6.5, 79.25).unwrap();
        assert_eq!(url.path(), "/maps/api/place/nearbysearch/json");
        assert_eq!(
            url.query(),
            Some("location=6.5%2C79.25&radius=5000&type=beauty_salon&key=k")
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(PlacesClient::new(" "), Err(PlacesError::MissingApiKey)));
    }
}
