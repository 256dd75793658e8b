use crate::domain::model::Coordinates;
use crate::domain::ports::Geocoder;
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "QuoteFlow-WebForm/1.0";

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by the OpenStreetMap Nominatim search API (no API key needed).
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    client: Client,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        // Nominatim 會拒絕沒有 User-Agent 的請求
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Looks up the best match for `address`. `Ok(None)` means "no such place".
    pub async fn search(&self, address: &str) -> Result<Option<Coordinates>> {
        let query = address.trim();
        if query.is_empty() {
            return Ok(None);
        }

        tracing::debug!("Geocoding request to: {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Geocoding response status: {}", status);
        if !status.is_success() {
            return Err(LeadError::GeocodingError {
                message: format!("geocoding API returned {}", status),
            });
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let Some(place) = places.into_iter().next() else {
            tracing::warn!("Address not found: {}", query);
            return Ok(None);
        };

        let lat = parse_degrees("lat", &place.lat)?;
        let lng = parse_degrees("lon", &place.lon)?;
        Ok(Some(Coordinates::new(lat, lng)))
    }
}

fn parse_degrees(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| LeadError::GeocodingError {
            message: format!("invalid {} value {:?}: {}", name, raw, e),
        })
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, address: &str) -> Option<Coordinates> {
        match self.search(address).await {
            Ok(coords) => coords,
            Err(e) => {
                tracing::error!("❌ Geocoding failed: {}", e);
                None
            }
        }
    }
}
