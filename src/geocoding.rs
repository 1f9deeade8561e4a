//! Geocoding client for the Nominatim search API
//!
//! Resolves a free-text "city, region, country" query into coordinates.
//! An empty result set is not an error: the client returns `Ok(None)` and
//! leaves it to the caller to report the location as not found.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::error::{AirSightError, ServiceFailure, Stage};
use crate::http;
use crate::models::{Address, Coordinates, LocationQuery};

/// Anything that can turn a location query into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service knows no such place
    async fn geocode(&self, query: &LocationQuery) -> crate::Result<Option<Coordinates>>;
}

/// One search hit as returned with `format=json&addressdetails=1`
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: Address,
}

impl NominatimPlace {
    fn into_coordinates(self) -> crate::Result<Coordinates> {
        let parse = |field: &str, raw: &str| {
            raw.trim().parse::<f64>().map_err(|_| {
                AirSightError::Geocoding(ServiceFailure::MalformedPayload(format!(
                    "invalid {field}: {raw:?}"
                )))
            })
        };
        let latitude = parse("lat", &self.lat)?;
        let longitude = parse("lon", &self.lon)?;

        Ok(Coordinates::new(latitude, longitude, self.display_name).with_address(self.address))
    }
}

/// Nominatim search client
pub struct NominatimClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl NominatimClient {
    /// Create a new geocoding client
    pub fn new(config: &GeocodingConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AirSightError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        })
    }

    fn search_url(&self, query: &LocationQuery) -> String {
        format!(
            "{}?q={}&format=json&limit=1&addressdetails=1",
            self.base_url,
            urlencoding::encode(&query.full_location())
        )
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self, query), fields(location = %query.full_location()))]
    async fn geocode(&self, query: &LocationQuery) -> crate::Result<Option<Coordinates>> {
        info!("Geocoding location: '{}'", query.full_location());

        let places: Vec<NominatimPlace> =
            http::get_json(&self.client, &self.search_url(query), Stage::Geocoding, self.timeout)
                .await?;

        let Some(place) = places.into_iter().next() else {
            warn!("No results found for location '{}'", query.full_location());
            return Ok(None);
        };

        let coordinates = place.into_coordinates()?;
        debug!(
            "Found location: {} ({})",
            coordinates.display_name,
            coordinates.format_coordinates()
        );
        Ok(Some(coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let client = NominatimClient::new(&GeocodingConfig::default()).unwrap();
        let url = client.search_url(&LocationQuery::new("São Paulo", "SP", "Brasil"));
        assert_eq!(
            url,
            "https://nominatim.openstreetmap.org/search?q=S%C3%A3o%20Paulo%2C%20SP%2C%20Brasil&format=json&limit=1&addressdetails=1"
        );
    }

    #[test]
    fn test_place_parses_string_coordinates() {
        let place: NominatimPlace = serde_json::from_str(
            r#"{"lat":"-23.5505","lon":"-46.6333","display_name":"São Paulo, Brasil",
                "address":{"city":"São Paulo","state":"São Paulo","country":"Brasil","postcode":"01000"}}"#,
        )
        .unwrap();

        let coords = place.into_coordinates().unwrap();
        assert_eq!(coords.latitude, -23.5505);
        assert_eq!(coords.longitude, -46.6333);
        assert_eq!(coords.address.city.as_deref(), Some("São Paulo"));
    }

    #[test]
    fn test_place_without_address_gets_empty_fragments() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat":"0","lon":"0","display_name":"Null Island"}"#).unwrap();
        let coords = place.into_coordinates().unwrap();
        assert_eq!(coords.address, Address::default());
    }

    #[test]
    fn test_place_with_bad_latitude_is_malformed() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat":"north","lon":"0"}"#).unwrap();
        let err = place.into_coordinates().unwrap_err();
        assert!(matches!(
            err,
            AirSightError::Geocoding(ServiceFailure::MalformedPayload(_))
        ));
    }
}
