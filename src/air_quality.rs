//! Air quality client for the Open-Meteo air quality API

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::AirQualityConfig;
use crate::error::{AirSightError, ServiceFailure, Stage};
use crate::http;
use crate::models::{AirQualitySnapshot, Coordinates, PollutantUnits};

/// Fields requested in the `current` block
pub const CURRENT_FIELDS: &str = "european_aqi,us_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,sulphur_dioxide,ozone";

/// Anything that can report current air quality for a point
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    async fn fetch_air_quality(&self, coordinates: &Coordinates) -> crate::Result<AirQualitySnapshot>;
}

/// Open-Meteo API response structures
mod openmeteo {
    use super::PollutantUnits;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct AirQualityResponse {
        pub timezone: Option<String>,
        pub current: Option<CurrentData>,
        #[serde(default)]
        pub current_units: Option<PollutantUnits>,
    }

    /// Current block. Each pollutant may be absent or `null`.
    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub time: String,
        pub european_aqi: Option<f64>,
        pub us_aqi: Option<f64>,
        pub pm10: Option<f64>,
        pub pm2_5: Option<f64>,
        pub carbon_monoxide: Option<f64>,
        pub nitrogen_dioxide: Option<f64>,
        pub sulphur_dioxide: Option<f64>,
        pub ozone: Option<f64>,
    }
}

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

impl openmeteo::AirQualityResponse {
    /// A response without a `current` block means the service has no data for this point
    fn into_snapshot(self) -> crate::Result<AirQualitySnapshot> {
        let current = self
            .current
            .ok_or(AirSightError::AirQualityApi(ServiceFailure::MissingData))?;

        let timestamp = parse_time(&current.time).ok_or_else(|| {
            AirSightError::AirQualityApi(ServiceFailure::MalformedPayload(format!(
                "invalid measurement time: {:?}",
                current.time
            )))
        })?;

        Ok(AirQualitySnapshot {
            timestamp,
            timezone: self.timezone.unwrap_or_else(|| "GMT".to_string()),
            european_aqi: current.european_aqi,
            us_aqi: current.us_aqi,
            pm10: current.pm10,
            pm2_5: current.pm2_5,
            carbon_monoxide: current.carbon_monoxide,
            nitrogen_dioxide: current.nitrogen_dioxide,
            sulphur_dioxide: current.sulphur_dioxide,
            ozone: current.ozone,
            units: self.current_units.unwrap_or_default(),
        })
    }
}

/// Open-Meteo air quality client
pub struct OpenMeteoAirQualityClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoAirQualityClient {
    /// Create a new air quality client
    pub fn new(config: &AirQualityConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(format!("AirSight/{}", crate::VERSION))
            .build()
            .map_err(|e| AirSightError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        })
    }

    fn current_url(&self, coordinates: &Coordinates) -> String {
        format!(
            "{}?latitude={}&longitude={}&current={}&timezone=auto",
            self.base_url, coordinates.latitude, coordinates.longitude, CURRENT_FIELDS
        )
    }
}

#[async_trait]
impl AirQualitySource for OpenMeteoAirQualityClient {
    #[instrument(skip(self, coordinates), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn fetch_air_quality(&self, coordinates: &Coordinates) -> crate::Result<AirQualitySnapshot> {
        info!(
            "Getting current air quality for coordinates: {}",
            coordinates.format_coordinates()
        );

        let response: openmeteo::AirQualityResponse = http::get_json(
            &self.client,
            &self.current_url(coordinates),
            Stage::AirQuality,
            self.timeout,
        )
        .await?;

        if response.current.is_none() {
            warn!(
                "No current air quality block for {}",
                coordinates.format_coordinates()
            );
        }

        let snapshot = response.into_snapshot()?;
        debug!(
            "Air quality at {}: european_aqi={:?} us_aqi={:?}",
            snapshot.timestamp, snapshot.european_aqi, snapshot.us_aqi
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> crate::Result<AirQualitySnapshot> {
        let response: openmeteo::AirQualityResponse = serde_json::from_str(json).unwrap();
        response.into_snapshot()
    }

    #[test]
    fn test_current_url() {
        let client = OpenMeteoAirQualityClient::new(&AirQualityConfig::default()).unwrap();
        let url = client.current_url(&Coordinates::new(-23.5505, -46.6333, "São Paulo"));
        assert_eq!(
            url,
            format!(
                "https://air-quality-api.open-meteo.com/v1/air-quality?latitude=-23.5505&longitude=-46.6333&current={CURRENT_FIELDS}&timezone=auto"
            )
        );
    }

    #[test]
    fn test_full_response_maps_to_snapshot() {
        let snapshot = parse(
            r#"{
                "latitude": -23.5, "longitude": -46.625,
                "timezone": "America/Sao_Paulo",
                "current_units": {"time": "iso8601", "pm10": "μg/m³", "carbon_monoxide": "μg/m³"},
                "current": {"time": "2024-01-15T12:00", "interval": 3600,
                            "european_aqi": 35, "us_aqi": 58, "pm10": 25.789,
                            "pm2_5": 15.123, "carbon_monoxide": 250.0,
                            "nitrogen_dioxide": null, "sulphur_dioxide": 0.0, "ozone": 60.0}
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.timezone, "America/Sao_Paulo");
        assert_eq!(snapshot.european_aqi, Some(35.0));
        assert_eq!(snapshot.pm10, Some(25.789));
        assert_eq!(snapshot.nitrogen_dioxide, None);
        assert_eq!(snapshot.sulphur_dioxide, Some(0.0));
        assert_eq!(snapshot.units.pm10.as_deref(), Some("μg/m³"));
        assert_eq!(snapshot.units.ozone, None);
        assert_eq!(snapshot.timestamp.to_string(), "2024-01-15 12:00:00");
    }

    #[test]
    fn test_missing_current_is_missing_data() {
        let err = parse(r#"{"timezone": "GMT"}"#).unwrap_err();
        assert!(matches!(
            err,
            AirSightError::AirQualityApi(ServiceFailure::MissingData)
        ));
    }

    #[test]
    fn test_bad_time_is_malformed() {
        let err = parse(r#"{"current": {"time": "yesterday"}}"#).unwrap_err();
        assert!(matches!(
            err,
            AirSightError::AirQualityApi(ServiceFailure::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_timezone_defaults_to_gmt() {
        let snapshot = parse(r#"{"current": {"time": "2024-01-15T12:00:00"}}"#).unwrap();
        assert_eq!(snapshot.timezone, "GMT");
        assert_eq!(snapshot.us_aqi, None);
    }
}
