//! Air quality snapshot model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Unit strings as reported per pollutant. Missing entries fall back to µg/m³ when displayed.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PollutantUnits {
    pub pm10: Option<String>,
    pub pm2_5: Option<String>,
    pub carbon_monoxide: Option<String>,
    pub nitrogen_dioxide: Option<String>,
    pub sulphur_dioxide: Option<String>,
    pub ozone: Option<String>,
}

/// Current air quality for one point.
///
/// Every measurement is optional: `None` means the service did not report
/// it, which is not the same thing as a reading of zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQualitySnapshot {
    /// Measurement time, local wall-clock time in `timezone`
    pub timestamp: NaiveDateTime,
    /// IANA zone name, e.g. `America/Sao_Paulo`
    pub timezone: String,
    pub european_aqi: Option<f64>,
    pub us_aqi: Option<f64>,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub ozone: Option<f64>,
    pub units: PollutantUnits,
}

impl AirQualitySnapshot {
    /// Snapshot with no measurements at all
    #[must_use]
    pub fn empty(timestamp: NaiveDateTime, timezone: impl Into<String>) -> Self {
        Self {
            timestamp,
            timezone: timezone.into(),
            european_aqi: None,
            us_aqi: None,
            pm10: None,
            pm2_5: None,
            carbon_monoxide: None,
            nitrogen_dioxide: None,
            sulphur_dioxide: None,
            ozone: None,
            units: PollutantUnits::default(),
        }
    }
}
