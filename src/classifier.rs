//! AQI classification and main pollutant selection
//!
//! Maps the indices reported by the air quality service onto six severity
//! levels with a label, display color, description and health advice, and
//! works out which tracked pollutant stands furthest above its reference
//! threshold.

use serde::Serialize;

use crate::models::AirQualitySnapshot;

/// Unit shown when the service does not report one
pub const DEFAULT_UNIT: &str = "μg/m³";

/// Which index a classification was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AqiScale {
    European,
    Us,
}

impl AqiScale {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AqiScale::European => "European AQI",
            AqiScale::Us => "US AQI",
        }
    }
}

/// One of the six severity bands shared by both scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AqiLevel {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
}

impl AqiLevel {
    pub const ALL: [AqiLevel; 6] = [
        AqiLevel::One,
        AqiLevel::Two,
        AqiLevel::Three,
        AqiLevel::Four,
        AqiLevel::Five,
        AqiLevel::Six,
    ];

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            AqiLevel::One => 1,
            AqiLevel::Two => 2,
            AqiLevel::Three => 3,
            AqiLevel::Four => 4,
            AqiLevel::Five => 5,
            AqiLevel::Six => 6,
        }
    }

    /// Round to the nearest whole level and clamp into `[1, 6]`
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        match value.round() {
            v if v <= 1.0 => AqiLevel::One,
            v if v <= 2.0 => AqiLevel::Two,
            v if v <= 3.0 => AqiLevel::Three,
            v if v <= 4.0 => AqiLevel::Four,
            v if v <= 5.0 => AqiLevel::Five,
            _ => AqiLevel::Six,
        }
    }

    /// Band a raw US AQI value using the EPA breakpoints
    #[must_use]
    pub fn us_band(us_aqi: f64) -> Self {
        if us_aqi <= 50.0 {
            AqiLevel::One
        } else if us_aqi <= 100.0 {
            AqiLevel::Two
        } else if us_aqi <= 150.0 {
            AqiLevel::Three
        } else if us_aqi <= 200.0 {
            AqiLevel::Four
        } else if us_aqi <= 300.0 {
            AqiLevel::Five
        } else {
            AqiLevel::Six
        }
    }
}

/// Display record for one (scale, level) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub advice: &'static str,
}

const fn info(
    label: &'static str,
    color: &'static str,
    description: &'static str,
    advice: &'static str,
) -> LevelInfo {
    LevelInfo {
        label,
        color,
        description,
        advice,
    }
}

/// Look up the display record. Exhaustive over both scales and all six levels.
#[must_use]
pub fn level_info(scale: AqiScale, level: AqiLevel) -> LevelInfo {
    use AqiLevel::*;
    match (scale, level) {
        (AqiScale::European, One) => info(
            "Good",
            "#00e400",
            "Air quality is satisfactory",
            "Enjoy outdoor activities!",
        ),
        (AqiScale::European, Two) => info(
            "Fair",
            "#ffff00",
            "Air quality is acceptable for most people",
            "Normal conditions for most people.",
        ),
        (AqiScale::European, Three) => info(
            "Moderate",
            "#ff7e00",
            "Sensitive groups may experience minor symptoms",
            "Sensitive people should consider reducing prolonged outdoor activity.",
        ),
        (AqiScale::European, Four) => info(
            "Poor",
            "#ff0000",
            "Harmful for sensitive groups",
            "Sensitive groups should avoid outdoor activity.",
        ),
        (AqiScale::European, Five) => info(
            "Very poor",
            "#8f3f97",
            "Harmful for everyone",
            "Everyone should avoid outdoor activity.",
        ),
        (AqiScale::European, Six) => info(
            "Extremely poor",
            "#7e0023",
            "Health emergency",
            "Avoid going outside. Seek medical attention if needed.",
        ),
        (AqiScale::Us, One) => info(
            "Good",
            "#00e400",
            "Air quality is satisfactory",
            "Enjoy outdoor activities!",
        ),
        (AqiScale::Us, Two) => info(
            "Moderate",
            "#ffff00",
            "Acceptable for most people",
            "Acceptable conditions for outdoor activities.",
        ),
        (AqiScale::Us, Three) => info(
            "Unhealthy for sensitive groups",
            "#ff7e00",
            "Sensitive groups may have problems",
            "Sensitive groups should consider reducing prolonged outdoor activity.",
        ),
        (AqiScale::Us, Four) => info(
            "Unhealthy",
            "#ff0000",
            "Everyone may begin to feel effects",
            "Everyone should reduce prolonged outdoor activity.",
        ),
        (AqiScale::Us, Five) => info(
            "Very unhealthy",
            "#8f3f97",
            "Health alert",
            "Everyone should avoid outdoor activity.",
        ),
        (AqiScale::Us, Six) => info(
            "Hazardous",
            "#7e0023",
            "Health emergency",
            "Stay indoors. Health emergency.",
        ),
    }
}

/// Result of classifying a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiClassification {
    /// Index as reported, unclamped. `None` when no index was usable.
    pub value: Option<f64>,
    pub scale: Option<AqiScale>,
    pub level: Option<AqiLevel>,
    pub label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub health_advice: Option<&'static str>,
}

impl AqiClassification {
    fn from_level(value: f64, scale: AqiScale, level: AqiLevel) -> Self {
        let info = level_info(scale, level);
        Self {
            value: Some(value),
            scale: Some(scale),
            level: Some(level),
            label: info.label,
            color: info.color,
            description: info.description,
            health_advice: Some(info.advice),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            value: None,
            scale: None,
            level: None,
            label: "Data unavailable",
            color: "#888",
            description: "AQI data is not available for this location",
            health_advice: None,
        }
    }

    #[must_use]
    pub fn scale_name(&self) -> &'static str {
        self.scale.map_or("AQI", AqiScale::name)
    }

    /// Index for display, `N/A` when missing
    #[must_use]
    pub fn display_value(&self) -> String {
        self.value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
    }
}

/// Classify a snapshot. A positive European index always takes precedence over the US one.
#[must_use]
pub fn classify(snapshot: &AirQualitySnapshot) -> AqiClassification {
    if let Some(european) = snapshot.european_aqi.filter(|v| *v > 0.0) {
        return AqiClassification::from_level(
            european,
            AqiScale::European,
            AqiLevel::clamped(european),
        );
    }

    if let Some(us) = snapshot.us_aqi.filter(|v| *v > 0.0) {
        return AqiClassification::from_level(us, AqiScale::Us, AqiLevel::us_band(us));
    }

    AqiClassification::unavailable()
}

/// The six tracked pollutants, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pollutant {
    Pm10,
    Pm2_5,
    CarbonMonoxide,
    NitrogenDioxide,
    SulphurDioxide,
    Ozone,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm10,
        Pollutant::Pm2_5,
        Pollutant::CarbonMonoxide,
        Pollutant::NitrogenDioxide,
        Pollutant::SulphurDioxide,
        Pollutant::Ozone,
    ];

    /// Field name used by the air quality service
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Pm2_5 => "pm2_5",
            Pollutant::CarbonMonoxide => "carbon_monoxide",
            Pollutant::NitrogenDioxide => "nitrogen_dioxide",
            Pollutant::SulphurDioxide => "sulphur_dioxide",
            Pollutant::Ozone => "ozone",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm2_5 => "PM2.5",
            Pollutant::CarbonMonoxide => "CO",
            Pollutant::NitrogenDioxide => "NO₂",
            Pollutant::SulphurDioxide => "SO₂",
            Pollutant::Ozone => "O₃",
        }
    }

    /// Reference concentration, in the units the service reports
    #[must_use]
    pub fn reference_threshold(self) -> f64 {
        match self {
            Pollutant::Pm10 => 50.0,
            Pollutant::Pm2_5 => 25.0,
            Pollutant::CarbonMonoxide => 10_000.0,
            Pollutant::NitrogenDioxide => 40.0,
            Pollutant::SulphurDioxide => 20.0,
            Pollutant::Ozone => 120.0,
        }
    }

    #[must_use]
    pub fn value_in(self, snapshot: &AirQualitySnapshot) -> Option<f64> {
        match self {
            Pollutant::Pm10 => snapshot.pm10,
            Pollutant::Pm2_5 => snapshot.pm2_5,
            Pollutant::CarbonMonoxide => snapshot.carbon_monoxide,
            Pollutant::NitrogenDioxide => snapshot.nitrogen_dioxide,
            Pollutant::SulphurDioxide => snapshot.sulphur_dioxide,
            Pollutant::Ozone => snapshot.ozone,
        }
    }

    #[must_use]
    pub fn unit_in(self, snapshot: &AirQualitySnapshot) -> &str {
        let units = &snapshot.units;
        let unit = match self {
            Pollutant::Pm10 => &units.pm10,
            Pollutant::Pm2_5 => &units.pm2_5,
            Pollutant::CarbonMonoxide => &units.carbon_monoxide,
            Pollutant::NitrogenDioxide => &units.nitrogen_dioxide,
            Pollutant::SulphurDioxide => &units.sulphur_dioxide,
            Pollutant::Ozone => &units.ozone,
        };
        unit.as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT)
    }
}

/// Pollutant whose value/threshold ratio is strictly the largest.
///
/// Zero and missing readings never qualify. On a tie the earlier pollutant in
/// [`Pollutant::ALL`] wins.
#[must_use]
pub fn main_pollutant(snapshot: &AirQualitySnapshot) -> Option<Pollutant> {
    let mut best: Option<(Pollutant, f64)> = None;
    for pollutant in Pollutant::ALL {
        let Some(value) = pollutant.value_in(snapshot).filter(|v| *v != 0.0) else {
            continue;
        };
        let ratio = value / pollutant.reference_threshold();
        if ratio > best.map_or(0.0, |(_, r)| r) {
            best = Some((pollutant, ratio));
        }
    }
    best.map(|(pollutant, _)| pollutant)
}

/// One row of the pollutant grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub name: &'static str,
    /// Raw reading as reported
    pub raw: f64,
    /// Rounded to one decimal for display
    pub value: String,
    pub unit: String,
    pub is_main: bool,
}

/// Round a reading to one decimal place, halves away from zero
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Reported pollutants in display order. Missing readings are dropped, zero is kept.
#[must_use]
pub fn format_pollutants(snapshot: &AirQualitySnapshot) -> Vec<PollutantReading> {
    let main = main_pollutant(snapshot);
    Pollutant::ALL
        .into_iter()
        .filter_map(|pollutant| {
            pollutant.value_in(snapshot).map(|raw| PollutantReading {
                pollutant,
                name: pollutant.display_name(),
                raw,
                value: format_value(raw),
                unit: pollutant.unit_in(snapshot).to_string(),
                is_main: main == Some(pollutant),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PollutantUnits;
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::collections::HashSet;

    fn snapshot() -> AirQualitySnapshot {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        AirQualitySnapshot::empty(ts, "America/Sao_Paulo")
    }

    #[rstest]
    #[case(1.0, "Good")]
    #[case(2.0, "Fair")]
    #[case(3.0, "Moderate")]
    #[case(4.0, "Poor")]
    #[case(5.0, "Very poor")]
    #[case(6.0, "Extremely poor")]
    fn test_european_levels_use_exact_table_entry(#[case] value: f64, #[case] label: &str) {
        let mut snap = snapshot();
        snap.european_aqi = Some(value);

        let result = classify(&snap);
        assert_eq!(result.scale, Some(AqiScale::European));
        assert_eq!(result.label, label);
        assert_eq!(result.value, Some(value));
        assert_eq!(result.level.map(AqiLevel::number), Some(value as u8));
    }

    #[test]
    fn test_european_out_of_range_clamps_for_display() {
        let mut snap = snapshot();
        snap.european_aqi = Some(10.0);

        let result = classify(&snap);
        assert_eq!(result.label, "Extremely poor");
        assert_eq!(result.level, Some(AqiLevel::Six));
        assert_eq!(result.value, Some(10.0));
        assert_eq!(result.display_value(), "10");
        assert_eq!(
            result.health_advice,
            Some("Avoid going outside. Seek medical attention if needed.")
        );
    }

    #[test]
    fn test_european_wins_over_us() {
        let mut snap = snapshot();
        snap.european_aqi = Some(2.0);
        snap.us_aqi = Some(75.0);

        let result = classify(&snap);
        assert_eq!(result.scale, Some(AqiScale::European));
        assert_eq!(result.value, Some(2.0));
        assert_eq!(result.scale_name(), "European AQI");
    }

    #[test]
    fn test_zero_european_falls_through_to_us() {
        let mut snap = snapshot();
        snap.european_aqi = Some(0.0);
        snap.us_aqi = Some(120.0);

        let result = classify(&snap);
        assert_eq!(result.scale, Some(AqiScale::Us));
        assert_eq!(result.label, "Unhealthy for sensitive groups");
    }

    #[test]
    fn test_us_only_moderate() {
        let mut snap = snapshot();
        snap.us_aqi = Some(75.0);

        let result = classify(&snap);
        assert_eq!(result.scale, Some(AqiScale::Us));
        assert_eq!(result.level, Some(AqiLevel::Two));
        assert_eq!(result.label, "Moderate");
        assert_eq!(
            result.health_advice,
            Some("Acceptable conditions for outdoor activities.")
        );
    }

    #[rstest]
    #[case(1.0, AqiLevel::One)]
    #[case(50.0, AqiLevel::One)]
    #[case(50.5, AqiLevel::Two)]
    #[case(100.0, AqiLevel::Two)]
    #[case(150.0, AqiLevel::Three)]
    #[case(200.0, AqiLevel::Four)]
    #[case(300.0, AqiLevel::Five)]
    #[case(301.0, AqiLevel::Six)]
    fn test_us_band_breakpoints(#[case] value: f64, #[case] expected: AqiLevel) {
        assert_eq!(AqiLevel::us_band(value), expected);
    }

    #[test]
    fn test_no_index_is_unavailable() {
        let mut snap = snapshot();
        snap.us_aqi = Some(0.0);

        let result = classify(&snap);
        assert_eq!(result, AqiClassification::unavailable());
        assert_eq!(result.display_value(), "N/A");
        assert_eq!(result.scale_name(), "AQI");
        assert!(result.health_advice.is_none());
    }

    #[test]
    fn test_every_level_has_distinct_labels_per_scale() {
        for scale in [AqiScale::European, AqiScale::Us] {
            let labels: Vec<_> = AqiLevel::ALL
                .iter()
                .map(|level| level_info(scale, *level).label)
                .collect();
            let distinct: HashSet<_> = labels.iter().collect();
            assert_eq!(labels.len(), distinct.len());
        }
    }

    #[test]
    fn test_main_pollutant_largest_ratio() {
        let mut snap = snapshot();
        snap.pm10 = Some(25.0);
        snap.pm2_5 = Some(30.0);
        snap.carbon_monoxide = Some(5000.0);
        snap.nitrogen_dioxide = Some(20.0);
        snap.sulphur_dioxide = Some(10.0);
        snap.ozone = Some(60.0);

        assert_eq!(main_pollutant(&snap), Some(Pollutant::Pm2_5));
    }

    #[test]
    fn test_main_pollutant_tie_keeps_first() {
        let mut snap = snapshot();
        snap.pm10 = Some(50.0);
        snap.ozone = Some(120.0);

        assert_eq!(main_pollutant(&snap), Some(Pollutant::Pm10));
    }

    #[test]
    fn test_main_pollutant_none_without_values() {
        let mut snap = snapshot();
        assert_eq!(main_pollutant(&snap), None);

        snap.pm10 = Some(0.0);
        assert_eq!(main_pollutant(&snap), None);
    }

    #[test]
    fn test_format_keeps_zero_and_drops_missing() {
        let mut snap = snapshot();
        snap.pm10 = Some(0.0);
        snap.ozone = Some(42.0);

        let readings = format_pollutants(&snap);
        let names: Vec<_> = readings.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["PM10", "O₃"]);
        assert_eq!(readings[0].value, "0.0");
        assert!(!readings[0].is_main);
        assert!(readings[1].is_main);
    }

    #[rstest]
    #[case(25.789, "25.8")]
    #[case(15.123, "15.1")]
    #[case(0.0, "0.0")]
    #[case(12.25, "12.3")]
    #[case(0.25, "0.3")]
    fn test_format_value(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_value(value), expected);
    }

    #[test]
    fn test_units_fall_back_to_default() {
        let mut snap = snapshot();
        snap.pm10 = Some(10.0);
        snap.carbon_monoxide = Some(300.0);
        snap.units = PollutantUnits {
            carbon_monoxide: Some("ppb".into()),
            ..Default::default()
        };

        let readings = format_pollutants(&snap);
        assert_eq!(readings[0].unit, DEFAULT_UNIT);
        assert_eq!(readings[1].unit, "ppb");
    }
}
