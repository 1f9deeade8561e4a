//! Report presentation
//!
//! [`AirQualityReport`] is the view-model for one successful submission. It
//! is built once from the query, the geocoded coordinates and the snapshot,
//! and can then be rendered as an HTML fragment or as plain text.

use std::fmt::Write;

use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

use crate::classifier::{self, AqiClassification, PollutantReading};
use crate::models::{AirQualitySnapshot, Coordinates, LocationQuery};

/// Everything needed to render one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReport {
    pub query: LocationQuery,
    /// Short header name
    pub place_name: String,
    /// Full geocoder display name
    pub display_name: String,
    /// Coordinates to four decimals
    pub coordinates: String,
    pub classification: AqiClassification,
    pub pollutants: Vec<PollutantReading>,
    pub measured_at: String,
    pub timezone: String,
}

impl AirQualityReport {
    #[must_use]
    pub fn build(
        query: &LocationQuery,
        coordinates: &Coordinates,
        snapshot: &AirQualitySnapshot,
    ) -> Self {
        Self {
            query: query.clone(),
            place_name: coordinates.place_name(query).to_string(),
            display_name: coordinates.display_name.clone(),
            coordinates: coordinates.format_coordinates(),
            classification: classifier::classify(snapshot),
            pollutants: classifier::format_pollutants(snapshot),
            measured_at: format_timestamp(snapshot.timestamp, &snapshot.timezone),
            timezone: snapshot.timezone.clone(),
        }
    }

    /// Row flagged as the main pollutant, if any
    #[must_use]
    pub fn main_pollutant(&self) -> Option<&PollutantReading> {
        self.pollutants.iter().find(|p| p.is_main)
    }

    /// Render as an HTML fragment
    #[must_use]
    pub fn render_html(&self) -> String {
        let aqi = &self.classification;
        let mut html = String::new();

        let _ = write!(
            html,
            r#"<div class="air-quality-header">
  <h3>{}</h3>
  <p class="location-details">{}</p>
  <p class="coordinates">Coordinates: {}</p>
</div>
<div class="aqi-main-info">
  <div class="aqi-circle" style="background-color: {}">
    <div class="aqi-value">{}</div>
    <div class="aqi-type">{}</div>
  </div>
  <div class="aqi-description">
    <h4>{}</h4>
    <p>{}</p>
"#,
            escape_html(&self.place_name),
            escape_html(&self.display_name),
            self.coordinates,
            aqi.color,
            escape_html(&aqi.display_value()),
            aqi.scale_name(),
            aqi.label,
            aqi.description,
        );
        if let Some(advice) = aqi.health_advice {
            let _ = writeln!(html, r#"    <div class="health-advice">{advice}</div>"#);
        }
        html.push_str("  </div>\n</div>\n<div class=\"pollutants-grid\">\n");

        for reading in &self.pollutants {
            let class = if reading.is_main {
                "pollutant-card main-pollutant"
            } else {
                "pollutant-card"
            };
            let _ = writeln!(html, r#"  <div class="{class}">"#);
            let _ = writeln!(html, r#"    <div class="pollutant-name">{}</div>"#, reading.name);
            let _ = writeln!(
                html,
                r#"    <div class="pollutant-value">{} {}</div>"#,
                reading.value,
                escape_html(&reading.unit)
            );
            if reading.is_main {
                html.push_str("    <div class=\"main-indicator\">Main pollutant</div>\n");
            }
            html.push_str("  </div>\n");
        }
        html.push_str("</div>\n");

        let _ = write!(
            html,
            r#"<div class="measurement-info">
  <p><strong>Last measurement:</strong> {}</p>
  <p><strong>Time zone:</strong> {}</p>
</div>
"#,
            escape_html(&self.measured_at),
            escape_html(&self.timezone),
        );

        html
    }

    /// Render for a terminal
    #[must_use]
    pub fn render_text(&self) -> String {
        let aqi = &self.classification;
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.place_name);
        if !self.display_name.is_empty() {
            let _ = writeln!(out, "  {}", self.display_name);
        }
        let _ = writeln!(out, "  Coordinates: {}", self.coordinates);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}: {} ({}, {})",
            aqi.scale_name(),
            aqi.display_value(),
            aqi.label,
            aqi.color
        );
        let _ = writeln!(out, "  {}", aqi.description);
        if let Some(advice) = aqi.health_advice {
            let _ = writeln!(out, "  Advice: {advice}");
        }

        if !self.pollutants.is_empty() {
            let _ = writeln!(out);
            for reading in &self.pollutants {
                let marker = if reading.is_main { "  <- main pollutant" } else { "" };
                let _ = writeln!(
                    out,
                    "  {:<6} {:>9} {}{}",
                    reading.name, reading.value, reading.unit, marker
                );
            }
        }

        if let Some(main) = self.main_pollutant() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Main pollutant: {} ({} {})", main.name, main.value, main.unit);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Last measurement: {}", self.measured_at);
        let _ = writeln!(out, "Time zone: {}", self.timezone);
        out
    }
}

/// Format a local wall-clock time as `dd/mm/YYYY HH:MM`, plus the zone abbreviation when the zone is known
#[must_use]
pub fn format_timestamp(timestamp: NaiveDateTime, timezone: &str) -> String {
    let plain = || timestamp.format("%d/%m/%Y %H:%M").to_string();

    let Ok(tz) = timezone.parse::<Tz>() else {
        return plain();
    };
    match tz.from_local_datetime(&timestamp) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            dt.format("%d/%m/%Y %H:%M %Z").to_string()
        }
        // falls inside a DST gap
        LocalResult::None => plain(),
    }
}

/// Escape text for inclusion in HTML element content or attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
