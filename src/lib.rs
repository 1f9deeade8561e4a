//! `AirSight` - Current air quality for any city
//!
//! This library resolves a "city, region, country" query to coordinates,
//! fetches the current pollutant measurements for that point, classifies
//! them on the European or US AQI scale and renders a report with health
//! advice.

pub mod air_quality;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod geocoding;
mod http;
pub mod logging;
pub mod models;
pub mod report;
pub mod validation;

// Re-export core types for public API
pub use air_quality::{AirQualitySource, OpenMeteoAirQualityClient};
pub use classifier::{AqiClassification, AqiLevel, AqiScale, Pollutant, PollutantReading};
pub use config::AirSightConfig;
pub use controller::{FormController, FormState, SubmitOutcome};
pub use error::{AirSightError, ServiceFailure, Stage};
pub use geocoding::{Geocoder, NominatimClient};
pub use models::{AirQualitySnapshot, Coordinates, LocationQuery};
pub use report::AirQualityReport;
pub use validation::{Field, FieldError, FormInput, ValidationErrors};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirSightError>;
