//! Data models for `AirSight`
//!
//! This module contains the request-scoped domain models:
//! - Location: the user's query and the geocoded coordinates
//! - Air quality: the current measurement snapshot for a point

pub mod air_quality;
pub mod location;

pub use air_quality::{AirQualitySnapshot, PollutantUnits};
pub use location::{Address, Coordinates, LocationQuery};
