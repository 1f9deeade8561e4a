//! Location query and geocoded coordinates

use serde::{Deserialize, Serialize};

/// A validated, trimmed location entered by the user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub city: String,
    /// State, province or region
    pub region: String,
    pub country: String,
}

impl LocationQuery {
    #[must_use]
    pub fn new(city: impl Into<String>, region: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            region: region.into(),
            country: country.into(),
        }
    }

    /// Free-text search string sent to the geocoder
    #[must_use]
    pub fn full_location(&self) -> String {
        format!("{}, {}, {}", self.city, self.region, self.country)
    }
}

/// Address fragments returned alongside a geocoding hit
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// Resolved location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Full name as reported by the geocoder
    pub display_name: String,
    pub address: Address,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            display_name: display_name.into(),
            address: Address::default(),
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Best short name for headers: city, then town, then village, then what the user typed
    #[must_use]
    pub fn place_name<'a>(&'a self, query: &'a LocationQuery) -> &'a str {
        self.address
            .city
            .as_deref()
            .or(self.address.town.as_deref())
            .or(self.address.village.as_deref())
            .unwrap_or(&query.city)
    }
}
