//! Form input validation
//!
//! Turns raw, untrimmed form text into a [`LocationQuery`] or a set of
//! per-field errors. Runs synchronously and never touches the network.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FormConfig;
use crate::models::LocationQuery;

const MIN_LENGTH: usize = 2;

/// Form fields that can carry an error annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    City,
    Region,
    Country,
}

impl Field {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Field::City => "City",
            Field::Region => "State/province/region",
            Field::Country => "Country",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new<S: Into<String>>(field: Field, message: S) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field error from one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First error annotated on `field`, if any
    #[must_use]
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Raw form contents, exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub city: String,
    pub region: String,
    pub country: Option<String>,
}

impl FormInput {
    pub fn new<S: Into<String>>(city: S, region: S, country: Option<S>) -> Self {
        Self {
            city: city.into(),
            region: region.into(),
            country: country.map(Into::into),
        }
    }
}

/// Letters (including Latin-1 accented ones), whitespace, hyphens, apostrophes and periods
#[must_use]
pub fn is_valid_text(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| {
            c.is_ascii_alphabetic()
                || ('\u{C0}'..='\u{FF}').contains(&c)
                || c.is_whitespace()
                || matches!(c, '-' | '\'' | '.')
        })
}

/// Check a single field the way the full form check would.
///
/// An empty country is valid: it will be replaced by the default.
pub fn validate_field(field: Field, raw: &str, rules: &FormConfig) -> Result<(), FieldError> {
    let value = raw.trim();

    if value.is_empty() {
        return match field {
            Field::Country => Ok(()),
            Field::City | Field::Region => {
                Err(FieldError::new(field, format!("{field} is required")))
            }
        };
    }

    if value.chars().count() < MIN_LENGTH {
        return Err(FieldError::new(
            field,
            format!("{field} must be at least {MIN_LENGTH} characters"),
        ));
    }

    if rules.strict_characters && !is_valid_text(value) {
        return Err(FieldError::new(
            field,
            format!("{field} contains invalid characters"),
        ));
    }

    Ok(())
}

/// Validate the whole form, collecting every field error.
///
/// On success the values are trimmed and a blank country is replaced by the
/// configured default.
pub fn validate_form(input: &FormInput, rules: &FormConfig) -> Result<LocationQuery, ValidationErrors> {
    let country_raw = input.country.as_deref().unwrap_or("");

    let errors: Vec<FieldError> = [
        (Field::City, input.city.as_str()),
        (Field::Region, input.region.as_str()),
        (Field::Country, country_raw),
    ]
    .into_iter()
    .filter_map(|(field, value)| validate_field(field, value, rules).err())
    .collect();

    if !errors.is_empty() {
        return Err(errors.into());
    }

    let country = match country_raw.trim() {
        "" => rules.default_country.clone(),
        supplied => supplied.to_string(),
    };

    Ok(LocationQuery::new(
        input.city.trim(),
        input.region.trim(),
        country,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rules() -> FormConfig {
        FormConfig::default()
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let input = FormInput::new("  São Paulo ", " SP", Some(" Brasil  "));
        let query = validate_form(&input, &rules()).unwrap();
        assert_eq!(query, LocationQuery::new("São Paulo", "SP", "Brasil"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_blank_country_uses_default(#[case] country: Option<&str>) {
        let input = FormInput::new("Curitiba", "PR", country);
        let query = validate_form(&input, &rules()).unwrap();
        assert_eq!(query.country, rules().default_country);
    }

    #[test]
    fn test_missing_required_fields_collects_all_errors() {
        let input = FormInput::new("", " ", None);
        let errors = validate_form(&input, &rules()).unwrap_err();

        assert_eq!(errors.iter().count(), 2);
        assert_eq!(
            errors.for_field(Field::City).unwrap().message,
            "City is required"
        );
        assert_eq!(
            errors.for_field(Field::Region).unwrap().message,
            "State/province/region is required"
        );
        assert!(errors.for_field(Field::Country).is_none());
    }

    #[rstest]
    #[case(Field::City, "a")]
    #[case(Field::Region, " b ")]
    #[case(Field::Country, "c")]
    fn test_min_length(#[case] field: Field, #[case] value: &str) {
        let err = validate_field(field, value, &rules()).unwrap_err();
        assert!(err.message.contains("at least 2 characters"));
        assert_eq!(err.field, field);
    }

    #[rstest]
    #[case("São Paulo", true)]
    #[case("Saint-Étienne", true)]
    #[case("L'Aquila", true)]
    #[case("St. Louis", true)]
    #[case("Zürich", true)]
    #[case("Paris 75", false)]
    #[case("Berlin!", false)]
    #[case("東京", false)]
    #[case("", false)]
    fn test_allowed_characters(#[case] text: &str, #[case] valid: bool) {
        assert_eq!(is_valid_text(text), valid);
    }

    #[test]
    fn test_strict_characters_can_be_disabled() {
        let mut relaxed = rules();
        relaxed.strict_characters = false;

        assert!(validate_field(Field::City, "Paris 75", &rules()).is_err());
        assert!(validate_field(Field::City, "Paris 75", &relaxed).is_ok());
    }

    #[test]
    fn test_errors_display_joins_messages() {
        let input = FormInput::new("x", "y", Some("1"));
        let errors = validate_form(&input, &rules()).unwrap_err();
        let text = errors.to_string();
        assert!(text.contains("City must be at least 2 characters"));
        assert!(text.contains("; "));
        assert_eq!(errors.iter().count(), 3);
    }
}
