//! Form controller
//!
//! Drives one form through `Idle -> Validating -> Submitting -> Success | Failed`.
//! Only one submission runs at a time: a submit or retry that arrives while
//! another is in flight is ignored. The two service calls of a submission are
//! strictly sequential since the air quality lookup needs the coordinates.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::air_quality::{AirQualitySource, OpenMeteoAirQualityClient};
use crate::config::{AirSightConfig, FormConfig};
use crate::error::AirSightError;
use crate::geocoding::{Geocoder, NominatimClient};
use crate::models::LocationQuery;
use crate::report::AirQualityReport;
use crate::validation::{self, FormInput, ValidationErrors};

/// Where the form currently is
#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    /// Editable, nothing in flight
    Idle,
    Validating,
    Submitting,
    /// Report shown until the next submission
    Success(Box<AirQualityReport>),
    /// Last error surfaced to the user
    Failed { message: String, retryable: bool },
}

/// What a call to [`FormController::submit`] or [`FormController::retry`] did
#[derive(Debug)]
pub enum SubmitOutcome {
    Rendered(AirQualityReport),
    /// Field checks failed; no service was called
    Rejected(ValidationErrors),
    Failed(AirSightError),
    /// Another submission is in flight, nothing was done
    Busy,
    /// Retry requested before any valid submission
    NothingToRetry,
}

/// Clears the in-flight flag when the submission ends, even if its future is dropped
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct FormController<G, A> {
    geocoder: G,
    air_quality: A,
    rules: FormConfig,
    in_flight: AtomicBool,
    /// Bumped by `clear` so a late result from an abandoned submission is dropped
    generation: AtomicU64,
    state: Mutex<FormState>,
    last_query: Mutex<Option<LocationQuery>>,
}

impl FormController<NominatimClient, OpenMeteoAirQualityClient> {
    /// Controller wired to the real services
    pub fn from_config(config: &AirSightConfig) -> crate::Result<Self> {
        Ok(Self::new(
            NominatimClient::new(&config.geocoding)?,
            OpenMeteoAirQualityClient::new(&config.air_quality)?,
            config.form.clone(),
        ))
    }
}

impl<G: Geocoder, A: AirQualitySource> FormController<G, A> {
    pub fn new(geocoder: G, air_quality: A, rules: FormConfig) -> Self {
        Self {
            geocoder,
            air_quality,
            rules,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            state: Mutex::new(FormState::Idle),
            last_query: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> FormState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Query a retry would replay
    #[must_use]
    pub fn last_query(&self) -> Option<LocationQuery> {
        self.last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn rules(&self) -> &FormConfig {
        &self.rules
    }

    fn set_state(&self, state: FormState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Validate the form and, if it passes, run the lookup
    #[instrument(skip(self, input))]
    pub async fn submit(&self, input: &FormInput) -> SubmitOutcome {
        let Some(_guard) = InFlight::claim(&self.in_flight) else {
            debug!("Submission ignored: another one is in flight");
            return SubmitOutcome::Busy;
        };

        self.set_state(FormState::Validating);
        let query = match validation::validate_form(input, &self.rules) {
            Ok(query) => query,
            Err(errors) => {
                debug!("Form rejected: {}", errors);
                self.set_state(FormState::Idle);
                return SubmitOutcome::Rejected(errors);
            }
        };

        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(query.clone());

        self.run(query).await
    }

    /// Replay the last validated query
    #[instrument(skip(self))]
    pub async fn retry(&self) -> SubmitOutcome {
        let Some(_guard) = InFlight::claim(&self.in_flight) else {
            debug!("Retry ignored: a submission is in flight");
            return SubmitOutcome::Busy;
        };

        let Some(query) = self.last_query() else {
            return SubmitOutcome::NothingToRetry;
        };
        info!("Retrying lookup for '{}'", query.full_location());
        self.run(query).await
    }

    /// Reset to `Idle`, forget the last query and return a fresh form with the default country
    pub fn clear(&self) -> FormInput {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(FormState::Idle);

        FormInput {
            country: Some(self.rules.default_country.clone()),
            ..FormInput::default()
        }
    }

    async fn run(&self, query: LocationQuery) -> SubmitOutcome {
        let generation = self.generation.load(Ordering::Acquire);
        self.set_state(FormState::Submitting);

        let result = self.lookup(&query).await;

        if self.generation.load(Ordering::Acquire) != generation {
            debug!("Discarding result for '{}': form was cleared", query.full_location());
            return match result {
                Ok(report) => SubmitOutcome::Rendered(report),
                Err(err) => SubmitOutcome::Failed(err),
            };
        }

        match result {
            Ok(report) => {
                info!(
                    "Report ready for '{}': {} {}",
                    query.full_location(),
                    report.classification.scale_name(),
                    report.classification.display_value()
                );
                self.set_state(FormState::Success(Box::new(report.clone())));
                SubmitOutcome::Rendered(report)
            }
            Err(err) => {
                warn!("Lookup for '{}' failed: {}", query.full_location(), err);
                self.set_state(FormState::Failed {
                    message: err.user_message(),
                    retryable: err.is_retryable(),
                });
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Geocode, then fetch air quality, then build the report
    async fn lookup(&self, query: &LocationQuery) -> crate::Result<AirQualityReport> {
        let coordinates = self
            .geocoder
            .geocode(query)
            .await?
            .ok_or_else(|| AirSightError::location_not_found(query.full_location()))?;

        let snapshot = self.air_quality.fetch_air_quality(&coordinates).await?;

        Ok(AirQualityReport::build(query, &coordinates, &snapshot))
    }
}
