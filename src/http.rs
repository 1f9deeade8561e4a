//! Deadline-bound JSON GET shared by the service clients

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AirSightError, ServiceFailure, Stage};

/// Responses slower than this get a warning
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

fn failure(stage: Stage, failure: ServiceFailure) -> AirSightError {
    match stage {
        Stage::Geocoding => AirSightError::Geocoding(failure),
        Stage::AirQuality => AirSightError::AirQualityApi(failure),
    }
}

/// GET `url` and decode the body as `T`, giving up after `deadline`.
///
/// The whole exchange (connect, headers, body) runs under one deadline. When it
/// fires the request future is dropped, which aborts the call, and the caller
/// gets [`AirSightError::Timeout`].
#[instrument(skip(client, url, stage), fields(stage = %stage))]
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    stage: Stage,
    deadline: Duration,
) -> crate::Result<T> {
    debug!("Request URL: {}", url);
    let start = Instant::now();

    let result = tokio::time::timeout(deadline, exchange(client, url, stage, deadline)).await;
    let elapsed = start.elapsed();

    match result {
        Ok(Ok(body)) => {
            info!("Successful {} request in {:.3}s", stage, elapsed.as_secs_f64());
            if elapsed > SLOW_RESPONSE {
                warn!("Slow {} response: {:.3}s", stage, elapsed.as_secs_f64());
            }
            Ok(body)
        }
        Ok(Err(e)) => {
            error!("{} request failed after {:.3}s: {}", stage, elapsed.as_secs_f64(), e);
            Err(e)
        }
        Err(_) => {
            error!("{} request cancelled after {:?} deadline", stage, deadline);
            Err(AirSightError::timeout(stage, deadline))
        }
    }
}

async fn exchange<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    stage: Stage,
    deadline: Duration,
) -> crate::Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AirSightError::from_reqwest(stage, deadline, &e))?;

    let status = response.status();
    debug!("HTTP response received: {}", status);
    if !status.is_success() {
        warn!(
            "{} service returned {} {}",
            stage,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        );
        return Err(failure(stage, ServiceFailure::Status(status.as_u16())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AirSightError::from_reqwest(stage, deadline, &e))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| failure(stage, ServiceFailure::MalformedPayload(e.to_string())))
}
