//! Account point balance.

use tracing::{debug, info};

use crate::config::Endpoints;
use crate::error::ClientError;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::wire::{Envelope, PointData};

/// The balance endpoint reports hundredths of a point.
const POINT_SCALE: f64 = 100.0;

/// Request for the daily login reward. Claiming twice on one day is harmless.
pub(crate) fn daily_bonus_request(endpoints: &Endpoints) -> HttpRequest {
    HttpRequest::get(endpoints.daily_bonus()).query("activity", "login_bonus_daily")
}

fn decode<T: serde::de::DeserializeOwned>(
    response: HttpResponse,
    what: &str,
) -> Result<Envelope<T>, ClientError> {
    let envelope: Envelope<T> = response
        .json()
        .map_err(|e| ClientError::Account(format!("{what}: {e}")))?;
    if envelope.status != Some(200) {
        return Err(ClientError::Account(format!(
            "{what} returned status {:?}: {}",
            envelope.status,
            envelope.message.unwrap_or_default()
        )));
    }
    Ok(envelope)
}

/// Read the current point balance.
///
/// The balance is only served after the day's bonus has been claimed, so the
/// claim is repeated first.
pub async fn read_points(
    transport: &dyn Transport,
    endpoints: &Endpoints,
) -> Result<f64, ClientError> {
    let bonus = transport.send(daily_bonus_request(endpoints)).await?;
    decode::<serde_json::Value>(bonus, "daily bonus")?;
    debug!("Daily bonus confirmed");

    let response = transport
        .send(HttpRequest::get(endpoints.account_point()))
        .await?;
    let envelope = decode::<PointData>(response, "point balance")?;
    let total = envelope
        .data
        .ok_or_else(|| ClientError::Account("point balance has no data".to_string()))?
        .total;

    let points = total as f64 / POINT_SCALE;
    info!(points, "Account balance");
    Ok(points)
}
