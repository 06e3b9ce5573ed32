use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, warn};

use shared::types::ReadingData;

use crate::AppState;
use crate::auth::DeviceIdentity;
use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json, parse_json_body};
use crate::database::readings;

/// POST /api/ingest — a device submits one reading.
///
/// The reading is stored under the device the API key resolved to. The
/// body carries no device id and could not override it if it did.
pub async fn handle_ingest(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    device: DeviceIdentity,
) -> Result<Response<Full<Bytes>>> {
    let data: ReadingData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    if !data.bpm.is_finite() || !data.spo2.is_finite() || !data.temp.is_finite() {
        return deliver_error_json(
            "INVALID_READING",
            "Readings must be finite numbers",
            StatusCode::BAD_REQUEST,
        );
    }

    match readings::insert_reading(&state.db, device.device_id, &data).await {
        Ok(reading_id) => {
            debug!(
                "Stored reading {} for device {} (owner {})",
                reading_id, device.device_id, device.owner_user_id
            );
            deliver_serialized_json(
                &serde_json::json!({
                    "status": "success",
                    "data": { "id": reading_id, "device_id": device.device_id }
                }),
                StatusCode::CREATED,
            )
        }
        Err(e) => {
            warn!("Ingest failed for device {}: {}", device.device_id, e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
