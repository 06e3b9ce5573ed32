use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::ReadingInfo;

use crate::AppState;
use crate::auth::{Identity, require_device_access};
use crate::database::readings;
use crate::handlers::http::utils::{deliver_auth_error, deliver_error_json, deliver_success_json};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

fn query_limit(req: &Request<hyper::body::Incoming>) -> i64 {
    req.uri()
        .query()
        .and_then(|q| {
            q.split('&').find_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some("limit"), Some(v)) => v.parse::<i64>().ok(),
                    _ => None,
                }
            })
        })
        .filter(|n| *n > 0)
        .map(|n| n.min(MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}

/// GET /api/devices/:device_id/readings — readings for one device.
///
/// Ownership is transitive: the caller must own the device (or be admin);
/// there is no per-reading ownership column to consult.
pub async fn handle_get_readings(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    device_id: i64,
) -> Result<Response<Full<Bytes>>> {
    if let Err(err) = require_device_access(&state.db, &identity, device_id).await {
        return deliver_auth_error(&err);
    }

    let limit = query_limit(&req);

    match readings::list_for_device(&state.db, device_id, limit).await {
        Ok(rows) => {
            let list: Vec<ReadingInfo> = rows.iter().map(|r| r.to_reading_info()).collect();
            deliver_success_json(Some(list))
        }
        Err(e) => {
            warn!("Readings fetch failed for device {}: {}", device_id, e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}

/// DELETE /api/devices/:device_id/readings/:reading_id — remove one reading.
///
/// Same transitive check as the fetch; the delete itself is additionally
/// scoped to the device so a reading id from someone else's device is a 404,
/// not a cross-device delete.
pub async fn handle_delete_reading(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    device_id: i64,
    reading_id: i64,
) -> Result<Response<Full<Bytes>>> {
    if let Err(err) = require_device_access(&state.db, &identity, device_id).await {
        return deliver_auth_error(&err);
    }

    match readings::delete_reading(&state.db, device_id, reading_id).await {
        Ok(true) => {
            info!(
                "User {} deleted reading {} from device {}",
                identity.user_id, reading_id, device_id
            );
            deliver_success_json::<()>(None)
        }
        Ok(false) => deliver_error_json("NOT_FOUND", "Reading not found", StatusCode::NOT_FOUND),
        Err(e) => {
            warn!("Reading delete failed for device {}: {}", device_id, e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
