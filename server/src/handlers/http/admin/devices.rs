use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::{AdminNewDeviceData, DeviceInfo};

use crate::AppState;
use crate::auth::Identity;
use crate::database::{devices, users, utils};
use crate::handlers::http::utils::{
    deliver_error_json, deliver_serialized_json, deliver_success_json, parse_json_body,
};

/// GET /api/admin/devices — the whole fleet, keys excluded.
pub async fn handle_list_all_devices(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    _identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    match devices::list_all(&state.db).await {
        Ok(rows) => {
            let list: Vec<DeviceInfo> = rows.iter().map(|d| d.to_device_info()).collect();
            deliver_success_json(Some(list))
        }
        Err(e) => {
            warn!("Admin device list failed: {}", e);
            database_error()
        }
    }
}

fn database_error() -> Result<Response<Full<Bytes>>> {
    deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// POST /api/admin/devices — mint a device for a named user.
///
/// The row lands under `user_id` from the body, not under the admin doing
/// the provisioning; the key is shown once, as in the user-tier create.
pub async fn handle_create_device_admin(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let data: AdminNewDeviceData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    let name = utils::sanitize_string(&data.name);
    if name.is_empty() {
        return deliver_error_json(
            "MISSING_FIELD",
            "Missing required field: name",
            StatusCode::BAD_REQUEST,
        );
    }
    if data.delay <= 0 {
        return deliver_error_json(
            "INVALID_DELAY",
            "Delay must be a positive number of seconds",
            StatusCode::BAD_REQUEST,
        );
    }

    match users::get_user_by_id(&state.db, data.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return deliver_error_json("NOT_FOUND", "User not found", StatusCode::NOT_FOUND);
        }
        Err(e) => {
            warn!("Admin device create lookup failed: {}", e);
            return database_error();
        }
    }

    let api_key = utils::generate_api_key();
    let device_id =
        match devices::create_device(&state.db, data.user_id, &name, data.delay, &api_key).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    "Admin device create failed for user {}: {}",
                    data.user_id, e
                );
                return database_error();
            }
        };

    info!(
        "Admin {} registered device '{}' (id {}) for user {}",
        identity.user_id, name, device_id, data.user_id
    );

    let device = match devices::get_device(&state.db, device_id).await {
        Ok(Some(device)) => device,
        _ => return database_error(),
    };

    let mut info = device.to_device_info();
    info.api_key = Some(api_key);

    deliver_serialized_json(
        &serde_json::json!({ "status": "success", "data": info }),
        StatusCode::CREATED,
    )
}
