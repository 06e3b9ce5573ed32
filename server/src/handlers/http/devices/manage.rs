use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::{DeviceInfo, DeviceUpdateData, NewDeviceData};

use crate::AppState;
use crate::auth::{Identity, require_device_access};
use crate::database::{devices, utils};
use crate::handlers::http::utils::{
    deliver_auth_error, deliver_error_json, deliver_serialized_json, deliver_success_json,
    parse_json_body,
};

fn database_error() -> Result<Response<Full<Bytes>>> {
    deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// POST /api/devices — register a device under the caller.
///
/// The response is the only place the minted API key ever appears; it is
/// not retrievable afterwards.
pub async fn handle_create_device(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let data: NewDeviceData = match parse_json_body(req).await? {
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

    let api_key = utils::generate_api_key();
    let device_id =
        match devices::create_device(&state.db, identity.user_id, &name, data.delay, &api_key)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Device create failed for user {}: {}", identity.user_id, e);
                return database_error();
            }
        };

    info!(
        "User {} registered device '{}' (id {})",
        identity.user_id, name, device_id
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

/// GET /api/devices — the caller's devices; every device for an admin.
pub async fn handle_list_devices(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let rows = if identity.is_admin() {
        devices::list_all(&state.db).await
    } else {
        devices::list_for_user(&state.db, identity.user_id).await
    };

    match rows {
        Ok(rows) => {
            let list: Vec<DeviceInfo> = rows.iter().map(|d| d.to_device_info()).collect();
            deliver_success_json(Some(list))
        }
        Err(e) => {
            warn!("Device list failed for user {}: {}", identity.user_id, e);
            database_error()
        }
    }
}

/// PUT /api/devices/:device_id — update state or sampling delay.
/// Ownership (or the admin role) is checked against the stored row.
pub async fn handle_update_device(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    device_id: i64,
) -> Result<Response<Full<Bytes>>> {
    if let Err(err) = require_device_access(&state.db, &identity, device_id).await {
        return deliver_auth_error(&err);
    }

    let update: DeviceUpdateData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    if let Some(delay) = update.delay {
        if delay <= 0 {
            return deliver_error_json(
                "INVALID_DELAY",
                "Delay must be a positive number of seconds",
                StatusCode::BAD_REQUEST,
            );
        }
    }

    if let Err(e) = devices::update_device(&state.db, device_id, &update).await {
        warn!("Device {} update failed: {}", device_id, e);
        return database_error();
    }

    match devices::get_device(&state.db, device_id).await {
        Ok(Some(device)) => deliver_success_json(Some(device.to_device_info())),
        _ => deliver_success_json::<()>(None),
    }
}

/// DELETE /api/devices/:device_id — remove a device; its readings go with
/// it via the cascade.
pub async fn handle_delete_device(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    device_id: i64,
) -> Result<Response<Full<Bytes>>> {
    if let Err(err) = require_device_access(&state.db, &identity, device_id).await {
        return deliver_auth_error(&err);
    }

    match devices::delete_device(&state.db, device_id).await {
        Ok(_) => {
            info!("User {} deleted device {}", identity.user_id, device_id);
            deliver_success_json::<()>(None)
        }
        Err(e) => {
            warn!("Device {} delete failed: {}", device_id, e);
            database_error()
        }
    }
}
