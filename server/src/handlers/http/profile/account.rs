use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::PasswordChangeData;

use crate::AppState;
use crate::auth::Identity;
use crate::database::{users, utils};
use crate::handlers::http::utils::{deliver_error_json, deliver_success_json, parse_json_body};

fn database_error() -> Result<Response<Full<Bytes>>> {
    deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// POST /api/user/password — change the caller's password.
///
/// The old password is re-verified even though the session token already
/// proved identity: a captured token must not be enough to lock the real
/// owner out.
pub async fn handle_change_password(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let data: PasswordChangeData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    if !utils::is_strong_password(&data.new_password) {
        return deliver_error_json(
            "WEAK_PASSWORD",
            "Password must be at least 8 characters with a letter and a digit",
            StatusCode::BAD_REQUEST,
        );
    }

    let user = match users::get_user_by_id(&state.db, identity.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return deliver_error_json(
                "NOT_FOUND",
                "Account no longer exists",
                StatusCode::NOT_FOUND,
            );
        }
        Err(e) => {
            warn!("Password change lookup failed: {}", e);
            return database_error();
        }
    };

    match utils::verify_password(&user.password_hash, &data.old_password) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Password change rejected for user {}: wrong old password", user.id);
            return deliver_error_json(
                "INVALID_CREDENTIALS",
                "Old password is incorrect",
                StatusCode::UNAUTHORIZED,
            );
        }
        Err(e) => {
            warn!("Password verification error for user {}: {}", user.id, e);
            return deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    }

    let new_hash = match utils::hash_password(&data.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Password hashing failed for user {}: {}", user.id, e);
            return deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    match users::change_password(&state.db, user.id, &new_hash).await {
        Ok(_) => {
            info!("User {} changed their password", user.id);
            deliver_success_json::<()>(None)
        }
        Err(e) => {
            warn!("Password change failed for user {}: {}", user.id, e);
            database_error()
        }
    }
}

/// DELETE /api/user — delete the caller's own account. Devices and readings
/// go with it via the foreign-key cascade.
pub async fn handle_delete_account(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    match users::delete_user(&state.db, identity.user_id).await {
        Ok(true) => {
            info!("User {} deleted their account", identity.user_id);
            deliver_success_json::<()>(None)
        }
        Ok(false) => deliver_error_json(
            "NOT_FOUND",
            "Account no longer exists",
            StatusCode::NOT_FOUND,
        ),
        Err(e) => {
            warn!("Account delete failed for user {}: {}", identity.user_id, e);
            database_error()
        }
    }
}
