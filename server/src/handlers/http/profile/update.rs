use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::ProfileUpdateData;

use crate::AppState;
use crate::auth::Identity;
use crate::database::users;
use crate::handlers::http::utils::{
    deliver_error_json, deliver_success_json, parse_json_body, profile_field_error,
};

/// PUT /api/user — partial profile update for the caller's own row.
pub async fn handle_update_profile(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let update: ProfileUpdateData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    if let Some((code, message)) = profile_field_error(&update) {
        return deliver_error_json(code, message, StatusCode::BAD_REQUEST);
    }

    match users::update_profile(&state.db, identity.user_id, &update).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Profile update for deleted user {}", identity.user_id);
            return deliver_error_json(
                "NOT_FOUND",
                "Account no longer exists",
                StatusCode::NOT_FOUND,
            );
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return deliver_error_json(
                "CONFLICT",
                "Username or email already in use",
                StatusCode::CONFLICT,
            );
        }
        Err(e) => {
            warn!("Profile update failed for user {}: {}", identity.user_id, e);
            return deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    }

    info!("User {} updated their profile", identity.user_id);

    // Return the fresh row so the client does not have to re-fetch.
    match users::get_user_by_id(&state.db, identity.user_id).await {
        Ok(Some(user)) => deliver_success_json(Some(user.to_user_info())),
        _ => deliver_success_json::<()>(None),
    }
}
