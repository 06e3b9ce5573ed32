use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::warn;

use crate::AppState;
use crate::auth::Identity;
use crate::database::users;
use crate::handlers::http::utils::{deliver_error_json, deliver_success_json};

/// GET /api/user — the caller's own profile.
///
/// The row is re-read instead of echoing token claims, so profile edits are
/// visible without waiting for the token to rotate.
pub async fn handle_get_profile(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    match users::get_user_by_id(&state.db, identity.user_id).await {
        Ok(Some(user)) => deliver_success_json(Some(user.to_user_info())),
        Ok(None) => {
            // Token outlived the account.
            warn!("Profile read for deleted user {}", identity.user_id);
            deliver_error_json("NOT_FOUND", "Account no longer exists", StatusCode::NOT_FOUND)
        }
        Err(e) => {
            warn!("Profile read failed for user {}: {}", identity.user_id, e);
            deliver_error_json(
                "DATABASE_ERROR",
                "Database error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
