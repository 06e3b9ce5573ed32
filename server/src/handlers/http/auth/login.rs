use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::{LoginData, LoginError, LoginResponse};

use crate::AppState;
use crate::database::{users, utils};
use crate::handlers::http::utils::{deliver_serialized_json, parse_json_body};

fn login_error(err: LoginError) -> Result<Response<Full<Bytes>>> {
    let status = match err {
        LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        LoginError::MissingField(_) => StatusCode::BAD_REQUEST,
        LoginError::DatabaseError | LoginError::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    deliver_serialized_json(&err.to_response(), status)
}

/// POST /api/login — exchange username + password for a session token.
pub async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<Full<Bytes>>> {
    let data: LoginData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    if data.username.is_empty() {
        return login_error(LoginError::MissingField("username".to_string()));
    }
    if data.password.is_empty() {
        return login_error(LoginError::MissingField("password".to_string()));
    }

    let user = match users::get_user_by_username(&state.db, &data.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Burn a hash comparison anyway so a missing account costs the
            // same wall time as a wrong password.
            let _ = utils::verify_password(
                "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQxMjM0NTY$\
                 nZB0cFasg9vpg3nF2MUNiMJyFZDOdrcMGU3vvZAoeGo",
                &data.password,
            );
            warn!("Login failed: unknown username '{}'", data.username);
            return login_error(LoginError::InvalidCredentials);
        }
        Err(e) => {
            warn!("Login lookup failed: {}", e);
            return login_error(LoginError::DatabaseError);
        }
    };

    match utils::verify_password(&user.password_hash, &data.password) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed: wrong password for '{}'", data.username);
            return login_error(LoginError::InvalidCredentials);
        }
        Err(e) => {
            warn!("Password verification error for '{}': {}", data.username, e);
            return login_error(LoginError::InternalError);
        }
    }

    let expiry_secs = state.config.read().await.auth.token_expiry_secs();
    let token = match state
        .sessions
        .issue(user.id, &user.username, user.role(), &user.email, expiry_secs)
    {
        Ok(token) => token,
        Err(e) => {
            warn!("Token issue failed for '{}': {}", data.username, e);
            return login_error(LoginError::InternalError);
        }
    };

    info!("User '{}' (id {}) logged in", user.username, user.id);

    deliver_serialized_json(
        &LoginResponse::Success {
            user_id: user.id,
            username: user.username,
            token,
            expires_in: expiry_secs,
            message: "Login successful".to_string(),
        },
        StatusCode::OK,
    )
}
