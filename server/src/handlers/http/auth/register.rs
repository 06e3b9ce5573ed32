use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::{RegistrationData, RegistrationError, RegistrationResponse, Role};

use crate::AppState;
use crate::database::{users, utils};
use crate::handlers::http::utils::{deliver_serialized_json, parse_json_body};

fn registration_error(err: RegistrationError) -> Result<Response<Full<Bytes>>> {
    let status = match err {
        RegistrationError::UsernameTaken | RegistrationError::EmailTaken => StatusCode::CONFLICT,
        RegistrationError::InvalidUsername
        | RegistrationError::InvalidEmail
        | RegistrationError::WeakPassword
        | RegistrationError::MissingField(_) => StatusCode::BAD_REQUEST,
        RegistrationError::DatabaseError | RegistrationError::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    deliver_serialized_json(&err.to_response(), status)
}

/// POST /api/register — create an account. The role is always the ordinary
/// user role; admin accounts are minted through the admin surface only.
pub async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<Full<Bytes>>> {
    let data: RegistrationData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    let username = utils::sanitize_string(&data.username);
    let email = utils::sanitize_string(&data.email);

    if username.is_empty() {
        return registration_error(RegistrationError::MissingField("username".to_string()));
    }
    if data.password.is_empty() {
        return registration_error(RegistrationError::MissingField("password".to_string()));
    }
    if email.is_empty() {
        return registration_error(RegistrationError::MissingField("email".to_string()));
    }

    if !utils::is_valid_username(&username) {
        return registration_error(RegistrationError::InvalidUsername);
    }
    if !utils::is_valid_email(&email) {
        return registration_error(RegistrationError::InvalidEmail);
    }
    if !utils::is_strong_password(&data.password) {
        return registration_error(RegistrationError::WeakPassword);
    }

    match users::username_exists(&state.db, &username).await {
        Ok(true) => return registration_error(RegistrationError::UsernameTaken),
        Ok(false) => {}
        Err(e) => {
            warn!("Registration lookup failed: {}", e);
            return registration_error(RegistrationError::DatabaseError);
        }
    }
    match users::email_exists(&state.db, &email).await {
        Ok(true) => return registration_error(RegistrationError::EmailTaken),
        Ok(false) => {}
        Err(e) => {
            warn!("Registration lookup failed: {}", e);
            return registration_error(RegistrationError::DatabaseError);
        }
    }

    let password_hash = match utils::hash_password(&data.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Password hashing failed during registration: {}", e);
            return registration_error(RegistrationError::InternalError);
        }
    };

    let new_user = users::NewUser {
        username: username.clone(),
        password_hash,
        email,
        role: Role::User,
    };

    let user_id = match users::create_user(&state.db, &new_user).await {
        Ok(id) => id,
        Err(e) => {
            // The existence checks above race with concurrent registrations;
            // the UNIQUE constraints are the ground truth.
            warn!("Registration insert failed for '{}': {}", username, e);
            return registration_error(RegistrationError::UsernameTaken);
        }
    };

    info!("Registered user '{}' (id {})", username, user_id);

    deliver_serialized_json(
        &RegistrationResponse::Success {
            user_id,
            username,
            message: "Registration successful".to_string(),
        },
        StatusCode::CREATED,
    )
}
