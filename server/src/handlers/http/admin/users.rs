use anyhow::Result;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::{AdminNewUserData, AdminUserUpdateData, UserInfo};

use crate::AppState;
use crate::auth::Identity;
use crate::database::{users, utils};
use crate::handlers::http::utils::{
    deliver_error_json, deliver_serialized_json, deliver_success_json, parse_json_body,
    profile_field_error,
};

// The router has already required the admin role for every handler in this
// module; `identity` is used for audit logging and self-action guards only.

fn database_error() -> Result<Response<Full<Bytes>>> {
    deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// GET /api/admin/users — every account, password hashes excluded.
pub async fn handle_list_users(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    _identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    match users::list_users(&state.db).await {
        Ok(rows) => {
            let list: Vec<UserInfo> = rows.iter().map(|u| u.to_user_info()).collect();
            deliver_success_json(Some(list))
        }
        Err(e) => {
            warn!("Admin user list failed: {}", e);
            database_error()
        }
    }
}

/// POST /api/admin/users — create an account with an assignable role.
pub async fn handle_create_user(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
) -> Result<Response<Full<Bytes>>> {
    let data: AdminNewUserData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    let username = utils::sanitize_string(&data.username);
    let email = utils::sanitize_string(&data.email);

    if !utils::is_valid_username(&username) {
        return deliver_error_json(
            "INVALID_USERNAME",
            "Username must be 3-20 characters, letters, digits or underscore",
            StatusCode::BAD_REQUEST,
        );
    }
    if !utils::is_valid_email(&email) {
        return deliver_error_json(
            "INVALID_EMAIL",
            "Email address is not valid",
            StatusCode::BAD_REQUEST,
        );
    }
    if !utils::is_strong_password(&data.password) {
        return deliver_error_json(
            "WEAK_PASSWORD",
            "Password must be at least 8 characters with a letter and a digit",
            StatusCode::BAD_REQUEST,
        );
    }
    if let Some((code, message)) = profile_field_error(&data.profile) {
        return deliver_error_json(code, message, StatusCode::BAD_REQUEST);
    }

    match users::username_exists(&state.db, &username).await {
        Ok(true) => {
            return deliver_error_json(
                "USERNAME_TAKEN",
                "Username is already taken",
                StatusCode::CONFLICT,
            );
        }
        Ok(false) => {}
        Err(e) => {
            warn!("Admin user create lookup failed: {}", e);
            return database_error();
        }
    }

    let password_hash = match utils::hash_password(&data.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Password hashing failed: {}", e);
            return deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    let new_user = users::NewUser {
        username: username.clone(),
        password_hash,
        email,
        role: data.role,
    };

    let user_id = match users::create_user(&state.db, &new_user).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Admin user create failed: {}", e);
            return deliver_error_json(
                "EMAIL_TAKEN",
                "Email is already registered",
                StatusCode::CONFLICT,
            );
        }
    };

    // Profile fields are optional at creation; apply them in a second pass.
    if let Err(e) = users::update_profile(&state.db, user_id, &data.profile).await {
        warn!("Profile seed failed for new user {}: {}", user_id, e);
    }

    info!(
        "Admin {} created user '{}' (id {}, role {})",
        identity.user_id, username, user_id, data.role
    );

    match users::get_user_by_id(&state.db, user_id).await {
        Ok(Some(user)) => deliver_serialized_json(
            &serde_json::json!({ "status": "success", "data": user.to_user_info() }),
            StatusCode::CREATED,
        ),
        _ => database_error(),
    }
}

/// PUT /api/admin/users/:user_id — edit any account: profile fields, role,
/// and optionally a password reset.
pub async fn handle_update_user(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    user_id: i64,
) -> Result<Response<Full<Bytes>>> {
    let data: AdminUserUpdateData = match parse_json_body(req).await? {
        Ok(data) => data,
        Err(resp) => return Ok(resp),
    };

    // Same field rules as the self-service update; admin is not a bypass.
    if let Some((code, message)) = profile_field_error(&data.profile) {
        return deliver_error_json(code, message, StatusCode::BAD_REQUEST);
    }

    match users::get_user_by_id(&state.db, user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return deliver_error_json("NOT_FOUND", "User not found", StatusCode::NOT_FOUND);
        }
        Err(e) => {
            warn!("Admin user lookup failed: {}", e);
            return database_error();
        }
    }

    if let Some(role) = data.role {
        // Demoting yourself would lock the last admin out one step at a
        // time; self role changes go through another admin.
        if user_id == identity.user_id {
            return deliver_error_json(
                "SELF_ROLE_CHANGE",
                "Admins cannot change their own role",
                StatusCode::BAD_REQUEST,
            );
        }
        if let Err(e) = users::set_role(&state.db, user_id, role).await {
            warn!("Role change failed for user {}: {}", user_id, e);
            return database_error();
        }
        info!(
            "Admin {} set role of user {} to {}",
            identity.user_id, user_id, role
        );
    }

    if let Some(ref password) = data.password {
        if !utils::is_strong_password(password) {
            return deliver_error_json(
                "WEAK_PASSWORD",
                "Password must be at least 8 characters with a letter and a digit",
                StatusCode::BAD_REQUEST,
            );
        }
        let hash = match utils::hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Password hashing failed: {}", e);
                return deliver_error_json(
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
        };
        if let Err(e) = users::change_password(&state.db, user_id, &hash).await {
            warn!("Password reset failed for user {}: {}", user_id, e);
            return database_error();
        }
        info!("Admin {} reset password of user {}", identity.user_id, user_id);
    }

    match users::update_profile(&state.db, user_id, &data.profile).await {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return deliver_error_json(
                "CONFLICT",
                "Username or email already in use",
                StatusCode::CONFLICT,
            );
        }
        Err(e) => {
            warn!("Admin profile update failed for user {}: {}", user_id, e);
            return database_error();
        }
    }

    match users::get_user_by_id(&state.db, user_id).await {
        Ok(Some(user)) => deliver_success_json(Some(user.to_user_info())),
        _ => deliver_success_json::<()>(None),
    }
}

/// DELETE /api/admin/users/:user_id — remove an account and, through the
/// cascade, its devices and readings.
pub async fn handle_delete_user(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    identity: Identity,
    user_id: i64,
) -> Result<Response<Full<Bytes>>> {
    if user_id == identity.user_id {
        // Own-account deletion goes through DELETE /api/user.
        return deliver_error_json(
            "SELF_DELETE",
            "Admins cannot delete their own account here",
            StatusCode::BAD_REQUEST,
        );
    }

    match users::delete_user(&state.db, user_id).await {
        Ok(true) => {
            info!("Admin {} deleted user {}", identity.user_id, user_id);
            deliver_success_json::<()>(None)
        }
        Ok(false) => deliver_error_json("NOT_FOUND", "User not found", StatusCode::NOT_FOUND),
        Err(e) => {
            warn!("Admin delete failed for user {}: {}", user_id, e);
            database_error()
        }
    }
}
