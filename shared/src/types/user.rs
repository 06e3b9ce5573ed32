use serde::{Deserialize, Serialize};

use crate::types::role::Role;

// ---------------------------------------------------------------------------
// User profile wire types
// ---------------------------------------------------------------------------

/// Public view of a user row. The password hash never appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub medical_history: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of `PUT /api/user` — all fields optional, only present fields change.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateData {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub medical_history: Option<String>,
    pub address: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Body of `POST /api/user/password`.
#[derive(Debug, Deserialize)]
pub struct PasswordChangeData {
    pub old_password: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Admin wire types
// ---------------------------------------------------------------------------

/// Body of `POST /api/admin/users` — like registration, but the role is
/// assignable and profile fields may be set up front.
#[derive(Debug, Deserialize)]
pub struct AdminNewUserData {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub profile: ProfileUpdateData,
}

/// Body of `PUT /api/admin/users/:user_id` — profile fields plus role and an
/// optional password reset.
#[derive(Debug, Deserialize)]
pub struct AdminUserUpdateData {
    #[serde(flatten)]
    pub profile: ProfileUpdateData,
    pub role: Option<Role>,
    pub password: Option<String>,
}
