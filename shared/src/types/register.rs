use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Registration wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegistrationData {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationResponse {
    Success {
        user_id: i64,
        username: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Registration errors
// ---------------------------------------------------------------------------

pub enum RegistrationError {
    UsernameTaken,
    EmailTaken,
    InvalidUsername,
    InvalidEmail,
    WeakPassword,
    MissingField(String),
    DatabaseError,
    InternalError,
}

impl RegistrationError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::UsernameTaken => "Username is already taken".to_string(),
            Self::EmailTaken => "Email is already registered".to_string(),
            Self::InvalidUsername => {
                "Username must be 3-20 characters, letters, digits or underscore".to_string()
            }
            Self::InvalidEmail => "Email address is not valid".to_string(),
            Self::WeakPassword => {
                "Password must be at least 8 characters with a letter and a digit".to_string()
            }
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::DatabaseError => "Database error occurred".to_string(),
            Self::InternalError => "An internal error occurred".to_string(),
        }
    }

    pub fn to_response(&self) -> RegistrationResponse {
        RegistrationResponse::Error {
            code: self.to_code().to_string(),
            message: self.to_message(),
        }
    }
}
