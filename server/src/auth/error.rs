use hyper::StatusCode;
use thiserror::Error;

/// Terminal authorization failures.
///
/// Every variant ends the request — there is no retry and no partial
/// success. None of them are fatal to the process: a bad credential rejects
/// one request, nothing more.
///
/// The 401/403 split follows the usual contract: 401 when the credential
/// itself is missing or bad, 403 when the credential is fine but the caller
/// is not allowed to touch the resource.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No token / key presented at all.
    #[error("Authentication credential is required")]
    MissingCredential,

    /// Credential present but not parseable (e.g. missing `Bearer ` prefix).
    #[error("Credential format is invalid")]
    MalformedToken,

    /// Signature or expiry check failed, or the claims are undecodable.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Device key not found in the registry.
    #[error("Invalid API key")]
    InvalidCredential,

    /// Valid identity, but the route requires the admin role.
    #[error("Access forbidden")]
    InsufficientRole,

    /// Valid identity, but the resource belongs to a different user.
    /// The message deliberately does not say whose.
    #[error("Access forbidden")]
    OwnershipDenied,

    /// Ownership could not be resolved (e.g. a reading's parent device is
    /// gone). Fail closed: surfaced as a deny, never as an allow.
    #[error("Access forbidden")]
    ResourceNotFound,

    /// The registry read itself failed. Not a caller error.
    #[error("Credential lookup failed")]
    Lookup(#[from] sqlx::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential
            | Self::MalformedToken
            | Self::InvalidToken
            | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole | Self::OwnershipDenied | Self::ResourceNotFound => {
                StatusCode::FORBIDDEN
            }
            Self::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable category for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InsufficientRole => "INSUFFICIENT_ROLE",
            Self::OwnershipDenied => "OWNERSHIP_DENIED",
            Self::ResourceNotFound => "OWNERSHIP_DENIED",
            Self::Lookup(_) => "INTERNAL_ERROR",
        }
    }
}
