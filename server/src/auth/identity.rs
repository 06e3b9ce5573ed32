use shared::types::jwt::JwtClaims;
use shared::types::role::Role;

/// Verified user principal for one request.
///
/// Constructed exactly once, by the session verifier, from already-verified
/// claims. Lives on the stack for the duration of one request and is passed
/// to handlers by parameter — never cached, never stored in any shared bag.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<JwtClaims> for Identity {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.sub,
            role: claims.role,
            email: claims.email,
        }
    }
}

/// Verified device principal for one request.
///
/// Resolved from one registry lookup keyed by the presented API key. The
/// owner id rides along so ingest handlers never need a second lookup to
/// know whose data they are writing.
#[derive(Debug, Clone, Copy)]
pub struct DeviceIdentity {
    pub device_id: i64,
    pub owner_user_id: i64,
}
