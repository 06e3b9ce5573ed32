use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use shared::types::jwt::JwtClaims;
use shared::types::role::Role;
use tracing::debug;

use crate::auth::error::AuthError;
use crate::auth::identity::Identity;
use crate::auth::Verifier;

/// Stateless session-token verifier (and issuer).
///
/// Holds the server's HMAC secret in key form. Verification is pure over
/// (token, current time, secret): no session table, no registry read. The
/// expiry rule is strict — a token whose `exp` equals the current second is
/// already dead.
#[derive(Clone)]
pub struct SessionVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SessionVerifier").finish_non_exhaustive()
    }
}

impl SessionVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand below so the `exp <= now` boundary is
        // exact; jsonwebtoken's built-in check allows `exp == now` and a
        // default 60s leeway.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a fresh token for a just-authenticated user.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: Role,
        email: &str,
        expiry_secs: u64,
    ) -> anyhow::Result<String> {
        let now = unix_now();
        let claims = JwtClaims {
            sub: username.to_string(),
            user_id,
            role,
            email: email.to_string(),
            exp: (now + expiry_secs as i64) as usize,
            iat: now as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign session token: {}", e))
    }

    fn verify_at(&self, raw: Option<&str>, now: i64) -> Result<Identity, AuthError> {
        let header = raw.ok_or(AuthError::MissingCredential)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedToken)?;

        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token verification failed: {}", e);
            AuthError::InvalidToken
        })?;

        // Strict boundary: exp <= now is expired.
        if data.claims.exp as i64 <= now {
            return Err(AuthError::InvalidToken);
        }

        Ok(Identity::from(data.claims))
    }
}

impl Verifier for SessionVerifier {
    type Principal = Identity;

    async fn verify(&self, raw: Option<&str>) -> Result<Identity, AuthError> {
        self.verify_at(raw, unix_now())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-adequately-long-test-secret-0123456789";

    fn verifier() -> SessionVerifier {
        SessionVerifier::new(SECRET)
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[test]
    fn round_trip_preserves_claims_for_both_roles() {
        let v = verifier();
        for role in [Role::User, Role::Admin] {
            let token = v
                .issue(42, "alice", role, "alice@example.com", 3600)
                .unwrap();
            let identity = v.verify_at(Some(&bearer(&token)), unix_now()).unwrap();
            assert_eq!(identity.user_id, 42);
            assert_eq!(identity.username, "alice");
            assert_eq!(identity.role, role);
            assert_eq!(identity.email, "alice@example.com");
        }
    }

    #[test]
    fn missing_header_is_missing_credential() {
        let err = verifier().verify_at(None, unix_now()).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[test]
    fn missing_bearer_prefix_is_malformed() {
        let v = verifier();
        let token = v.issue(1, "bob", Role::User, "b@x.io", 3600).unwrap();
        // Raw token without the scheme — the device-key convention, not the
        // session convention.
        let err = v.verify_at(Some(&token), unix_now()).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken));

        let err = v.verify_at(Some(""), unix_now()).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken));
    }

    #[test]
    fn garbage_token_is_invalid_not_a_panic() {
        let v = verifier();
        for garbage in ["Bearer ", "Bearer not.a.jwt", "Bearer ....", "Bearer \u{0}"] {
            let err = v.verify_at(Some(garbage), unix_now()).unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken), "{:?}", garbage);
        }
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let v = verifier();
        let now = unix_now();

        // exp == now → rejected
        let token = v.issue(1, "carol", Role::User, "c@x.io", 0).unwrap();
        let err = v.verify_at(Some(&bearer(&token)), now).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        // exp in the past → rejected
        let token = v.issue(1, "carol", Role::User, "c@x.io", 0).unwrap();
        let err = v.verify_at(Some(&bearer(&token)), now + 100).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        // one second before expiry → accepted
        let token = v.issue(1, "carol", Role::User, "c@x.io", 1).unwrap();
        assert!(v.verify_at(Some(&bearer(&token)), now).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = SessionVerifier::new("a-completely-different-32-char-secret!!");
        let token = issuer.issue(7, "mallory", Role::Admin, "m@x.io", 3600).unwrap();

        let err = verifier()
            .verify_at(Some(&bearer(&token)), unix_now())
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
