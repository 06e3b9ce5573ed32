use serde::{Deserialize, Deserializer, Serialize};

use crate::types::role::Role;

/// Claims embedded in every JWT issued at login.
///
/// Verification is stateless: the signature plus `exp` is the whole check,
/// no session table is consulted. The claims carry everything a handler
/// needs to identify and authorise the caller, so a verified token costs
/// zero DB reads.
///
/// A newly promoted or demoted user keeps their old `role` until the token
/// expires and they log in again — there is no revocation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Standard JWT subject — set to the username.
    pub sub: String,

    /// Numeric user ID (matches `users.id`).
    ///
    /// Some token issuers emit numeric claims as floats; an integral float
    /// is accepted and coerced, anything else fails deserialization (and
    /// therefore verification) instead of panicking.
    #[serde(deserialize_with = "deserialize_user_id")]
    pub user_id: i64,

    /// Role at the time the token was issued. Tokens minted before the
    /// role claim existed default to the unprivileged role.
    #[serde(default)]
    pub role: Role,

    /// Email address at the time the token was issued.
    pub email: String,

    /// Standard JWT expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}

/// Accept `42` or `42.0` for the user id, reject `42.5` and non-numbers.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(D::Error::custom("user_id is not an integral number"))
                }
            } else {
                Err(D::Error::custom("user_id is not representable as i64"))
            }
        }
        other => Err(D::Error::custom(format!(
            "user_id must be a number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_float_user_id_is_coerced() {
        let claims: JwtClaims = serde_json::from_str(
            r#"{"sub":"alice","user_id":42.0,"role":"user","email":"a@x.io","exp":9999999999,"iat":1700000000}"#,
        )
        .unwrap();
        assert_eq!(claims.user_id, 42);
    }

    #[test]
    fn fractional_user_id_is_rejected() {
        let result = serde_json::from_str::<JwtClaims>(
            r#"{"sub":"alice","user_id":42.5,"role":"user","email":"a@x.io","exp":9999999999,"iat":1700000000}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn string_user_id_is_rejected() {
        let result = serde_json::from_str::<JwtClaims>(
            r#"{"sub":"alice","user_id":"42","role":"user","email":"a@x.io","exp":9999999999,"iat":1700000000}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let claims: JwtClaims = serde_json::from_str(
            r#"{"sub":"alice","user_id":7,"email":"a@x.io","exp":9999999999,"iat":1700000000}"#,
        )
        .unwrap();
        assert_eq!(claims.role, Role::User);
    }
}
