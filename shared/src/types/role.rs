use std::fmt;

use serde::{Deserialize, Serialize};

/// Role claim carried in every session token and stored on the user row.
///
/// Deliberately a closed enum rather than a bare string: handlers compare
/// roles with `==` / [`Role::is_admin`] and can never typo a role name.
/// Unknown strings on the wire fail deserialization, which the session
/// verifier surfaces as an invalid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Parse the database representation. Unknown values map to `None`
    /// rather than defaulting — a corrupted role column must not silently
    /// grant or strip privileges.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn wire_representation_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn unknown_role_string_is_rejected() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn parse_round_trips_as_str() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
