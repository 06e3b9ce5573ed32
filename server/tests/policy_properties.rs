//! Property tests for the ownership rule and the routing helpers.

use proptest::prelude::*;

use server::auth::{Decision, Identity, authorize};
use server::database::utils::generate_api_key;
use server::handlers::http::routes::{Router, path_id};
use shared::types::Role;

fn identity(user_id: i64, role: Role) -> Identity {
    Identity {
        user_id,
        username: format!("u{}", user_id),
        role,
        email: format!("u{}@example.com", user_id),
    }
}

proptest! {
    /// An admin is allowed against every possible owner.
    #[test]
    fn admin_always_allowed(caller in any::<i64>(), owner in any::<i64>()) {
        let admin = identity(caller, Role::Admin);
        prop_assert_eq!(authorize(&admin, owner), Decision::Allow);
    }

    /// A non-admin is allowed exactly when the owner is the caller.
    #[test]
    fn user_allowed_iff_owner(caller in any::<i64>(), owner in any::<i64>()) {
        let user = identity(caller, Role::User);
        let expected = if caller == owner { Decision::Allow } else { Decision::Deny };
        prop_assert_eq!(authorize(&user, owner), expected);
    }

    /// Numeric path segments survive extraction.
    #[test]
    fn path_id_extracts_any_id(id in 0i64..=i64::MAX) {
        prop_assert_eq!(path_id(&format!("/api/devices/{}", id), 3), Some(id));
        prop_assert_eq!(path_id(&format!("/api/devices/{}/readings", id), 3), Some(id));
    }

    /// A `:param` route matches any single non-slash segment, and never a
    /// path with a different segment count.
    #[test]
    fn wildcard_matches_single_segment(seg in "[A-Za-z0-9_-]{1,24}") {
        let single = format!("/api/devices/{}", seg);
        let extra = format!("/api/devices/{}/extra", seg);
        prop_assert!(Router::path_matches("/api/devices/:device_id", &single));
        prop_assert!(!Router::path_matches("/api/devices/:device_id", &extra));
    }

    /// Minted keys are always 32 lowercase hex characters.
    #[test]
    fn api_keys_are_well_formed(_n in 0u8..32) {
        let key = generate_api_key();
        prop_assert_eq!(key.len(), 32);
        prop_assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
