use sqlx::SqlitePool;
use tracing::warn;

use crate::auth::error::AuthError;
use crate::auth::identity::Identity;
use crate::database::devices as db_devices;
use crate::database::devices::Device;

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// The ownership rule, in one place.
///
/// Allow iff the caller is an admin, or the caller *is* the owning user.
/// Pure over its inputs — resolution of `resource_owner_id` (direct or
/// transitive) happens before this is called.
pub fn authorize(caller: &Identity, resource_owner_id: i64) -> Decision {
    if caller.is_admin() || caller.user_id == resource_owner_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Resolve a device and check the caller may act on it.
///
/// One lookup, one decision: the device row read here is the row the
/// handler goes on to use, so the ownership check and the handler never
/// observe different snapshots of the resource.
///
/// A device that does not exist is a deny for everyone — admins included,
/// there is nothing to allow — surfaced with the same status and code as an
/// ownership denial so callers cannot probe which device ids exist.
pub async fn require_device_access(
    db: &SqlitePool,
    caller: &Identity,
    device_id: i64,
) -> Result<Device, AuthError> {
    let device = db_devices::get_device(db, device_id)
        .await?
        .ok_or(AuthError::ResourceNotFound)?;

    match authorize(caller, device.user_id) {
        Decision::Allow => Ok(device),
        Decision::Deny => {
            warn!(
                "User {} denied access to device {} (owner {})",
                caller.user_id, device.id, device.user_id
            );
            Err(AuthError::OwnershipDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{test_pool, users, utils};
    use shared::types::Role;

    fn identity(user_id: i64, role: Role) -> Identity {
        Identity {
            user_id,
            username: format!("user{}", user_id),
            role,
            email: format!("user{}@example.com", user_id),
        }
    }

    #[test]
    fn owner_is_allowed_others_denied() {
        let owner = identity(1, Role::User);
        let other = identity(2, Role::User);

        assert_eq!(authorize(&owner, 1), Decision::Allow);
        assert_eq!(authorize(&other, 1), Decision::Deny);
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = identity(99, Role::Admin);
        for owner_id in [1, 2, 99, i64::MAX] {
            assert_eq!(authorize(&admin, owner_id), Decision::Allow);
        }
    }

    async fn seeded_pool() -> (SqlitePool, i64, i64) {
        let pool = test_pool().await;
        let bob = users::create_user(
            &pool,
            &users::NewUser {
                username: "bob".into(),
                password_hash: "x".into(),
                email: "bob@example.com".into(),
                role: Role::User,
            },
        )
        .await
        .unwrap();
        let device_id = crate::database::devices::create_device(
            &pool,
            bob,
            "pulse-1",
            10,
            &utils::generate_api_key(),
        )
        .await
        .unwrap();
        (pool, bob, device_id)
    }

    #[tokio::test]
    async fn device_access_owner_allowed_stranger_denied() {
        let (pool, bob, device_id) = seeded_pool().await;

        let device = require_device_access(&pool, &identity(bob, Role::User), device_id)
            .await
            .unwrap();
        assert_eq!(device.user_id, bob);

        let err = require_device_access(&pool, &identity(bob + 1, Role::User), device_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OwnershipDenied));

        // Admin sees it regardless of owner.
        assert!(
            require_device_access(&pool, &identity(12345, Role::Admin), device_id)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn missing_device_fails_closed() {
        let (pool, bob, _) = seeded_pool().await;

        let err = require_device_access(&pool, &identity(bob, Role::User), 424242)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResourceNotFound));

        // Even an admin gets a deny for a device that does not exist.
        let err = require_device_access(&pool, &identity(1, Role::Admin), 424242)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResourceNotFound));
    }
}
