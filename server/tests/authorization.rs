//! End-to-end authorization scenarios over the real verifier, policy and
//! database layers, without the HTTP plumbing.

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use server::auth::{
    AuthError, DeviceKeyVerifier, Identity, SessionVerifier, Verifier, require_device_access,
};
use server::database::{devices, readings, schema, users, utils};
use shared::types::{ReadingData, Role};

const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Single-connection in-memory database; a pooled `:memory:` connection per
/// worker would each see its own empty schema.
async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    schema::create_tables(&pool).await.expect("schema");
    pool
}

async fn create_user(pool: &SqlitePool, name: &str, role: Role) -> i64 {
    users::create_user(
        pool,
        &users::NewUser {
            username: name.to_string(),
            password_hash: utils::hash_password("correct-horse-1").unwrap(),
            email: format!("{}@example.com", name),
            role,
        },
    )
    .await
    .unwrap()
}

fn identity(user_id: i64, name: &str, role: Role) -> Identity {
    Identity {
        user_id,
        username: name.to_string(),
        role,
        email: format!("{}@example.com", name),
    }
}

#[tokio::test]
async fn fresh_registration_yields_a_non_admin_session() {
    let db = pool().await;
    let alice = create_user(&db, "alice", Role::User).await;

    let sessions = SessionVerifier::new(SECRET);
    let token = sessions
        .issue(alice, "alice", Role::User, "alice@example.com", 3600)
        .unwrap();

    let who = sessions
        .verify(Some(&format!("Bearer {}", token)))
        .await
        .unwrap();
    assert_eq!(who.user_id, alice);
    assert!(!who.is_admin(), "self-registered accounts never get admin");
}

#[tokio::test]
async fn expired_token_is_unauthorized_not_forbidden() {
    let sessions = SessionVerifier::new(SECRET);
    let token = sessions
        .issue(1, "alice", Role::User, "alice@example.com", 0)
        .unwrap();

    let err = sessions
        .verify(Some(&format!("Bearer {}", token)))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
    assert_eq!(err.status(), hyper::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn device_key_writes_land_under_the_verified_device() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;

    let key = utils::generate_api_key();
    let device_id = devices::create_device(&db, bob, "pulse-1", 10, &key)
        .await
        .unwrap();

    let verifier = DeviceKeyVerifier::new(&db);
    let device = verifier.verify(Some(&key)).await.unwrap();
    assert_eq!(device.device_id, device_id);
    assert_eq!(device.owner_user_id, bob);

    readings::insert_reading(
        &db,
        device.device_id,
        &ReadingData {
            bpm: 72.0,
            spo2: 98.5,
            temp: 36.7,
        },
    )
    .await
    .unwrap();

    let rows = readings::list_for_device(&db, device_id, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device_id, device_id);
    assert_eq!(rows[0].bpm, 72.0);
}

#[tokio::test]
async fn missing_api_key_is_unauthorized() {
    let db = pool().await;
    let verifier = DeviceKeyVerifier::new(&db);

    let err = verifier.verify(None).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingCredential));
    assert_eq!(err.status(), hyper::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stranger_cannot_reach_another_users_device() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;
    let carol = create_user(&db, "carol", Role::User).await;

    let device_id = devices::create_device(&db, bob, "pulse-1", 10, &utils::generate_api_key())
        .await
        .unwrap();

    let err = require_device_access(&db, &identity(carol, "carol", Role::User), device_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::OwnershipDenied));
    assert_eq!(err.status(), hyper::StatusCode::FORBIDDEN);

    // The owner still gets through.
    assert!(
        require_device_access(&db, &identity(bob, "bob", Role::User), device_id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn admin_spans_every_owner() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;
    let carol = create_user(&db, "carol", Role::User).await;
    let root = create_user(&db, "root", Role::Admin).await;

    let d1 = devices::create_device(&db, bob, "pulse-1", 10, &utils::generate_api_key())
        .await
        .unwrap();
    let d2 = devices::create_device(&db, carol, "pulse-2", 10, &utils::generate_api_key())
        .await
        .unwrap();

    let fleet = devices::list_all(&db).await.unwrap();
    assert_eq!(fleet.len(), 2);

    let admin = identity(root, "root", Role::Admin);
    for id in [d1, d2] {
        assert!(require_device_access(&db, &admin, id).await.is_ok());
    }
}

#[tokio::test]
async fn reading_delete_follows_device_ownership() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;
    let carol = create_user(&db, "carol", Role::User).await;
    let root = create_user(&db, "root", Role::Admin).await;

    let bobs_device = devices::create_device(&db, bob, "pulse-1", 10, &utils::generate_api_key())
        .await
        .unwrap();
    let carols_device =
        devices::create_device(&db, carol, "pulse-2", 10, &utils::generate_api_key())
            .await
            .unwrap();

    let reading_id = readings::insert_reading(
        &db,
        bobs_device,
        &ReadingData {
            bpm: 72.0,
            spo2: 98.5,
            temp: 36.7,
        },
    )
    .await
    .unwrap();

    // Carol never reaches the delete: the transitive device check fails.
    let err = require_device_access(&db, &identity(carol, "carol", Role::User), bobs_device)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::OwnershipDenied));

    // Even through her own device the statement is scoped, so bob's
    // reading id deletes nothing.
    assert!(
        !readings::delete_reading(&db, carols_device, reading_id)
            .await
            .unwrap()
    );

    // The admin passes the same check bob would and the delete lands.
    require_device_access(&db, &identity(root, "root", Role::Admin), bobs_device)
        .await
        .unwrap();
    assert!(
        readings::delete_reading(&db, bobs_device, reading_id)
            .await
            .unwrap()
    );
    assert!(
        readings::list_for_device(&db, bobs_device, 10)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn admin_minted_device_belongs_to_the_target_user() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;
    let root = create_user(&db, "root", Role::Admin).await;

    // Admin provisioning names the owner; the row must not land under the
    // admin doing the minting.
    let key = utils::generate_api_key();
    let device_id = devices::create_device(&db, bob, "clinic-3", 10, &key)
        .await
        .unwrap();

    let device = DeviceKeyVerifier::new(&db).verify(Some(&key)).await.unwrap();
    assert_eq!(device.owner_user_id, bob);
    assert_ne!(device.owner_user_id, root);

    // Bob owns it outright, no admin involvement needed afterwards.
    assert!(
        require_device_access(&db, &identity(bob, "bob", Role::User), device_id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn missing_device_reads_like_a_denial() {
    let db = pool().await;
    let bob = create_user(&db, "bob", Role::User).await;

    let err = require_device_access(&db, &identity(bob, "bob", Role::User), 9999)
        .await
        .unwrap_err();

    // Same status and code as an ownership denial, so callers cannot probe
    // which device ids exist.
    assert_eq!(err.status(), AuthError::OwnershipDenied.status());
    assert_eq!(err.code(), AuthError::OwnershipDenied.code());
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let sessions = SessionVerifier::new(SECRET);
    let token = sessions
        .issue(1, "alice", Role::User, "alice@example.com", 3600)
        .unwrap();

    // Flip a character in the payload segment.
    let mut forged = token.clone().into_bytes();
    let mid = forged.len() / 2;
    forged[mid] = if forged[mid] == b'A' { b'B' } else { b'A' };
    let forged = String::from_utf8(forged).unwrap();

    let err = sessions
        .verify(Some(&format!("Bearer {}", forged)))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}
