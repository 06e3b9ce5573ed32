use sqlx::SqlitePool;
use tracing::debug;

use shared::types::{ProfileUpdateData, Role, UserInfo};

use crate::database::utils::get_timestamp;

/// Full user row as stored. `role` stays a string here; it is parsed into
/// [`Role`] at the edge so an unexpected value in the column never silently
/// becomes a privilege.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: String,
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

impl User {
    pub fn role(&self) -> Role {
        // Unknown role strings demote to the ordinary user role.
        Role::parse(&self.role).unwrap_or_default()
    }

    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role(),
            full_name: self.full_name.clone(),
            date_of_birth: self.date_of_birth.clone(),
            medical_history: self.medical_history.clone(),
            address: self.address.clone(),
            province: self.province.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Insert payload for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
}

const USER_COLUMNS: &str = "id, username, password_hash, email, role, \
     full_name, date_of_birth, medical_history, address, province, city, \
     postal_code, created_at, updated_at";

/// Create a user and return the new row id.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> sqlx::Result<i64> {
    let now = get_timestamp();

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, email, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&new_user.username)
    .bind(&new_user.password_hash)
    .bind(&new_user.email)
    .bind(new_user.role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!("Created user '{}' with id {}", new_user.username, id);
    Ok(id)
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> sqlx::Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> sqlx::Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// All users, oldest first. Admin listing only.
pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
        .fetch_all(pool)
        .await
}

/// Apply a partial profile update. Absent fields keep their stored value.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    update: &ProfileUpdateData,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET
            username        = COALESCE(?, username),
            email           = COALESCE(?, email),
            full_name       = COALESCE(?, full_name),
            date_of_birth   = COALESCE(?, date_of_birth),
            medical_history = COALESCE(?, medical_history),
            address         = COALESCE(?, address),
            province        = COALESCE(?, province),
            city            = COALESCE(?, city),
            postal_code     = COALESCE(?, postal_code),
            updated_at      = ?
         WHERE id = ?",
    )
    .bind(&update.username)
    .bind(&update.email)
    .bind(&update.full_name)
    .bind(&update.date_of_birth)
    .bind(&update.medical_history)
    .bind(&update.address)
    .bind(&update.province)
    .bind(&update.city)
    .bind(&update.postal_code)
    .bind(get_timestamp())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn change_password(
    pool: &SqlitePool,
    user_id: i64,
    new_hash: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(new_hash)
        .bind(get_timestamp())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Admin-only role change.
pub async fn set_role(pool: &SqlitePool, user_id: i64, role: Role) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(get_timestamp())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a user. Owned devices and their readings cascade.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn new_user(name: &str, role: Role) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "hash".to_string(),
            email: format!("{}@example.com", name),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_roundtrip() {
        let pool = test_pool().await;
        let id = create_user(&pool, &new_user("alice", Role::User)).await.unwrap();

        let user = get_user_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role(), Role::User);

        let by_name = get_user_by_username(&pool, "alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);

        assert!(username_exists(&pool, "alice").await.unwrap());
        assert!(!username_exists(&pool, "bob").await.unwrap());
        assert!(email_exists(&pool, "alice@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let pool = test_pool().await;
        create_user(&pool, &new_user("alice", Role::User)).await.unwrap();

        let mut dup = new_user("alice", Role::User);
        dup.email = "other@example.com".to_string();
        assert!(create_user(&pool, &dup).await.is_err());
    }

    #[tokio::test]
    async fn partial_profile_update_keeps_other_fields() {
        let pool = test_pool().await;
        let id = create_user(&pool, &new_user("alice", Role::User)).await.unwrap();

        let first = ProfileUpdateData {
            full_name: Some("Alice Liddell".to_string()),
            city: Some("Utrecht".to_string()),
            ..Default::default()
        };
        assert!(update_profile(&pool, id, &first).await.unwrap());

        // Second update touches only the city.
        let second = ProfileUpdateData {
            city: Some("Delft".to_string()),
            ..Default::default()
        };
        assert!(update_profile(&pool, id, &second).await.unwrap());

        let user = get_user_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Alice Liddell"));
        assert_eq!(user.city.as_deref(), Some("Delft"));
    }

    #[tokio::test]
    async fn role_change_and_delete() {
        let pool = test_pool().await;
        let id = create_user(&pool, &new_user("alice", Role::User)).await.unwrap();

        assert!(set_role(&pool, id, Role::Admin).await.unwrap());
        let user = get_user_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.role(), Role::Admin);

        assert!(delete_user(&pool, id).await.unwrap());
        assert!(get_user_by_id(&pool, id).await.unwrap().is_none());
        assert!(!delete_user(&pool, id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_role_string_demotes_to_user() {
        let pool = test_pool().await;
        let id = create_user(&pool, &new_user("alice", Role::User)).await.unwrap();

        sqlx::query("UPDATE users SET role = 'superuser' WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let user = get_user_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.role(), Role::User);
        assert!(!user.role().is_admin());
    }
}
