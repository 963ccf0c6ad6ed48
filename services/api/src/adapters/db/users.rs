//! services/api/src/adapters/db/users.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::{User, UserCredentials, UserRole};
use nearserve_core::ports::{NewUser, PortError, PortResult, UserStore};
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_from_str, enum_to_str, map_db_error, unexpected, DbAdapter};

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    google_id: Option<String>,
    avatar: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            role: enum_from_str::<UserRole>(&self.role)?,
            google_id: self.google_id,
            avatar: self.avatar,
            phone: self.phone,
            created_at: self.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, name, role, google_id, avatar, phone, created_at";

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, name, hashed_password, google_id, avatar)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, name, role, google_id, avatar, phone, created_at",
        )
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.name)
        .bind(&new_user.hashed_password)
        .bind(&new_user.google_id)
        .bind(&new_user.avatar)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error(e, "User with this email already exists"))?;
        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("User not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(self.pool())
        .await
        .map_err(unexpected)?;
        record.map(UserRecord::to_domain).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> PortResult<Option<UserCredentials>> {
        #[derive(FromRow)]
        struct CredentialsRecord {
            id: Uuid,
            email: String,
            hashed_password: Option<String>,
        }

        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| UserCredentials {
            user_id: r.id,
            email: r.email,
            hashed_password: r.hashed_password,
        }))
    }

    async fn set_user_role(&self, user_id: Uuid, role: UserRole) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "UPDATE users SET role = $1 WHERE id = $2
             RETURNING id, email, name, role, google_id, avatar, phone, created_at",
        )
        .bind(enum_to_str(&role))
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("User not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn link_google_account(
        &self,
        user_id: Uuid,
        google_id: &str,
        avatar: Option<&str>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET google_id = $1, avatar = COALESCE(avatar, $2) WHERE id = $3",
        )
        .bind(google_id)
        .bind(avatar)
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
