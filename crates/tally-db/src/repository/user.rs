//! # User Repository
//!
//! Cashiers, referenced from transactions by their numeric `user_id`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tally_core::User;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

pub async fn insert(conn: &mut SqliteConnection, new: &NewUser) -> DbResult<User> {
    debug!(user_id = new.user_id, "Inserting user");

    let user = User {
        id: new_id(),
        user_id: new.user_id,
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        role: new.role.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, user_id, first_name, last_name, role, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&user.id)
    .bind(user.user_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.role)
    .bind(user.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        err if err.is_unique_violation_on("user_id") => {
            DbError::duplicate("user_id", new.user_id.to_string())
        }
        err => err,
    })?;

    Ok(user)
}

pub async fn get(conn: &mut SqliteConnection, user_id: i64) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY user_id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(users)
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, new).await
    }

    pub async fn get(&self, user_id: i64) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, user_id).await
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }
}
