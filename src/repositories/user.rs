//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Delete, Read, ReadMany, Update};
use crate::dtos::{NewUser, UpdateProfileDTO};
use crate::entities::User;
use sqlx::{Error, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};

const USER_COLUMNS: &str = "user_id, username, email, password, full_name, headline, bio, \
                            location, avatar_url, created_at";

// USER REPO
pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }

    /// Find user by exact email match (login)
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Find user by exact username match
    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Prefix search on username or full name
    #[instrument(skip(self))]
    pub async fn search(&self, pattern: &str, limit: i64) -> Result<Vec<User>, Error> {
        let like = format!("{}%", escape_like(pattern));
        let sql = format!(
            "SELECT {} FROM users WHERE username LIKE ? OR full_name LIKE ? \
             ORDER BY username LIMIT ?",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&like)
            .bind(&like)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Search returned {} users", users.len());
        Ok(users)
    }
}

/// Escape dei caratteri speciali di LIKE
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Create<User, NewUser> for UserRepository {
    /// Inserts the user together with an empty subscription row
    #[instrument(skip(self, data), fields(username = %data.username))]
    async fn create(&self, data: &NewUser) -> Result<User, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, password, full_name) VALUES (?, ?, ?, ?)",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.full_name)
        .execute(&mut *tx)
        .await?;

        let new_id = result.last_insert_id() as i32;

        sqlx::query("INSERT INTO subscriptions (user_id, remaining_posts, total_purchased) VALUES (?, 0, 0)")
            .bind(new_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("User created with id {}", new_id);

        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl ReadMany<User, i32> for UserRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query_builder = QueryBuilder::new(format!(
            "SELECT {} FROM users WHERE user_id IN (",
            USER_COLUMNS
        ));
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Update<User, UpdateProfileDTO, i32> for UserRepository {
    #[instrument(skip(self, data), fields(user_id = %id))]
    async fn update(&self, id: &i32, data: &UpdateProfileDTO) -> Result<User, Error> {
        let current_user = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.is_empty() {
            debug!("No fields to update, returning current user");
            return Ok(current_user);
        }

        let mut query_builder = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref full_name) = data.full_name {
            separated.push("full_name = ");
            separated.push_bind_unseparated(full_name);
        }
        if let Some(ref headline) = data.headline {
            separated.push("headline = ");
            separated.push_bind_unseparated(headline);
        }
        if let Some(ref bio) = data.bio {
            separated.push("bio = ");
            separated.push_bind_unseparated(bio);
        }
        if let Some(ref location) = data.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location);
        }
        if let Some(ref avatar_url) = data.avatar_url {
            separated.push("avatar_url = ");
            separated.push_bind_unseparated(avatar_url);
        }
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Profile updated");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for UserRepository {
    /// Hard delete: posts, applications, messages... are removed by ON DELETE CASCADE
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn delete(&self, user_id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        info!("User deleted");
        Ok(())
    }
}
