//! CommentRepository - Repository per i commenti ai post

use super::{Create, Delete, Read};
use crate::dtos::NewComment;
use crate::entities::Comment;
use sqlx::{Error, MySqlPool};
use tracing::{info, instrument};

pub struct CommentRepository {
    connection_pool: MySqlPool,
}

impl CommentRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Comments of a post, oldest first
    #[instrument(skip(self))]
    pub async fn find_many_by_post_id(&self, post_id: &i32) -> Result<Vec<Comment>, Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT comment_id, post_id, author_id, content, created_at
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at ASC, comment_id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Comment, NewComment> for CommentRepository {
    #[instrument(skip(self, data), fields(post_id = %data.post_id))]
    async fn create(&self, data: &NewComment) -> Result<Comment, Error> {
        let result =
            sqlx::query("INSERT INTO comments (post_id, author_id, content) VALUES (?, ?, ?)")
                .bind(data.post_id)
                .bind(data.author_id)
                .bind(&data.content)
                .execute(&self.connection_pool)
                .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Comment created with id {}", new_id);
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Comment, i32> for CommentRepository {
    async fn read(&self, id: &i32) -> Result<Option<Comment>, Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT comment_id, post_id, author_id, content, created_at FROM comments WHERE comment_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Delete<i32> for CommentRepository {
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM comments WHERE comment_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
