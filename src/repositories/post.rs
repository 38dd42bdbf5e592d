//! PostRepository - Repository per post, like e feed

use super::{Create, Delete, Read, Update};
use crate::dtos::{FeedQuery, NewPost, UpdatePostDTO};
use crate::entities::{Post, PostWithStats};
use sqlx::{Error, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument, warn};

const POST_COLUMNS: &str =
    "post_id, author_id, post_type, title, content, image_url, is_open, created_at, updated_at";

/// Proiezione del feed: post + autore + contatori. Il primo bind è l'utente che legge.
const POST_WITH_STATS_SELECT: &str = r#"
    SELECT
        p.post_id, p.author_id, u.username AS author_username, p.post_type, p.title,
        p.content, p.image_url, p.is_open, p.created_at, p.updated_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.post_id) AS like_count,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.post_id) AS comment_count,
        EXISTS(SELECT 1 FROM likes me WHERE me.post_id = p.post_id AND me.user_id = "#;

const POST_WITH_STATS_FROM: &str = r#") AS liked_by_me
    FROM posts p
    INNER JOIN users u ON u.user_id = p.author_id
    WHERE 1 = 1"#;

pub struct PostRepository {
    connection_pool: MySqlPool,
}

impl PostRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Inserts a post consuming one subscription credit in the same transaction.
    ///
    /// The credit is taken with a conditional UPDATE, so two concurrent requests
    /// can never both spend the last credit. Returns `Ok(None)` when the user has
    /// no credit left (nothing is written).
    #[instrument(skip(self, data), fields(author_id = %data.author_id))]
    pub async fn create_consuming_credit(&self, data: &NewPost) -> Result<Option<Post>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE subscriptions SET remaining_posts = remaining_posts - 1, updated_at = CURRENT_TIMESTAMP(3) \
             WHERE user_id = ? AND remaining_posts > 0",
        )
        .bind(data.author_id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            warn!("No subscription credit left");
            tx.rollback().await?;
            return Ok(None);
        }

        let new_id = Self::insert(&mut tx, data).await?;
        tx.commit().await?;
        info!("Post {} created consuming one credit", new_id);

        self.read(&new_id).await
    }

    async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
        data: &NewPost,
    ) -> Result<i32, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (author_id, post_type, title, content, image_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.author_id)
        .bind(data.post_type.as_str())
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.image_url)
        .execute(&mut **tx)
        .await?;
        Ok(result.last_insert_id() as i32)
    }

    /// Single post with counters, as seen by `viewer_id`
    #[instrument(skip(self))]
    pub async fn find_with_stats(
        &self,
        post_id: &i32,
        viewer_id: &i32,
    ) -> Result<Option<PostWithStats>, Error> {
        let mut query_builder = QueryBuilder::new(POST_WITH_STATS_SELECT);
        query_builder.push_bind(viewer_id);
        query_builder.push(POST_WITH_STATS_FROM);
        query_builder.push(" AND p.post_id = ");
        query_builder.push_bind(post_id);

        query_builder
            .build_query_as::<PostWithStats>()
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Feed newest first, paginated with a `post_id` cursor
    #[instrument(skip(self, filter))]
    pub async fn feed(
        &self,
        filter: &FeedQuery,
        viewer_id: &i32,
        limit: i64,
    ) -> Result<Vec<PostWithStats>, Error> {
        let mut query_builder = QueryBuilder::new(POST_WITH_STATS_SELECT);
        query_builder.push_bind(viewer_id);
        query_builder.push(POST_WITH_STATS_FROM);

        if let Some(post_type) = filter.post_type {
            query_builder.push(" AND p.post_type = ");
            query_builder.push_bind(post_type.as_str());
        }
        if let Some(author_id) = filter.author_id {
            query_builder.push(" AND p.author_id = ");
            query_builder.push_bind(author_id);
        }
        if let Some(before) = filter.before {
            query_builder.push(" AND p.post_id < ");
            query_builder.push_bind(before);
        }
        query_builder.push(" ORDER BY p.post_id DESC LIMIT ");
        query_builder.push_bind(limit);

        let posts = query_builder
            .build_query_as::<PostWithStats>()
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Feed page with {} posts", posts.len());
        Ok(posts)
    }

    /// Returns true if a new like was recorded, false if it already existed
    #[instrument(skip(self))]
    pub async fn like(&self, user_id: &i32, post_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("INSERT IGNORE INTO likes (user_id, post_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    pub async fn unlike(&self, user_id: &i32, post_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Create<Post, NewPost> for PostRepository {
    /// Plain insert without touching the subscription (PROJECT and STATUS posts)
    #[instrument(skip(self, data), fields(author_id = %data.author_id, post_type = %data.post_type))]
    async fn create(&self, data: &NewPost) -> Result<Post, Error> {
        let mut tx = self.connection_pool.begin().await?;
        let new_id = Self::insert(&mut tx, data).await?;
        tx.commit().await?;
        info!("Post created with id {}", new_id);

        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Post, i32> for PostRepository {
    async fn read(&self, id: &i32) -> Result<Option<Post>, Error> {
        let sql = format!("SELECT {} FROM posts WHERE post_id = ?", POST_COLUMNS);
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Post, UpdatePostDTO, i32> for PostRepository {
    #[instrument(skip(self, data), fields(post_id = %id))]
    async fn update(&self, id: &i32, data: &UpdatePostDTO) -> Result<Post, Error> {
        let current_post = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.is_empty() {
            debug!("No fields to update, returning current post");
            return Ok(current_post);
        }

        let mut query_builder = QueryBuilder::new("UPDATE posts SET updated_at = CURRENT_TIMESTAMP(3)");
        if let Some(ref title) = data.title {
            query_builder.push(", title = ");
            query_builder.push_bind(title);
        }
        if let Some(ref content) = data.content {
            query_builder.push(", content = ");
            query_builder.push_bind(content);
        }
        if let Some(ref image_url) = data.image_url {
            query_builder.push(", image_url = ");
            query_builder.push_bind(image_url);
        }
        if let Some(is_open) = data.is_open {
            query_builder.push(", is_open = ");
            query_builder.push_bind(is_open);
        }
        query_builder.push(" WHERE post_id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Post updated successfully");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for PostRepository {
    #[instrument(skip(self), fields(post_id = %id))]
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM posts WHERE post_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        info!("Post deleted successfully");
        Ok(())
    }
}
