//! NotificationRepository - Repository per le notifiche

use super::{Create, Read};
use crate::dtos::CreateNotificationDTO;
use crate::entities::Notification;
use sqlx::{Error, MySqlPool};
use tracing::instrument;

const NOTIFICATION_COLUMNS: &str =
    "notification_id, user_id, actor_id, kind, reference_id, content, is_read, created_at";

pub struct NotificationRepository {
    connection_pool: MySqlPool,
}

impl NotificationRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Notifiche dell'utente, dalla più recente
    #[instrument(skip(self))]
    pub async fn find_many_by_user_id(
        &self,
        user_id: &i32,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, Error> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = ? {} \
             ORDER BY created_at DESC, notification_id DESC LIMIT ?",
            NOTIFICATION_COLUMNS,
            if unread_only { "AND is_read = FALSE" } else { "" }
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn unread_count(&self, user_id: &i32) -> Result<i64, Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn mark_read(&self, notification_id: &i32) -> Result<(), Error> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE notification_id = ?")
            .bind(notification_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }

    /// Segna come lette tutte le notifiche; ritorna quante sono cambiate
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: &i32) -> Result<u64, Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE")
                .bind(user_id)
                .execute(&self.connection_pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Cancella solo se la notifica appartiene all'utente
    #[instrument(skip(self))]
    pub async fn delete_owned(&self, user_id: &i32, notification_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE notification_id = ? AND user_id = ?")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Create<Notification, CreateNotificationDTO> for NotificationRepository {
    #[instrument(skip(self, data), fields(user_id = %data.user_id, kind = %data.kind))]
    async fn create(&self, data: &CreateNotificationDTO) -> Result<Notification, Error> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, actor_id, kind, reference_id, content) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.user_id)
        .bind(data.actor_id)
        .bind(data.kind.as_str())
        .bind(data.reference_id)
        .bind(&data.content)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Notification, i32> for NotificationRepository {
    async fn read(&self, id: &i32) -> Result<Option<Notification>, Error> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE notification_id = ?",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
