//! MessageRepository - Repository per la gestione dei messaggi

use super::{Create, Read};
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use sqlx::{Error, MySqlPool, QueryBuilder};
use tracing::instrument;

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: MySqlPool,
}

impl MessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Pagina di messaggi di una chat
    ///
    /// Prende gli ultimi `limit` messaggi precedenti al cursore (o i più recenti
    /// se `before` è None) e li restituisce in ordine cronologico crescente.
    /// Il cursore è `(created_at, message_id)`: con `before_id` i messaggi nello
    /// stesso millisecondo del confine non vengono persi.
    #[instrument(skip(self))]
    pub async fn find_page(
        &self,
        chat_id: &i32,
        before: Option<DateTime<Utc>>,
        before_id: Option<i32>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let mut query_builder = QueryBuilder::new(
            "SELECT message_id, chat_id, sender_id, content, created_at FROM messages WHERE chat_id = ",
        );
        query_builder.push_bind(*chat_id);

        match (before, before_id) {
            (Some(before), Some(before_id)) => {
                query_builder
                    .push(" AND (created_at < ")
                    .push_bind(before)
                    .push(" OR (created_at = ")
                    .push_bind(before)
                    .push(" AND message_id < ")
                    .push_bind(before_id)
                    .push("))");
            }
            (Some(before), None) => {
                query_builder.push(" AND created_at < ").push_bind(before);
            }
            (None, _) => {}
        }

        query_builder
            .push(" ORDER BY created_at DESC, message_id DESC LIMIT ")
            .push_bind(limit);

        let mut messages = query_builder
            .build_query_as::<Message>()
            .fetch_all(&self.connection_pool)
            .await?;

        messages.reverse();
        Ok(messages)
    }

    pub async fn last_message(&self, chat_id: &i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT message_id, chat_id, sender_id, content, created_at
            FROM messages
            WHERE chat_id = ?
            ORDER BY created_at DESC, message_id DESC
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(chat_id = %data.chat_id, sender_id = %data.sender_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let result = sqlx::query(
            "INSERT INTO messages (chat_id, sender_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(data.chat_id)
        .bind(data.sender_id)
        .bind(&data.content)
        .bind(data.created_at)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Message, i32> for MessageRepository {
    async fn read(&self, id: &i32) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(
            "SELECT message_id, chat_id, sender_id, content, created_at FROM messages WHERE message_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seed_chat(pool: &MySqlPool) -> sqlx::Result<i32> {
        let result = sqlx::query("INSERT INTO chats (title, is_group) VALUES (NULL, FALSE)")
            .execute(pool)
            .await?;
        let chat_id = result.last_insert_id() as i32;
        sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES (?, 1), (?, 2)")
            .bind(chat_id)
            .bind(chat_id)
            .execute(pool)
            .await?;
        Ok(chat_id)
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_page_is_ascending_and_keeps_latest(pool: MySqlPool) -> sqlx::Result<()> {
        let chat_id = seed_chat(&pool).await?;
        let repo = MessageRepository::new(pool);

        let base = Utc::now() - Duration::minutes(10);
        for i in 0..5 {
            repo.create(&CreateMessageDTO {
                chat_id,
                sender_id: 1 + (i % 2),
                content: format!("msg {}", i),
                created_at: base + Duration::seconds(i as i64),
            })
            .await?;
        }

        let page = repo.find_page(&chat_id, None, None, 3).await?;
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 2", "msg 3", "msg 4"]);

        let older = repo.find_page(&chat_id, Some(page[0].created_at), None, 10).await?;
        let contents: Vec<&str> = older.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 0", "msg 1"]);

        let last = repo.last_message(&chat_id).await?.unwrap();
        assert_eq!(last.content, "msg 4");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_cursor_keeps_messages_sharing_a_timestamp(pool: MySqlPool) -> sqlx::Result<()> {
        let chat_id = seed_chat(&pool).await?;
        let repo = MessageRepository::new(pool);

        let instant = Utc::now() - Duration::minutes(5);
        for i in 0..4 {
            repo.create(&CreateMessageDTO {
                chat_id,
                sender_id: 1,
                content: format!("burst {}", i),
                created_at: instant,
            })
            .await?;
        }

        let page = repo.find_page(&chat_id, None, None, 2).await?;
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["burst 2", "burst 3"]);

        let older = repo
            .find_page(&chat_id, Some(page[0].created_at), Some(page[0].message_id), 10)
            .await?;
        let contents: Vec<&str> = older.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["burst 0", "burst 1"]);
        Ok(())
    }
}
