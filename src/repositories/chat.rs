//! ChatRepository - Repository per la gestione delle chat e dei partecipanti

use super::Read;
use crate::dtos::NewChat;
use crate::entities::{Chat, ChatParticipant};
use sqlx::{Error, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};

const CHAT_COLUMNS: &str = "c.chat_id, c.title, c.is_group, c.post_id, c.created_at";

// CHAT REPOSITORY
pub struct ChatRepository {
    connection_pool: MySqlPool,
}

impl ChatRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Crea la chat e inserisce tutti i partecipanti nella stessa transazione
    #[instrument(skip(self, data, participant_ids), fields(participants = participant_ids.len()))]
    pub async fn create_with_participants(
        &self,
        data: &NewChat,
        participant_ids: &[i32],
    ) -> Result<Chat, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query("INSERT INTO chats (title, is_group, post_id) VALUES (?, ?, ?)")
            .bind(&data.title)
            .bind(data.is_group)
            .bind(data.post_id)
            .execute(&mut *tx)
            .await?;
        let chat_id = result.last_insert_id() as i32;

        if !participant_ids.is_empty() {
            let mut query_builder =
                QueryBuilder::new("INSERT IGNORE INTO chat_participants (chat_id, user_id) ");
            query_builder.push_values(participant_ids, |mut row, user_id| {
                row.push_bind(chat_id).push_bind(*user_id);
            });
            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!("Chat {} created", chat_id);

        self.read(&chat_id).await?.ok_or(Error::RowNotFound)
    }

    /// Chat diretta (non di gruppo) tra due utenti, se esiste
    #[instrument(skip(self), fields(user1 = %user1_id, user2 = %user2_id))]
    pub async fn find_direct_chat_between(
        &self,
        user1_id: &i32,
        user2_id: &i32,
    ) -> Result<Option<Chat>, Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM chats c
            INNER JOIN chat_participants cp ON c.chat_id = cp.chat_id
            WHERE c.is_group = FALSE
              AND cp.user_id IN (?, ?)
            GROUP BY c.chat_id, c.title, c.is_group, c.post_id, c.created_at
            HAVING COUNT(DISTINCT cp.user_id) = 2
            LIMIT 1
            "#,
            CHAT_COLUMNS
        );
        let chat = sqlx::query_as::<_, Chat>(&sql)
            .bind(user1_id)
            .bind(user2_id)
            .fetch_optional(&self.connection_pool)
            .await?;

        if chat.is_none() {
            debug!("No direct chat found");
        }
        Ok(chat)
    }

    /// Tutte le chat a cui partecipa l'utente
    #[instrument(skip(self))]
    pub async fn find_many_by_user_id(&self, user_id: &i32) -> Result<Vec<Chat>, Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM chats c
            INNER JOIN chat_participants cp ON c.chat_id = cp.chat_id
            WHERE cp.user_id = ?
            ORDER BY c.created_at DESC
            "#,
            CHAT_COLUMNS
        );
        sqlx::query_as::<_, Chat>(&sql)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn find_participants(&self, chat_id: &i32) -> Result<Vec<ChatParticipant>, Error> {
        sqlx::query_as::<_, ChatParticipant>(
            r#"
            SELECT chat_id, user_id, joined_at, last_read_at
            FROM chat_participants
            WHERE chat_id = ?
            ORDER BY joined_at ASC, user_id ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_participant(
        &self,
        chat_id: &i32,
        user_id: &i32,
    ) -> Result<Option<ChatParticipant>, Error> {
        sqlx::query_as::<_, ChatParticipant>(
            r#"
            SELECT chat_id, user_id, joined_at, last_read_at
            FROM chat_participants
            WHERE chat_id = ? AND user_id = ?
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, chat_id: &i32, user_id: &i32) -> Result<(), Error> {
        sqlx::query(
            "UPDATE chat_participants SET last_read_at = CURRENT_TIMESTAMP(3) \
             WHERE chat_id = ? AND user_id = ?",
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;
        Ok(())
    }

    /// Messaggi di altri utenti arrivati dopo `last_read_at`
    pub async fn unread_count(&self, chat_id: &i32, user_id: &i32) -> Result<i64, Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages m
            INNER JOIN chat_participants cp ON cp.chat_id = m.chat_id AND cp.user_id = ?
            WHERE m.chat_id = ?
              AND m.sender_id <> ?
              AND m.created_at > cp.last_read_at
            "#,
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Chat, i32> for ChatRepository {
    async fn read(&self, id: &i32) -> Result<Option<Chat>, Error> {
        let sql = format!("SELECT {} FROM chats c WHERE c.chat_id = ?", CHAT_COLUMNS);
        sqlx::query_as::<_, Chat>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct() -> NewChat {
        NewChat {
            title: None,
            is_group: false,
            post_id: None,
        }
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_direct_chat_lookup(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ChatRepository::new(pool);

        assert!(repo.find_direct_chat_between(&1, &2).await?.is_none());
        let chat = repo.create_with_participants(&direct(), &[1, 2]).await?;

        let found = repo.find_direct_chat_between(&2, &1).await?.unwrap();
        assert_eq!(found.chat_id, chat.chat_id);
        assert!(repo.find_direct_chat_between(&1, &3).await?.is_none());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_unread_count_resets_on_read(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ChatRepository::new(pool.clone());
        let chat = repo.create_with_participants(&direct(), &[1, 2]).await?;

        // messaggio di bob con timestamp nel futuro rispetto a last_read_at di alice
        sqlx::query(
            "INSERT INTO messages (chat_id, sender_id, content, created_at) \
             VALUES (?, 2, 'ciao', CURRENT_TIMESTAMP(3) + INTERVAL 1 SECOND)",
        )
        .bind(chat.chat_id)
        .execute(&pool)
        .await?;

        assert_eq!(repo.unread_count(&chat.chat_id, &1).await?, 1);
        assert_eq!(repo.unread_count(&chat.chat_id, &2).await?, 0);

        sqlx::query(
            "UPDATE chat_participants SET last_read_at = CURRENT_TIMESTAMP(3) + INTERVAL 2 SECOND \
             WHERE chat_id = ? AND user_id = 1",
        )
        .bind(chat.chat_id)
        .execute(&pool)
        .await?;
        assert_eq!(repo.unread_count(&chat.chat_id, &1).await?, 0);
        Ok(())
    }
}
