//! ConnectionRepository - Repository per le connessioni tra utenti

use super::{Create, Delete, Read};
use crate::dtos::NewConnection;
use crate::entities::Connection;
use sqlx::{Error, MySqlPool};
use tracing::{info, instrument};

const CONNECTION_COLUMNS: &str = "connection_id, requester_id, addressee_id, status, created_at";

pub struct ConnectionRepository {
    connection_pool: MySqlPool,
}

impl ConnectionRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Connessione tra due utenti in una qualsiasi delle due direzioni
    #[instrument(skip(self))]
    pub async fn find_between(
        &self,
        user1_id: &i32,
        user2_id: &i32,
    ) -> Result<Option<Connection>, Error> {
        let sql = format!(
            "SELECT {} FROM connections \
             WHERE (requester_id = ? AND addressee_id = ?) OR (requester_id = ? AND addressee_id = ?) \
             LIMIT 1",
            CONNECTION_COLUMNS
        );
        sqlx::query_as::<_, Connection>(&sql)
            .bind(user1_id)
            .bind(user2_id)
            .bind(user2_id)
            .bind(user1_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    /// Connessioni accettate dell'utente, in entrambe le direzioni
    pub async fn find_accepted(&self, user_id: &i32) -> Result<Vec<Connection>, Error> {
        let sql = format!(
            "SELECT {} FROM connections \
             WHERE status = 'ACCEPTED' AND (requester_id = ? OR addressee_id = ?) \
             ORDER BY created_at DESC, connection_id DESC",
            CONNECTION_COLUMNS
        );
        sqlx::query_as::<_, Connection>(&sql)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Richieste in attesa ricevute dall'utente
    pub async fn find_pending_incoming(&self, user_id: &i32) -> Result<Vec<Connection>, Error> {
        let sql = format!(
            "SELECT {} FROM connections WHERE status = 'PENDING' AND addressee_id = ? \
             ORDER BY created_at DESC, connection_id DESC",
            CONNECTION_COLUMNS
        );
        sqlx::query_as::<_, Connection>(&sql)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Richieste in attesa inviate dall'utente
    pub async fn find_pending_sent(&self, user_id: &i32) -> Result<Vec<Connection>, Error> {
        let sql = format!(
            "SELECT {} FROM connections WHERE status = 'PENDING' AND requester_id = ? \
             ORDER BY created_at DESC, connection_id DESC",
            CONNECTION_COLUMNS
        );
        sqlx::query_as::<_, Connection>(&sql)
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Accetta una richiesta PENDING; false se non era più in attesa
    #[instrument(skip(self))]
    pub async fn accept_if_pending(&self, connection_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE connections SET status = 'ACCEPTED' WHERE connection_id = ? AND status = 'PENDING'",
        )
        .bind(connection_id)
        .execute(&self.connection_pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rimuove la relazione tra due utenti in qualsiasi direzione
    #[instrument(skip(self))]
    pub async fn delete_between(&self, user1_id: &i32, user2_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query(
            "DELETE FROM connections \
             WHERE (requester_id = ? AND addressee_id = ?) OR (requester_id = ? AND addressee_id = ?)",
        )
        .bind(user1_id)
        .bind(user2_id)
        .bind(user2_id)
        .bind(user1_id)
        .execute(&self.connection_pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Create<Connection, NewConnection> for ConnectionRepository {
    #[instrument(skip(self, data), fields(requester = %data.requester_id, addressee = %data.addressee_id))]
    async fn create(&self, data: &NewConnection) -> Result<Connection, Error> {
        let result = sqlx::query(
            "INSERT INTO connections (requester_id, addressee_id, status) VALUES (?, ?, 'PENDING')",
        )
        .bind(data.requester_id)
        .bind(data.addressee_id)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Connection request {} created", new_id);
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Connection, i32> for ConnectionRepository {
    async fn read(&self, id: &i32) -> Result<Option<Connection>, Error> {
        let sql = format!(
            "SELECT {} FROM connections WHERE connection_id = ?",
            CONNECTION_COLUMNS
        );
        sqlx::query_as::<_, Connection>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i32> for ConnectionRepository {
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM connections WHERE connection_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
