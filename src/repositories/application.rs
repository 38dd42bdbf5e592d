//! ApplicationRepository - Repository per le candidature

use super::{Create, Delete, Read};
use crate::dtos::NewApplication;
use crate::entities::{Application, ApplicationStatus};
use sqlx::{Error, MySqlPool};
use tracing::{debug, info, instrument};

const APPLICATION_COLUMNS: &str =
    "application_id, post_id, applicant_id, cover_letter, status, created_at, updated_at";

pub struct ApplicationRepository {
    connection_pool: MySqlPool,
}

impl ApplicationRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_by_post_and_applicant(
        &self,
        post_id: &i32,
        applicant_id: &i32,
    ) -> Result<Option<Application>, Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE post_id = ? AND applicant_id = ?",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(post_id)
            .bind(applicant_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_post_id(&self, post_id: &i32) -> Result<Vec<Application>, Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE post_id = ? ORDER BY created_at ASC, application_id ASC",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(post_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_applicant_id(
        &self,
        applicant_id: &i32,
    ) -> Result<Vec<Application>, Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE applicant_id = ? ORDER BY created_at DESC, application_id DESC",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(applicant_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// True if `user_id` has an APPROVED application to `post_id`
    pub async fn is_approved_member(&self, post_id: &i32, user_id: &i32) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE post_id = ? AND applicant_id = ? AND status = 'APPROVED'",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;
        Ok(count > 0)
    }

    /// Moves a PENDING application to `new_status`.
    /// Returns false when the application was no longer pending.
    #[instrument(skip(self))]
    pub async fn update_status_if_pending(
        &self,
        application_id: &i32,
        new_status: ApplicationStatus,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE applications SET status = ?, updated_at = CURRENT_TIMESTAMP(3) \
             WHERE application_id = ? AND status = 'PENDING'",
        )
        .bind(new_status.as_str())
        .bind(application_id)
        .execute(&self.connection_pool)
        .await?;

        let updated = result.rows_affected() > 0;
        debug!(updated, "Application status update attempted");
        Ok(updated)
    }

    /// Approva una candidatura PENDING e aggiunge candidato e autore alla chat
    /// di progetto del post (creata alla prima approvazione), in un'unica
    /// transazione. `None` se la candidatura non era più PENDING.
    #[instrument(skip(self, application, chat_title), fields(application_id = %application.application_id))]
    pub async fn approve_into_project_chat(
        &self,
        application: &Application,
        owner_id: &i32,
        chat_title: &str,
    ) -> Result<Option<i32>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "UPDATE applications SET status = 'APPROVED', updated_at = CURRENT_TIMESTAMP(3) \
             WHERE application_id = ? AND status = 'PENDING'",
        )
        .bind(application.application_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        // il vincolo UNIQUE su chats.post_id rende sicure le approvazioni concorrenti
        sqlx::query("INSERT IGNORE INTO chats (title, is_group, post_id) VALUES (?, TRUE, ?)")
            .bind(chat_title)
            .bind(application.post_id)
            .execute(&mut *tx)
            .await?;

        let chat_id: i32 = sqlx::query_scalar("SELECT chat_id FROM chats WHERE post_id = ?")
            .bind(application.post_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT IGNORE INTO chat_participants (chat_id, user_id) VALUES (?, ?), (?, ?)",
        )
        .bind(chat_id)
        .bind(owner_id)
        .bind(chat_id)
        .bind(application.applicant_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Application approved, applicant {} joined chat {}",
            application.applicant_id, chat_id
        );
        Ok(Some(chat_id))
    }
}

impl Create<Application, NewApplication> for ApplicationRepository {
    #[instrument(skip(self, data), fields(post_id = %data.post_id, applicant_id = %data.applicant_id))]
    async fn create(&self, data: &NewApplication) -> Result<Application, Error> {
        let result = sqlx::query(
            "INSERT INTO applications (post_id, applicant_id, cover_letter, status) VALUES (?, ?, ?, 'PENDING')",
        )
        .bind(data.post_id)
        .bind(data.applicant_id)
        .bind(&data.cover_letter)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Application created with id {}", new_id);
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Application, i32> for ApplicationRepository {
    async fn read(&self, id: &i32) -> Result<Option<Application>, Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE application_id = ?",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i32> for ApplicationRepository {
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM applications WHERE application_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_duplicate_application_is_rejected_by_db(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ApplicationRepository::new(pool);
        let data = NewApplication {
            post_id: 1,
            applicant_id: 3,
            cover_letter: None,
        };

        repo.create(&data).await?;
        let err = repo.create(&data).await.unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("unexpected error: {:?}", other),
        }
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_status_only_changes_from_pending(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ApplicationRepository::new(pool);
        let application = repo
            .create(&NewApplication {
                post_id: 1,
                applicant_id: 3,
                cover_letter: Some("hello".to_string()),
            })
            .await?;

        assert!(
            repo.update_status_if_pending(&application.application_id, ApplicationStatus::Approved)
                .await?
        );
        assert!(
            !repo
                .update_status_if_pending(&application.application_id, ApplicationStatus::Rejected)
                .await?
        );
        assert!(repo.is_approved_member(&1, &3).await?);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_approval_joins_project_chat(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ApplicationRepository::new(pool.clone());
        let application = repo
            .create(&NewApplication {
                post_id: 1,
                applicant_id: 3,
                cover_letter: None,
            })
            .await?;

        let chat_id = repo
            .approve_into_project_chat(&application, &1, "Project")
            .await?
            .unwrap();
        let members: Vec<i32> = sqlx::query_scalar(
            "SELECT user_id FROM chat_participants WHERE chat_id = ? ORDER BY user_id",
        )
        .bind(chat_id)
        .fetch_all(&pool)
        .await?;
        assert_eq!(members, vec![1, 3]);

        // già approvata: nessuna modifica
        assert!(
            repo.approve_into_project_chat(&application, &1, "Project")
                .await?
                .is_none()
        );
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts")))]
    async fn test_failed_chat_step_keeps_application_pending(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ApplicationRepository::new(pool);
        let application = repo
            .create(&NewApplication {
                post_id: 1,
                applicant_id: 3,
                cover_letter: None,
            })
            .await?;

        // post inesistente: la chat non può essere creata e la transazione fallisce
        let mut orphan = application.clone();
        orphan.post_id = 999;
        assert!(repo.approve_into_project_chat(&orphan, &1, "Ghost").await.is_err());

        let reloaded = repo.read(&application.application_id).await?.unwrap();
        assert_eq!(reloaded.status, ApplicationStatus::Pending);

        // la candidatura resta approvabile
        assert!(
            repo.approve_into_project_chat(&application, &1, "Project")
                .await?
                .is_some()
        );
        Ok(())
    }
}
