//! SubmissionRepository - Repository per le consegne dei task

use super::{Create, Read};
use crate::dtos::NewSubmission;
use crate::entities::{Submission, SubmissionStatus, TaskStatus};
use sqlx::{Error, MySqlPool};
use tracing::{info, instrument};

const SUBMISSION_COLUMNS: &str = "submission_id, task_id, submitter_id, content, attachment_url, \
                                  status, feedback, created_at, reviewed_at";

pub struct SubmissionRepository {
    connection_pool: MySqlPool,
}

impl SubmissionRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// All submissions of a task, optionally restricted to one submitter
    #[instrument(skip(self))]
    pub async fn find_many_by_task_id(
        &self,
        task_id: &i32,
        submitter_id: Option<i32>,
    ) -> Result<Vec<Submission>, Error> {
        let submissions = match submitter_id {
            Some(submitter_id) => {
                let sql = format!(
                    "SELECT {} FROM submissions WHERE task_id = ? AND submitter_id = ? \
                     ORDER BY created_at DESC, submission_id DESC",
                    SUBMISSION_COLUMNS
                );
                sqlx::query_as::<_, Submission>(&sql)
                    .bind(task_id)
                    .bind(submitter_id)
                    .fetch_all(&self.connection_pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM submissions WHERE task_id = ? \
                     ORDER BY created_at DESC, submission_id DESC",
                    SUBMISSION_COLUMNS
                );
                sqlx::query_as::<_, Submission>(&sql)
                    .bind(task_id)
                    .fetch_all(&self.connection_pool)
                    .await?
            }
        };
        Ok(submissions)
    }

    /// Reviews a PENDING submission; returns false if it was already reviewed.
    /// An ACCEPTED review completes the task in the same transaction.
    #[instrument(skip(self, feedback))]
    pub async fn review_if_pending(
        &self,
        submission_id: &i32,
        task_id: &i32,
        status: SubmissionStatus,
        feedback: Option<&str>,
    ) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "UPDATE submissions SET status = ?, feedback = ?, reviewed_at = CURRENT_TIMESTAMP(3) \
             WHERE submission_id = ? AND task_id = ? AND status = 'PENDING'",
        )
        .bind(status.as_str())
        .bind(feedback)
        .bind(submission_id)
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if status == SubmissionStatus::Accepted {
            let completed = sqlx::query("UPDATE tasks SET status = ? WHERE task_id = ?")
                .bind(TaskStatus::Completed.as_str())
                .bind(task_id)
                .execute(&mut *tx)
                .await?;
            if completed.rows_affected() == 0 {
                return Err(Error::RowNotFound);
            }
            info!("Task {} completed", task_id);
        }

        tx.commit().await?;
        Ok(true)
    }
}

impl Create<Submission, NewSubmission> for SubmissionRepository {
    #[instrument(skip(self, data), fields(task_id = %data.task_id))]
    async fn create(&self, data: &NewSubmission) -> Result<Submission, Error> {
        let result = sqlx::query(
            "INSERT INTO submissions (task_id, submitter_id, content, attachment_url, status) \
             VALUES (?, ?, ?, ?, 'PENDING')",
        )
        .bind(data.task_id)
        .bind(data.submitter_id)
        .bind(&data.content)
        .bind(&data.attachment_url)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Submission created with id {}", new_id);
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Submission, i32> for SubmissionRepository {
    async fn read(&self, id: &i32) -> Result<Option<Submission>, Error> {
        let sql = format!(
            "SELECT {} FROM submissions WHERE submission_id = ?",
            SUBMISSION_COLUMNS
        );
        sqlx::query_as::<_, Submission>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_submission(pool: &MySqlPool) -> sqlx::Result<(i32, i32)> {
        let task_id = sqlx::query(
            "INSERT INTO tasks (post_id, creator_id, title, status) VALUES (1, 1, 'Logo', 'OPEN')",
        )
        .execute(pool)
        .await?
        .last_insert_id() as i32;
        let submission = SubmissionRepository::new(pool.clone())
            .create(&NewSubmission {
                task_id,
                submitter_id: 2,
                content: "Draft attached".to_string(),
                attachment_url: None,
            })
            .await?;
        Ok((task_id, submission.submission_id))
    }

    async fn task_status(pool: &MySqlPool, task_id: i32) -> sqlx::Result<String> {
        sqlx::query_scalar("SELECT status FROM tasks WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(pool)
            .await
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "applications")))]
    async fn test_accepting_completes_task(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = SubmissionRepository::new(pool.clone());
        let (task_id, submission_id) = seed_submission(&pool).await?;

        assert!(
            repo.review_if_pending(&submission_id, &task_id, SubmissionStatus::Accepted, Some("ok"))
                .await?
        );
        assert_eq!(task_status(&pool, task_id).await?, "COMPLETED");

        assert!(
            !repo
                .review_if_pending(&submission_id, &task_id, SubmissionStatus::Rejected, None)
                .await?
        );
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "applications")))]
    async fn test_rejecting_leaves_task_open(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = SubmissionRepository::new(pool.clone());
        let (task_id, submission_id) = seed_submission(&pool).await?;

        assert!(
            repo.review_if_pending(&submission_id, &task_id, SubmissionStatus::Rejected, None)
                .await?
        );
        assert_eq!(task_status(&pool, task_id).await?, "OPEN");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "posts", "applications")))]
    async fn test_review_rolls_back_when_task_is_gone(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = SubmissionRepository::new(pool.clone());
        let (task_id, submission_id) = seed_submission(&pool).await?;

        // submission orfana: il task viene rimosso senza passare dal cascade
        let mut conn = pool.acquire().await?;
        sqlx::query("SET FOREIGN_KEY_CHECKS = 0").execute(&mut *conn).await?;
        sqlx::query("DELETE FROM tasks WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("SET FOREIGN_KEY_CHECKS = 1").execute(&mut *conn).await?;
        drop(conn);

        assert!(
            repo.review_if_pending(&submission_id, &task_id, SubmissionStatus::Accepted, None)
                .await
                .is_err()
        );
        let reloaded = repo.read(&submission_id).await?.unwrap();
        assert_eq!(reloaded.status, SubmissionStatus::Pending);
        Ok(())
    }
}
