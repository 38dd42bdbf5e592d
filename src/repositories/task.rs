//! TaskRepository - Repository per i task di un post

use super::{Create, Delete, Read, Update};
use crate::dtos::{NewTask, UpdateTaskDTO};
use crate::entities::Task;
use sqlx::{Error, MySqlPool, QueryBuilder};
use tracing::{debug, info, instrument};

const TASK_COLUMNS: &str =
    "task_id, post_id, creator_id, assignee_id, title, description, status, due_date, created_at";

pub struct TaskRepository {
    connection_pool: MySqlPool,
}

impl TaskRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_many_by_post_id(&self, post_id: &i32) -> Result<Vec<Task>, Error> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE post_id = ? ORDER BY created_at ASC, task_id ASC",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(post_id)
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Task, NewTask> for TaskRepository {
    #[instrument(skip(self, data), fields(post_id = %data.post_id))]
    async fn create(&self, data: &NewTask) -> Result<Task, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (post_id, creator_id, assignee_id, title, description, status, due_date)
            VALUES (?, ?, ?, ?, ?, 'OPEN', ?)
            "#,
        )
        .bind(data.post_id)
        .bind(data.creator_id)
        .bind(data.assignee_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_date)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        info!("Task created with id {}", new_id);
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Task, i32> for TaskRepository {
    async fn read(&self, id: &i32) -> Result<Option<Task>, Error> {
        let sql = format!("SELECT {} FROM tasks WHERE task_id = ?", TASK_COLUMNS);
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Task, UpdateTaskDTO, i32> for TaskRepository {
    #[instrument(skip(self, data), fields(task_id = %id))]
    async fn update(&self, id: &i32, data: &UpdateTaskDTO) -> Result<Task, Error> {
        let current_task = self.read(id).await?.ok_or(Error::RowNotFound)?;

        if data.is_empty() {
            debug!("No fields to update, returning current task");
            return Ok(current_task);
        }

        let mut query_builder = QueryBuilder::new("UPDATE tasks SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref title) = data.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(status) = data.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }
        if let Some(assignee_id) = data.assignee_id {
            separated.push("assignee_id = ");
            separated.push_bind_unseparated(assignee_id);
        }
        if let Some(due_date) = data.due_date {
            separated.push("due_date = ");
            separated.push_bind_unseparated(due_date);
        }
        query_builder.push(" WHERE task_id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;
        info!("Task updated successfully");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i32> for TaskRepository {
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query("DELETE FROM tasks WHERE task_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(())
    }
}
