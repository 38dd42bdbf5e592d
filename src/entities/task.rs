//! Task entity - Attività assegnate sotto un post e relative consegne

use super::enums::{SubmissionStatus, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub task_id: i32,
    pub post_id: i32,
    pub creator_id: i32,
    pub assignee_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Submission {
    pub submission_id: i32,
    pub task_id: i32,
    pub submitter_id: i32,
    pub content: String,
    pub attachment_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
