//! Task DTOs - Data Transfer Objects per task e consegne

use crate::entities::{Submission, SubmissionStatus, Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskDTO {
    pub task_id: i32,
    pub post_id: i32,
    pub creator_id: i32,
    pub assignee_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskDTO {
    fn from(value: Task) -> Self {
        Self {
            task_id: value.task_id,
            post_id: value.post_id,
            creator_id: value.creator_id,
            assignee_id: value.assignee_id,
            title: value.title,
            description: value.description,
            status: value.status,
            due_date: value.due_date,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateTaskDTO {
    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub assignee_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Dati per l'inserimento di un task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub post_id: i32,
    pub creator_id: i32,
    pub assignee_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateTaskDTO {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTaskDTO {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignee_id.is_none()
            && self.due_date.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionDTO {
    pub submission_id: i32,
    pub task_id: i32,
    pub submitter_id: i32,
    pub content: String,
    pub attachment_url: Option<String>,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionDTO {
    fn from(value: Submission) -> Self {
        Self {
            submission_id: value.submission_id,
            task_id: value.task_id,
            submitter_id: value.submitter_id,
            content: value.content,
            attachment_url: value.attachment_url,
            status: value.status,
            feedback: value.feedback,
            created_at: value.created_at,
            reviewed_at: value.reviewed_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateSubmissionDTO {
    #[validate(length(min = 1, max = 10000, message = "Submission content must be between 1 and 10000 characters"))]
    pub content: String,
    #[validate(url(message = "attachment_url must be a valid URL"), length(max = 512))]
    pub attachment_url: Option<String>,
}

/// Dati per l'inserimento di una consegna
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub task_id: i32,
    pub submitter_id: i32,
    pub content: String,
    pub attachment_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct ReviewSubmissionDTO {
    pub status: SubmissionStatus,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}
