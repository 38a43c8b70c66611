use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::normalize_tags;
use crate::scope::TaskListQuery;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is waiting for review.
    Review,
    /// Task is completed.
    Done,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// The project the task belongs to.
    pub project: Uuid,
    /// The user the task is assigned to, if any.
    pub assigned_to: Option<Uuid>,
    /// The user who created the task.
    pub created_by: Uuid,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Vec<String>,
    /// Opaque references to attached files.
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task together with the owner of its parent project.
///
/// Every authorization decision on a single task needs both, so they are
/// fetched with one join.
#[derive(Debug, FromRow)]
pub struct TaskWithOwner {
    #[sqlx(flatten)]
    pub task: Task,
    pub project_owner: Uuid,
}

/// Input structure for creating a task.
/// `createdBy` is never read from the body; it is the authenticated user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200, message = "Task title must be 1 to 200 characters"))]
    pub title: String,
    /// Must be between 1 and 2000 characters.
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Task description must be 1 to 2000 characters"
    ))]
    pub description: String,
    pub project: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "Estimated hours cannot be negative"))]
    pub estimated_hours: Option<f64>,
    #[validate(range(min = 0.0, message = "Actual hours cannot be negative"))]
    pub actual_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
}

/// Input structure for `PUT /api/tasks/{id}`. Only the fields present are changed;
/// the parent project and the creator cannot be changed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200, message = "Task title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Task description must be 1 to 2000 characters"
    ))]
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "Estimated hours cannot be negative"))]
    pub estimated_hours: Option<f64>,
    #[validate(range(min = 0.0, message = "Actual hours cannot be negative"))]
    pub actual_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
}

impl CreateTask {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }
}

impl UpdateTask {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|title| title.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.estimated_hours.is_none()
            && self.actual_hours.is_none()
            && self.tags.is_none()
            && self.attachments.is_none()
    }
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    /// Comma-separated list; a task matches when it carries any of them.
    pub tags: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// e.g. `-createdAt` or `priority,-dueDate`.
    pub sort_by: Option<String>,
}

/// Query parameters accepted by `GET /api/tasks/my-tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct MyTasksQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

pub(crate) const TASK_COLUMNS: &str = "id, title, description, project, assigned_to, created_by, \
     status, priority, due_date, estimated_hours, actual_hours, tags, attachments, created_at, \
     updated_at";

impl Task {
    /// Fetches a task and the owner of its project.
    pub async fn find_with_owner(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, TaskWithOwner>(
            "SELECT t.id, t.title, t.description, t.project, t.assigned_to, t.created_by, t.status,
                    t.priority, t.due_date, t.estimated_hours, t.actual_hours, t.tags,
                    t.attachments,
                    t.created_at, t.updated_at, p.owner AS project_owner
             FROM tasks t
             JOIN projects p ON p.id = t.project
             WHERE t.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        input: CreateTask,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks
                 (id, title, description, project, assigned_to, created_by, status, priority,
                                due_date, estimated_hours, actual_hours, tags, attachments)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.title)
        .bind(input.description)
        .bind(input.project)
        .bind(input.assigned_to)
        .bind(created_by)
        .bind(input.status.unwrap_or_default())
        .bind(input.priority.unwrap_or_default())
        .bind(input.due_date)
        .bind(input.estimated_hours)
        .bind(input.actual_hours)
        .bind(normalize_tags(input.tags.unwrap_or_default()))
        .bind(input.attachments.unwrap_or_default())
        .fetch_one(pool)
        .await
    }

    /// Applies a partial update and refreshes `updated_at`.
    pub async fn update(pool: &PgPool, id: Uuid, changes: UpdateTask) -> Result<Self, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = changes.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(assigned_to) = changes.assigned_to {
            builder.push(", assigned_to = ").push_bind(assigned_to);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            builder.push(", due_date = ").push_bind(due_date);
        }
        if let Some(hours) = changes.estimated_hours {
            builder.push(", estimated_hours = ").push_bind(hours);
        }
        if let Some(hours) = changes.actual_hours {
            builder.push(", actual_hours = ").push_bind(hours);
        }
        if let Some(tags) = changes.tags {
            builder.push(", tags = ").push_bind(normalize_tags(tags));
        }
        if let Some(attachments) = changes.attachments {
            builder.push(", attachments = ").push_bind(attachments);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        builder.build_query_as::<Task>().fetch_one(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All tasks of a project, newest first.
    pub async fn list_by_project(pool: &PgPool, project: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE project = $1 ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        ))
        .bind(project)
        .fetch_all(pool)
        .await
    }

    pub async fn list(pool: &PgPool, query: &TaskListQuery) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        query.push_select_tail(&mut builder);
        builder.build_query_as::<Task>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, query: &TaskListQuery) -> Result<i64, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        query.push_where(&mut builder);
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }
}
