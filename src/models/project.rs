use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::normalize_tags;
use crate::scope::ProjectListQuery;

/// Lifecycle state of a project.
/// Corresponds to the `project_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

/// A project as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// The user who created the project. Never changes after creation.
    pub owner: Uuid,
    pub status: ProjectStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/projects`. The owner always comes from the token.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    #[validate(length(min = 1, max = 100, message = "Project name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Project description must be 1 to 1000 characters"
    ))]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// Payload for `PUT /api/projects/{id}`. Only the fields present are changed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 100, message = "Project name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Project description must be 1 to 1000 characters"
    ))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "Budget cannot be negative"))]
    pub budget: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl CreateProject {
    /// Trims free text so that blank names fail the length rule.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

impl UpdateProject {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.budget.is_none()
            && self.tags.is_none()
    }
}

/// Query parameters accepted by `GET /api/projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    /// Comma-separated list; a project matches when it carries any of them.
    pub tags: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub(crate) const PROJECT_COLUMNS: &str = "id, name, description, owner, status, start_date, \
     end_date, budget, tags, created_at, updated_at";

impl Project {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        input: CreateProject,
        owner: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects
                 (id, name, description, owner, status, start_date, end_date, budget, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            PROJECT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.description)
        .bind(owner)
        .bind(input.status.unwrap_or_default())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.budget)
        .bind(normalize_tags(input.tags.unwrap_or_default()))
        .fetch_one(pool)
        .await
    }

    /// Applies a partial update. `owner` is not part of [`UpdateProject`] and cannot change.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: UpdateProject,
    ) -> Result<Self, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE projects SET updated_at = NOW()");

        if let Some(name) = changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(start_date) = changes.start_date {
            builder.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = changes.end_date {
            builder.push(", end_date = ").push_bind(end_date);
        }
        if let Some(budget) = changes.budget {
            builder.push(", budget = ").push_bind(budget);
        }
        if let Some(tags) = changes.tags {
            builder.push(", tags = ").push_bind(normalize_tags(tags));
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PROJECT_COLUMNS);

        builder.build_query_as::<Project>().fetch_one(pool).await
    }

    /// Deletes the project; its tasks go with it (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of every project owned by `owner`, used to widen task visibility.
    pub async fn owned_ids(pool: &PgPool, owner: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE owner = $1")
            .bind(owner)
            .fetch_all(pool)
            .await
    }

    pub async fn list(pool: &PgPool, query: &ProjectListQuery) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM projects", PROJECT_COLUMNS));
        query.push_select_tail(&mut builder);
        builder.build_query_as::<Project>().fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool, query: &ProjectListQuery) -> Result<i64, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM projects");
        query.push_where(&mut builder);
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }
}
