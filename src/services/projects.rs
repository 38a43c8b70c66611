use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::view::{project_view, project_views, ProjectView};
use crate::models::{CreateProject, Project, ProjectQuery, Task, UpdateProject};
use crate::policy::{authorize, Action, Actor, Resource};
use crate::scope::{scope_projects, Page};
use crate::stats::ProjectStats;

/// Loads a project or fails with 404.
pub(crate) async fn load(pool: &PgPool, id: Uuid) -> Result<Project, AppError> {
    Project::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Projects visible to the actor, one page at a time.
pub async fn list(
    pool: &PgPool,
    actor: &Actor,
    params: &ProjectQuery,
) -> Result<Page<ProjectView>, AppError> {
    let query = scope_projects(actor, params)?;
    let total = Project::count(pool, &query).await?;
    let projects = Project::list(pool, &query).await?;
    Ok(Page::new(
        project_views(pool, projects).await?,
        total,
        query.pagination,
    ))
}

/// A single project with its owner embedded, together with its tasks.
pub async fn get(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
) -> Result<(ProjectView, Vec<Task>), AppError> {
    let project = load(pool, id).await?;
    authorize(actor, &Resource::from(&project), Action::Read)?;

    let tasks = Task::list_by_project(pool, project.id).await?;
    Ok((project_view(pool, project).await?, tasks))
}

/// The owner is always the actor; nothing in the body can override it.
pub async fn create(
    pool: &PgPool,
    actor: &Actor,
    input: CreateProject,
) -> Result<Project, AppError> {
    let input = input.normalized();
    input.validate()?;

    let project = Project::create(pool, input, actor.id).await?;
    log::info!("User {} created project {}", actor.id, project.id);
    Ok(project)
}

pub async fn update(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    changes: UpdateProject,
) -> Result<Project, AppError> {
    let project = load(pool, id).await?;
    authorize(actor, &Resource::from(&project), Action::Update)?;

    let changes = changes.normalized();
    changes.validate()?;
    if changes.is_empty() {
        return Ok(project);
    }

    Ok(Project::update(pool, project.id, changes).await?)
}

/// Deletes the project and, through the foreign key, all of its tasks.
pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), AppError> {
    let project = load(pool, id).await?;
    authorize(actor, &Resource::from(&project), Action::Delete)?;

    if !Project::delete(pool, project.id).await? {
        return Err(AppError::NotFound("Project not found".into()));
    }
    log::info!("User {} deleted project {}", actor.id, project.id);
    Ok(())
}

/// Aggregates are recomputed from the current task set on every call.
pub async fn stats(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
) -> Result<(Project, ProjectStats), AppError> {
    let project = load(pool, id).await?;
    authorize(actor, &Resource::from(&project), Action::Read)?;

    let tasks = Task::list_by_project(pool, project.id).await?;
    Ok((project, ProjectStats::from_tasks(&tasks)))
}
