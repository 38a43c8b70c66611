use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::view::{task_view, task_views, TaskView};
use crate::models::{
    CreateTask, MyTasksQuery, Project, Task, TaskQuery, TaskWithOwner, UpdateTask,
};
use crate::policy::{authorize, Action, Actor, Resource};
use crate::scope::{scope_my_tasks, scope_tasks, Page};

use super::projects;

async fn load(pool: &PgPool, id: Uuid) -> Result<TaskWithOwner, AppError> {
    Task::find_with_owner(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Tasks visible to the actor. Non-admins first resolve the projects they own.
pub async fn list(
    pool: &PgPool,
    actor: &Actor,
    params: &TaskQuery,
) -> Result<Page<TaskView>, AppError> {
    let owned_projects = if actor.is_admin() {
        Vec::new()
    } else {
        Project::owned_ids(pool, actor.id).await?
    };

    let query = scope_tasks(actor, params, owned_projects)?;
    let pagination = query
        .pagination
        .ok_or_else(|| AppError::Internal("Task listing requires a page window".into()))?;

    let total = Task::count(pool, &query).await?;
    let tasks = Task::list(pool, &query).await?;
    Ok(Page::new(task_views(pool, tasks).await?, total, pagination))
}

/// Tasks assigned to the actor, whatever their role.
pub async fn my_tasks(
    pool: &PgPool,
    actor: &Actor,
    params: &MyTasksQuery,
) -> Result<Vec<TaskView>, AppError> {
    let query = scope_my_tasks(actor, params);
    let tasks = Task::list(pool, &query).await?;
    Ok(task_views(pool, tasks).await?)
}

pub async fn get(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<TaskView, AppError> {
    let record = load(pool, id).await?;
    authorize(actor, &Resource::from(&record), Action::Read)?;
    Ok(task_view(pool, record.task).await?)
}

/// `createdBy` is forced to the actor. Only the owner of the target project
/// (or an admin) may create tasks in it.
pub async fn create(pool: &PgPool, actor: &Actor, input: CreateTask) -> Result<TaskView, AppError> {
    let project = projects::load(pool, input.project).await?;
    authorize(actor, &Resource::from(&project), Action::CreateTaskUnder)?;

    let input = input.normalized();
    input.validate()?;

    let task = Task::create(pool, input, actor.id).await?;
    log::info!(
        "User {} created task {} in project {}",
        actor.id,
        task.id,
        project.id
    );
    Ok(task_view(pool, task).await?)
}

pub async fn update(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    changes: UpdateTask,
) -> Result<TaskView, AppError> {
    let record = load(pool, id).await?;
    authorize(actor, &Resource::from(&record), Action::Update)?;

    let changes = changes.normalized();
    changes.validate()?;
    let task = if changes.is_empty() {
        record.task
    } else {
        Task::update(pool, record.task.id, changes).await?
    };

    Ok(task_view(pool, task).await?)
}

pub async fn delete(pool: &PgPool, actor: &Actor, id: Uuid) -> Result<(), AppError> {
    let record = load(pool, id).await?;
    authorize(actor, &Resource::from(&record), Action::Delete)?;

    if !Task::delete(pool, record.task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    log::info!("User {} deleted task {}", actor.id, record.task.id);
    Ok(())
}
