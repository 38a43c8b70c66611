use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{envelope, page_envelope};
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateTask, MyTasksQuery, TaskQuery, UpdateTask},
    services::tasks,
};

/// Retrieves the tasks visible to the caller.
///
/// Admins see every task. Other users see tasks in projects they own, tasks
/// assigned to them and tasks they created.
///
/// ## Query Parameters:
/// - `project`, `status`, `priority`, `assignedTo` (optional): exact-match filters.
/// - `tags` (optional): comma-separated, a task matches when it has any of them.
/// - `page`, `limit` (optional): defaults 1 and 10.
/// - `sortBy` (optional): e.g. `-dueDate,priority`; default `-createdAt`.
///
/// ## Responses:
/// - `200 OK`: `count`, `total`, `page`, `pages` and `data.tasks`.
/// - `400 Bad Request`: unknown sort field or bad pagination values.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let page = tasks::list(&pool, &current.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(page_envelope("tasks", &page)))
}

/// Tasks assigned to the caller, newest first.
#[get("/my-tasks")]
pub async fn my_tasks(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    query: web::Query<MyTasksQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::my_tasks(&pool, &current.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": tasks.len(),
        "data": { "tasks": tasks },
    })))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: `data.task`.
/// - `403 Forbidden`: the caller is not the project owner, the assignee or the creator.
/// - `404 Not Found`: If no task with the given ID exists.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks::get(&pool, &current.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(None, json!({ "task": task }))))
}

/// Creates a task in a project owned by the caller. `createdBy` is always the caller.
///
/// ## Responses:
/// - `201 Created`: `data.task`.
/// - `400 Bad Request`: invalid body.
/// - `403 Forbidden`: the caller does not own the project.
/// - `404 Not Found`: the project does not exist.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    body: web::Json<CreateTask>,
) -> Result<impl Responder, AppError> {
    let task = tasks::create(&pool, &current.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(envelope(
        Some("Task created successfully"),
        json!({ "task": task }),
    )))
}

/// Partially updates a task. Allowed for the project owner and the task creator.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTask>,
) -> Result<impl Responder, AppError> {
    let task = tasks::update(&pool, &current.actor(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(
        Some("Task updated successfully"),
        json!({ "task": task }),
    )))
}

#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks::delete(&pool, &current.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(
        Some("Task deleted successfully"),
        json!({}),
    )))
}
