use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{envelope, page_envelope};
use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateProject, ProjectQuery, UpdateProject},
    services::projects,
};

/// Lists projects visible to the caller.
///
/// Admins see every project, other users only the ones they own.
/// Supports `status`, `tags` (comma-separated, any match), `page` and `limit`.
#[get("")]
pub async fn list_projects(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    query: web::Query<ProjectQuery>,
) -> Result<impl Responder, AppError> {
    let page = projects::list(&pool, &current.actor(), &query).await?;
    Ok(HttpResponse::Ok().json(page_envelope("projects", &page)))
}

/// Returns one project with its tasks.
///
/// ## Responses:
/// - `200 OK`: `data.project` and `data.tasks`.
/// - `403 Forbidden`: the caller is neither the owner nor an admin.
/// - `404 Not Found`: no project with that id.
#[get("/{id}")]
pub async fn get_project(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let (project, tasks) = projects::get(&pool, &current.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(
        None,
        json!({ "project": project, "tasks": tasks }),
    )))
}

/// Creates a project owned by the caller.
#[post("")]
pub async fn create_project(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    body: web::Json<CreateProject>,
) -> Result<impl Responder, AppError> {
    let project = projects::create(&pool, &current.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(envelope(
        Some("Project created successfully"),
        json!({ "project": project }),
    )))
}

#[put("/{id}")]
pub async fn update_project(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProject>,
) -> Result<impl Responder, AppError> {
    let project = projects::update(
        &pool,
        &current.actor(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(envelope(
        Some("Project updated successfully"),
        json!({ "project": project }),
    )))
}

/// Deletes a project and every task in it.
#[delete("/{id}")]
pub async fn delete_project(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    projects::delete(&pool, &current.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(
        Some("Project deleted successfully"),
        json!({}),
    )))
}

/// Task counts by status and priority plus hour totals, computed on request.
#[get("/{id}/stats")]
pub async fn project_stats(
    pool: web::Data<PgPool>,
    current: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let (project, stats) = projects::stats(&pool, &current.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(envelope(
        None,
        json!({ "project": project, "stats": stats }),
    )))
}
