pub mod auth;
pub mod projects;
pub mod system;
pub mod tasks;

pub use system::welcome;

use actix_web::web;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::scope::Page;

/// Mounts every `/api` route. Extractor failures are rendered through `AppError`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(system::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::me)
                .service(auth::update_details)
                .service(auth::update_password),
        )
        .service(
            web::scope("/projects")
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::project_stats)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::my_tasks)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// `{success: true, [message], data}`.
pub(crate) fn envelope(message: Option<&str>, data: Value) -> Value {
    let mut body = json!({ "success": true, "data": data });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    body
}

/// List envelope: the page numbers sit next to `data`, the items under `data.<key>`.
pub(crate) fn page_envelope<T: Serialize>(key: &str, page: &Page<T>) -> Value {
    let mut data = Map::new();
    data.insert(key.to_string(), json!(page.items));

    json!({
        "success": true,
        "count": page.count,
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "data": data,
    })
}
