//! Unauthenticated service endpoints: the root document and the health check.

use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// `GET /` lists what the API offers.
#[get("/")]
pub async fn welcome() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the Taskboard API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "projects": "/api/projects",
            "tasks": "/api/tasks",
            "health": "/api/health"
        }
    }))
}

/// `GET /api/health`. Listed as public in `AuthMiddleware`.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "API is running",
        "status": "ok",
        "timestamp": Utc::now()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_welcome_lists_endpoints() {
        let app = test::init_service(App::new().service(welcome)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["endpoints"]["tasks"], "/api/tasks");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_health_reports_running() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "API is running");
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }
}
