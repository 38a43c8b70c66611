#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use taskboard::models::{TaskPriority, TaskStatus, TaskView};

use common::bearer;

async fn create_project<S, B>(app: &S, token: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(bearer(token))
        .set_json(json!({
            "name": "Task host",
            "description": "Holds tasks",
            "startDate": "2024-02-01T00:00:00Z"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    body["data"]["project"]["id"].as_str().unwrap().to_string()
}

fn task_from(body: &Value) -> TaskView {
    serde_json::from_value(body["data"]["task"].clone()).expect("task in response")
}

#[actix_rt::test]
async fn test_create_task_without_token_is_unauthorized() {
    let app = init_app!(common::lazy_pool());

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .set_json(json!({ "title": "Sneaky", "status": TaskStatus::Todo }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_assignee_can_read_but_not_update() {
    let pool = common::database_pool().await;
    let app = init_app!(pool.clone());

    let owner = common::register_user(&app, "task_owner", "user").await;
    let assignee = common::register_user(&app, "task_assignee", "user").await;
    let stranger = common::register_user(&app, "task_stranger", "user").await;
    let project_id = create_project(&app, &owner.token).await;

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&owner.token))
        .set_json(json!({
            "title": "Write the docs",
            "description": "All of them",
            "project": project_id,
            "assignedTo": assignee.id,
            "createdBy": stranger.id,
            "priority": TaskPriority::High,
            "estimatedHours": 4.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task = task_from(&test::read_body_json(resp).await);
    assert_eq!(task.created_by.id, owner.id);
    assert_eq!(task.created_by.email, owner.email);
    assert_eq!(task.assigned_to.as_ref().map(|user| user.id), Some(assignee.id));
    assert_eq!(task.project.id.to_string(), project_id);
    assert_eq!(task.project.name, "Task host");
    assert_eq!(task.status, TaskStatus::Todo);

    // Assignee: update denied, read allowed
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&assignee.token))
        .set_json(json!({ "status": "done" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized to update this task");

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&assignee.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Stranger sees nothing
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&stranger.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&stranger.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 0);

    // Assignee sees it in both lists
    let req = test::TestRequest::get()
        .uri("/api/tasks?priority=high")
        .insert_header(bearer(&assignee.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"]["tasks"][0]["id"], task.id.to_string());
    assert_eq!(body["data"]["tasks"][0]["project"]["status"], "planning");
    assert_eq!(body["data"]["tasks"][0]["assignedTo"]["email"], assignee.email.as_str());

    let req = test::TestRequest::get()
        .uri("/api/tasks/my-tasks")
        .insert_header(bearer(&assignee.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);

    // Owner updates; project and creator stay put
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&owner.token))
        .set_json(json!({ "status": "in-progress", "actualHours": 1.5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = task_from(&test::read_body_json(resp).await);
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.title, "Write the docs");
    assert_eq!(updated.actual_hours, Some(1.5));
    assert!(updated.updated_at >= task.updated_at);

    // Stats
    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/stats", project_id))
        .insert_header(bearer(&owner.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let stats = &body["data"]["stats"];
    assert_eq!(stats["totalTasks"], 1);
    assert_eq!(stats["tasksByStatus"]["inProgress"], 1);
    assert_eq!(stats["tasksByPriority"]["high"], 1);
    assert_eq!(stats["totalEstimatedHours"], 4.0);
    assert_eq!(stats["totalActualHours"], 1.5);

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/stats", project_id))
        .insert_header(bearer(&assignee.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    common::cleanup_users(&pool, &[owner.id, assignee.id, stranger.id]).await;
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_task_creation_rules_and_cascade() {
    let pool = common::database_pool().await;
    let app = init_app!(pool.clone());

    let owner = common::register_user(&app, "cascade_owner", "user").await;
    let other = common::register_user(&app, "cascade_other", "user").await;
    let project_id = create_project(&app, &owner.token).await;

    // Missing project
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&owner.token))
        .set_json(json!({
            "title": "Orphan",
            "description": "No such project",
            "project": uuid::Uuid::new_v4()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Someone else's project
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&other.token))
        .set_json(json!({
            "title": "Intruder",
            "description": "Not my project",
            "project": project_id
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Permission is decided before the body is validated
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&other.token))
        .set_json(json!({
            "title": "   ",
            "description": "Blank title, wrong project",
            "project": project_id
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Bad sort field
    let req = test::TestRequest::get()
        .uri("/api/tasks?sortBy=password")
        .insert_header(bearer(&owner.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut ids = Vec::new();
    for (title, due) in [("Later", "2024-06-01T00:00:00Z"), ("Sooner", "2024-03-01T00:00:00Z")] {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(&owner.token))
            .set_json(json!({
                "title": title,
                "description": "Sorted by due date",
                "project": project_id,
                "dueDate": due,
                "tags": ["docs"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        ids.push(task_from(&test::read_body_json(resp).await).id);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks?project={}&tags=docs&sortBy=dueDate", project_id))
        .insert_header(bearer(&owner.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"]["tasks"][0]["title"], "Sooner");

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&owner.token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["tasks"].as_array().unwrap().len(), 2);

    // Deleting the project takes its tasks with it
    let req = test::TestRequest::delete()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&owner.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for id in ids {
        let req = test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", id))
            .insert_header(bearer(&owner.token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    common::cleanup_users(&pool, &[owner.id, other.id]).await;
}
