//! Response shapes with their related records embedded.
//!
//! Tasks carry a summary of their project, their assignee and their creator;
//! projects carry a summary of their owner. The summaries are loaded with one
//! batched query per related table, after the main query, so the list queries
//! in `scope` keep working on bare tables.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Project, ProjectStatus, Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub owner: Uuid,
}

/// A task as returned by the task endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub project: ProjectSummary,
    pub assigned_to: Option<UserSummary>,
    pub created_by: UserSummary,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Vec<String>,
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project as returned by the project list and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner: UserSummary,
    pub status: ProjectStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    pub fn new(
        task: Task,
        project: ProjectSummary,
        assigned_to: Option<UserSummary>,
        created_by: UserSummary,
    ) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            project,
            assigned_to,
            created_by,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            tags: task.tags,
            attachments: task.attachments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl ProjectView {
    pub fn new(project: Project, owner: UserSummary) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            owner,
            status: project.status,
            start_date: project.start_date,
            end_date: project.end_date,
            budget: project.budget,
            tags: project.tags,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

async fn user_summaries(
    pool: &PgPool,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, sqlx::Error> {
    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, email FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}

async fn project_summaries(
    pool: &PgPool,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, ProjectSummary>, sqlx::Error> {
    let projects = sqlx::query_as::<_, ProjectSummary>(
        "SELECT id, name, status, owner FROM projects WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(projects.into_iter().map(|project| (project.id, project)).collect())
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Pairs every task with its summaries, keeping the order of `tasks`.
///
/// A project or creator that cannot be found means the task vanished
/// underneath the request, which reads as `RowNotFound`. A missing assignee
/// is just left out.
pub fn join_tasks(
    tasks: Vec<Task>,
    projects: &HashMap<Uuid, ProjectSummary>,
    users: &HashMap<Uuid, UserSummary>,
) -> Result<Vec<TaskView>, sqlx::Error> {
    tasks
        .into_iter()
        .map(|task| {
            let project = projects.get(&task.project).cloned();
            let created_by = users.get(&task.created_by).cloned();
            let assigned_to = task.assigned_to.and_then(|id| users.get(&id).cloned());
            match (project, created_by) {
                (Some(project), Some(created_by)) => {
                    Ok(TaskView::new(task, project, assigned_to, created_by))
                }
                _ => Err(sqlx::Error::RowNotFound),
            }
        })
        .collect()
}

pub fn join_projects(
    projects: Vec<Project>,
    users: &HashMap<Uuid, UserSummary>,
) -> Result<Vec<ProjectView>, sqlx::Error> {
    projects
        .into_iter()
        .map(|project| {
            let owner = users
                .get(&project.owner)
                .cloned()
                .ok_or(sqlx::Error::RowNotFound)?;
            Ok(ProjectView::new(project, owner))
        })
        .collect()
}

/// Loads the summaries the tasks refer to and embeds them.
pub async fn task_views(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskView>, sqlx::Error> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let project_ids = distinct(tasks.iter().map(|task| task.project));
    let user_ids = distinct(
        tasks
            .iter()
            .flat_map(|task| std::iter::once(task.created_by).chain(task.assigned_to)),
    );

    let projects = project_summaries(pool, project_ids).await?;
    let users = user_summaries(pool, user_ids).await?;
    join_tasks(tasks, &projects, &users)
}

pub async fn task_view(pool: &PgPool, task: Task) -> Result<TaskView, sqlx::Error> {
    task_views(pool, vec![task])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn project_views(
    pool: &PgPool,
    projects: Vec<Project>,
) -> Result<Vec<ProjectView>, sqlx::Error> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let owners = distinct(projects.iter().map(|project| project.owner));
    let users = user_summaries(pool, owners).await?;
    join_projects(projects, &users)
}

pub async fn project_view(pool: &PgPool, project: Project) -> Result<ProjectView, sqlx::Error> {
    project_views(pool, vec![project])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(name: &str) -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn project_summary(owner: &UserSummary) -> ProjectSummary {
        ProjectSummary {
            id: Uuid::new_v4(),
            name: "Launch".to_string(),
            status: ProjectStatus::Active,
            owner: owner.id,
        }
    }

    fn task(project: Uuid, created_by: Uuid, assigned_to: Option<Uuid>, title: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Something to do".to_string(),
            project,
            assigned_to,
            created_by,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            estimated_hours: Some(3.0),
            actual_hours: None,
            tags: vec!["docs".to_string()],
            attachments: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_join_tasks_embeds_relations_in_order() {
        let owner = user("Ada");
        let helper = user("Grace");
        let project = project_summary(&owner);

        let tasks = vec![
            task(project.id, owner.id, Some(helper.id), "first"),
            task(project.id, owner.id, None, "second"),
        ];
        let projects = HashMap::from([(project.id, project.clone())]);
        let users = HashMap::from([(owner.id, owner.clone()), (helper.id, helper.clone())]);

        let views = join_tasks(tasks, &projects, &users).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].title, "first");
        assert_eq!(views[0].project, project);
        assert_eq!(views[0].assigned_to, Some(helper));
        assert_eq!(views[0].created_by, owner);
        assert_eq!(views[1].assigned_to, None);
    }

    #[test]
    fn test_join_tasks_fails_when_project_is_gone() {
        let owner = user("Ada");
        let tasks = vec![task(Uuid::new_v4(), owner.id, None, "orphan")];
        let users = HashMap::from([(owner.id, owner)]);

        let result = join_tasks(tasks, &HashMap::new(), &users);
        assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_task_view_serializes_nested_summaries() {
        let owner = user("Ada");
        let project = project_summary(&owner);
        let view = TaskView::new(
            task(project.id, owner.id, None, "serialized"),
            project.clone(),
            None,
            owner.clone(),
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["project"]["name"], "Launch");
        assert_eq!(json["project"]["status"], "active");
        assert_eq!(json["createdBy"]["email"], "ada@example.com");
        assert!(json["assignedTo"].is_null());
        assert_eq!(json["estimatedHours"], 3.0);
    }

    #[test]
    fn test_join_projects_embeds_owner() {
        let owner = user("Ada");
        let project = Project {
            id: Uuid::new_v4(),
            name: "Launch".to_string(),
            description: "Go live".to_string(),
            owner: owner.id,
            status: ProjectStatus::Planning,
            start_date: Utc::now(),
            end_date: None,
            budget: Some(100.0),
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let users = HashMap::from([(owner.id, owner.clone())]);

        let views = join_projects(vec![project], &users).unwrap();
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["owner"]["name"], "Ada");
        assert_eq!(json["owner"]["id"], owner.id.to_string());
        assert!(json["startDate"].is_string());
    }
}
