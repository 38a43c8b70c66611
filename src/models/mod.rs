pub mod project;
pub mod task;
pub mod user;
pub mod view;

pub use project::{CreateProject, Project, ProjectQuery, ProjectStatus, UpdateProject};
pub use task::{
    CreateTask, MyTasksQuery, Task, TaskPriority, TaskQuery, TaskStatus, TaskWithOwner, UpdateTask,
};
pub use user::{NewUser, Role, User, UserProfile};
pub use view::{ProjectSummary, ProjectView, TaskView, UserSummary};

/// Trims tags, drops empty ones and removes duplicates while keeping the first occurrence.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

/// Splits a comma-separated query value into tags.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    normalize_tags(value.split(',').map(str::to_string).collect())
}
