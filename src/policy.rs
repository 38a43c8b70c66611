//! Ownership-based authorization.
//!
//! `can_access` is a pure decision over an [`Actor`], the ownership facts of a
//! [`Resource`] and an [`Action`]. Handlers never compare ids themselves; they
//! load the resource (a missing one is a 404 before any policy check) and call
//! [`authorize`], which turns a denial into a 403.
//!
//! Rules, first match wins:
//!
//! 1. Admins may do anything.
//! 2. A project may be read, updated and deleted by its owner only.
//! 3. A task may be read by the project owner, its assignee or its creator.
//! 4. A task may be updated or deleted by the project owner or its creator.
//!    Being the assignee alone grants visibility, not mutation.
//! 5. Tasks may be created under a project by that project's owner only.
//! 6. Everything else is denied.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Project, Role, TaskWithOwner, User};

/// The authenticated user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
    /// Creating a task inside the project.
    CreateTaskUnder,
}

/// The ownership facts of a resource, all a decision needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Project {
        owner: Uuid,
    },
    Task {
        project_owner: Uuid,
        assigned_to: Option<Uuid>,
        created_by: Uuid,
    },
}

impl From<&Project> for Resource {
    fn from(project: &Project) -> Self {
        Resource::Project {
            owner: project.owner,
        }
    }
}

impl From<&TaskWithOwner> for Resource {
    fn from(record: &TaskWithOwner) -> Self {
        Resource::Task {
            project_owner: record.project_owner,
            assigned_to: record.task.assigned_to,
            created_by: record.task.created_by,
        }
    }
}

pub fn can_access(actor: &Actor, resource: &Resource, action: Action) -> bool {
    if actor.is_admin() {
        return true;
    }

    match (*resource, action) {
        (Resource::Project { owner }, _) => owner == actor.id,
        (
            Resource::Task {
                project_owner,
                assigned_to,
                created_by,
            },
            Action::Read,
        ) => {
            project_owner == actor.id || assigned_to == Some(actor.id) || created_by == actor.id
        }
        (
            Resource::Task {
                project_owner,
                created_by,
                ..
            },
            Action::Update | Action::Delete,
        ) => project_owner == actor.id || created_by == actor.id,
        (Resource::Task { .. }, Action::CreateTaskUnder) => false,
    }
}

/// Like [`can_access`], but a denial is an `AppError::Forbidden`.
pub fn authorize(actor: &Actor, resource: &Resource, action: Action) -> Result<(), AppError> {
    if can_access(actor, resource, action) {
        return Ok(());
    }

    log::warn!(
        "Denied {:?} on {:?} for user {}",
        action,
        resource,
        actor.id
    );
    Err(AppError::Forbidden(denial_message(resource, action)))
}

fn denial_message(resource: &Resource, action: Action) -> String {
    let noun = match resource {
        Resource::Project { .. } => "project",
        Resource::Task { .. } => "task",
    };
    match action {
        Action::Read => format!("Not authorized to access this {}", noun),
        Action::Update => format!("Not authorized to update this {}", noun),
        Action::Delete => format!("Not authorized to delete this {}", noun),
        Action::CreateTaskUnder => format!("Not authorized to create tasks in this {}", noun),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ALL_ACTIONS: [Action; 4] = [
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::CreateTaskUnder,
    ];

    struct Cast {
        owner: Actor,
        assignee: Actor,
        creator: Actor,
        stranger: Actor,
        admin: Actor,
    }

    fn cast() -> Cast {
        Cast {
            owner: Actor::new(Uuid::new_v4(), Role::User),
            assignee: Actor::new(Uuid::new_v4(), Role::User),
            creator: Actor::new(Uuid::new_v4(), Role::User),
            stranger: Actor::new(Uuid::new_v4(), Role::User),
            admin: Actor::new(Uuid::new_v4(), Role::Admin),
        }
    }

    fn task_of(cast: &Cast) -> Resource {
        Resource::Task {
            project_owner: cast.owner.id,
            assigned_to: Some(cast.assignee.id),
            created_by: cast.creator.id,
        }
    }

    #[test]
    fn test_project_owner_has_every_right() {
        let cast = cast();
        let project = Resource::Project {
            owner: cast.owner.id,
        };
        for action in ALL_ACTIONS {
            assert!(can_access(&cast.owner, &project, action), "{:?}", action);
            assert!(!can_access(&cast.stranger, &project, action), "{:?}", action);
        }
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let cast = cast();
        let project = Resource::Project {
            owner: cast.owner.id,
        };
        let task = task_of(&cast);
        for action in ALL_ACTIONS {
            assert!(can_access(&cast.admin, &project, action));
            assert!(can_access(&cast.admin, &task, action));
        }
    }

    #[test]
    fn test_task_read_rights() {
        let cast = cast();
        let task = task_of(&cast);
        assert!(can_access(&cast.owner, &task, Action::Read));
        assert!(can_access(&cast.assignee, &task, Action::Read));
        assert!(can_access(&cast.creator, &task, Action::Read));
        assert!(!can_access(&cast.stranger, &task, Action::Read));
    }

    #[test]
    fn test_assignee_cannot_mutate_task() {
        let cast = cast();
        let task = task_of(&cast);
        for action in [Action::Update, Action::Delete] {
            assert!(can_access(&cast.owner, &task, action));
            assert!(can_access(&cast.creator, &task, action));
            assert!(!can_access(&cast.assignee, &task, action));
            assert!(!can_access(&cast.stranger, &task, action));
        }
    }

    #[test]
    fn test_unassigned_task() {
        let cast = cast();
        let task = Resource::Task {
            project_owner: cast.owner.id,
            assigned_to: None,
            created_by: cast.owner.id,
        };
        assert!(can_access(&cast.owner, &task, Action::Update));
        assert!(!can_access(&cast.assignee, &task, Action::Read));
    }

    #[test]
    fn test_create_task_under_is_a_project_action() {
        let cast = cast();
        let task = task_of(&cast);
        assert!(!can_access(&cast.owner, &task, Action::CreateTaskUnder));
        assert!(!can_access(&cast.creator, &task, Action::CreateTaskUnder));
    }

    #[test]
    fn test_authorize_reports_forbidden() {
        let cast = cast();
        let task = task_of(&cast);

        assert!(authorize(&cast.assignee, &task, Action::Read).is_ok());
        match authorize(&cast.assignee, &task, Action::Update) {
            Err(AppError::Forbidden(message)) => {
                assert_eq!(message, "Not authorized to update this task")
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }

        let project = Resource::Project {
            owner: cast.owner.id,
        };
        match authorize(&cast.stranger, &project, Action::CreateTaskUnder) {
            Err(AppError::Forbidden(message)) => {
                assert_eq!(message, "Not authorized to create tasks in this project")
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
