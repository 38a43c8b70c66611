//! List-query construction.
//!
//! A list request becomes a typed query: a set of filter predicates taken from
//! the query string, one scope predicate derived from the actor, an ordering and
//! a page window. Rendering to SQL happens in one place (`push_where`) so that
//! the count query and the page query always agree on what matches.
//!
//! Visibility rules:
//! - projects: admins see everything, everyone else only what they own;
//! - tasks: admins see everything, everyone else sees tasks in projects they
//!   own, tasks assigned to them and tasks they created;
//! - "my tasks": always the tasks assigned to the actor.

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    parse_tag_list, MyTasksQuery, ProjectQuery, ProjectStatus, TaskPriority, TaskQuery, TaskStatus,
};
use crate::policy::Actor;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// A page window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Both values must be at least 1 when given.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".into()));
        }
        Ok(Self { page, limit })
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn take(&self) -> i64 {
        self.limit
    }

    /// `ceil(total / limit)`; zero when nothing matched.
    pub fn pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            total / self.limit + i64::from(total % self.limit != 0)
        }
    }

    fn push_window(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder
            .push(" LIMIT ")
            .push_bind(self.take())
            .push(" OFFSET ")
            .push_bind(self.skip());
    }
}

/// One page of a list plus the numbers the response reports.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            count: items.len(),
            pages: pagination.pages(total),
            page: pagination.page,
            total,
            items,
        }
    }
}

/// Emits `WHERE` for the first condition and `AND` for the rest.
struct Conditions<'b, 'args> {
    builder: &'b mut QueryBuilder<'args, Postgres>,
    started: bool,
}

impl<'b, 'args> Conditions<'b, 'args> {
    fn new(builder: &'b mut QueryBuilder<'args, Postgres>) -> Self {
        Self {
            builder,
            started: false,
        }
    }

    fn next(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        self.builder
            .push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
        &mut *self.builder
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectFilter {
    Status(ProjectStatus),
    /// Matches when the project carries any of the tags.
    TagsAny(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    OwnedBy(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectListQuery {
    pub filters: Vec<ProjectFilter>,
    pub scope: ProjectScope,
    pub pagination: Pagination,
}

impl ProjectListQuery {
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut conditions = Conditions::new(builder);

        if let ProjectScope::OwnedBy(owner) = self.scope {
            conditions.next().push("owner = ").push_bind(owner);
        }

        for filter in &self.filters {
            match filter {
                ProjectFilter::Status(status) => {
                    conditions.next().push("status = ").push_bind(*status);
                }
                ProjectFilter::TagsAny(tags) => {
                    conditions.next().push("tags && ").push_bind(tags.clone());
                }
            }
        }
    }

    /// Conditions, ordering (newest first) and page window.
    pub fn push_select_tail(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        self.push_where(builder);
        builder.push(" ORDER BY created_at DESC, id DESC");
        self.pagination.push_window(builder);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskFilter {
    Project(Uuid),
    Status(TaskStatus),
    Priority(TaskPriority),
    AssignedTo(Uuid),
    /// Matches when the task carries any of the tags.
    TagsAny(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    All,
    /// Tasks in `owned_projects`, assigned to `actor` or created by `actor`.
    VisibleTo {
        actor: Uuid,
        owned_projects: Vec<Uuid>,
    },
    AssignedTo(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
    Title,
}

impl TaskSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "dueDate" => Some(Self::DueDate),
            "priority" => Some(Self::Priority),
            "status" => Some(Self::Status),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: TaskSortField,
    pub descending: bool,
}

/// Parses `-createdAt`, `priority,-dueDate` or `status dueDate`.
pub fn parse_sort(value: &str) -> Result<Vec<SortKey>, AppError> {
    let mut keys = Vec::new();
    for token in value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
    {
        let (name, descending) = match token.strip_prefix('-') {
            Some(name) => (name, true),
            None => (token.strip_prefix('+').unwrap_or(token), false),
        };
        let field = TaskSortField::parse(name)
            .ok_or_else(|| AppError::Validation(format!("Cannot sort by '{}'", name)))?;
        keys.push(SortKey { field, descending });
    }

    if keys.is_empty() {
        keys.push(default_sort());
    }
    Ok(keys)
}

fn default_sort() -> SortKey {
    SortKey {
        field: TaskSortField::CreatedAt,
        descending: true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskListQuery {
    pub filters: Vec<TaskFilter>,
    pub scope: TaskScope,
    pub sort: Vec<SortKey>,
    /// `None` returns every match ("my tasks").
    pub pagination: Option<Pagination>,
}

impl TaskListQuery {
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut conditions = Conditions::new(builder);

        match &self.scope {
            TaskScope::All => {}
            TaskScope::VisibleTo {
                actor,
                owned_projects,
            } => {
                conditions
                    .next()
                    .push("(project = ANY(")
                    .push_bind(owned_projects.clone())
                    .push(") OR assigned_to = ")
                    .push_bind(*actor)
                    .push(" OR created_by = ")
                    .push_bind(*actor)
                    .push(")");
            }
            TaskScope::AssignedTo(actor) => {
                conditions.next().push("assigned_to = ").push_bind(*actor);
            }
        }

        for filter in &self.filters {
            match filter {
                TaskFilter::Project(project) => {
                    conditions.next().push("project = ").push_bind(*project);
                }
                TaskFilter::Status(status) => {
                    conditions.next().push("status = ").push_bind(*status);
                }
                TaskFilter::Priority(priority) => {
                    conditions.next().push("priority = ").push_bind(*priority);
                }
                TaskFilter::AssignedTo(user) => {
                    conditions.next().push("assigned_to = ").push_bind(*user);
                }
                TaskFilter::TagsAny(tags) => {
                    conditions.next().push("tags && ").push_bind(tags.clone());
                }
            }
        }
    }

    /// Conditions, ordering and (when paginated) the page window.
    pub fn push_select_tail(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        self.push_where(builder);

        builder.push(" ORDER BY ");
        for key in &self.sort {
            builder
                .push(key.field.column())
                .push(if key.descending { " DESC, " } else { " ASC, " });
        }
        builder.push("id DESC");

        if let Some(pagination) = &self.pagination {
            pagination.push_window(builder);
        }
    }
}

/// Builds the query behind `GET /api/projects`.
pub fn scope_projects(actor: &Actor, params: &ProjectQuery) -> Result<ProjectListQuery, AppError> {
    let mut filters = Vec::new();
    if let Some(status) = params.status {
        filters.push(ProjectFilter::Status(status));
    }
    if let Some(tags) = tag_filter(params.tags.as_deref()) {
        filters.push(ProjectFilter::TagsAny(tags));
    }

    let scope = if actor.is_admin() {
        ProjectScope::All
    } else {
        ProjectScope::OwnedBy(actor.id)
    };

    Ok(ProjectListQuery {
        filters,
        scope,
        pagination: Pagination::new(params.page, params.limit)?,
    })
}

/// Builds the query behind `GET /api/tasks`.
///
/// `owned_projects` are the ids of the projects the actor owns; they are only
/// consulted for non-admin actors.
pub fn scope_tasks(
    actor: &Actor,
    params: &TaskQuery,
    owned_projects: Vec<Uuid>,
) -> Result<TaskListQuery, AppError> {
    let mut filters = Vec::new();
    if let Some(project) = params.project {
        filters.push(TaskFilter::Project(project));
    }
    if let Some(status) = params.status {
        filters.push(TaskFilter::Status(status));
    }
    if let Some(priority) = params.priority {
        filters.push(TaskFilter::Priority(priority));
    }
    if let Some(user) = params.assigned_to {
        filters.push(TaskFilter::AssignedTo(user));
    }
    if let Some(tags) = tag_filter(params.tags.as_deref()) {
        filters.push(TaskFilter::TagsAny(tags));
    }

    let scope = if actor.is_admin() {
        TaskScope::All
    } else {
        TaskScope::VisibleTo {
            actor: actor.id,
            owned_projects,
        }
    };

    let sort = match params.sort_by.as_deref() {
        Some(value) => parse_sort(value)?,
        None => vec![default_sort()],
    };

    Ok(TaskListQuery {
        filters,
        scope,
        sort,
        pagination: Some(Pagination::new(params.page, params.limit)?),
    })
}

/// Builds the query behind `GET /api/tasks/my-tasks`. Self-scoped for every role.
pub fn scope_my_tasks(actor: &Actor, params: &MyTasksQuery) -> TaskListQuery {
    let mut filters = Vec::new();
    if let Some(status) = params.status {
        filters.push(TaskFilter::Status(status));
    }
    if let Some(priority) = params.priority {
        filters.push(TaskFilter::Priority(priority));
    }

    TaskListQuery {
        filters,
        scope: TaskScope::AssignedTo(actor.id),
        sort: vec![default_sort()],
        pagination: None,
    }
}

fn tag_filter(value: Option<&str>) -> Option<Vec<String>> {
    value.map(parse_tag_list).filter(|tags| !tags.is_empty())
}
