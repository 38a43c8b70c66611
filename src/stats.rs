//! Project statistics, recomputed from the task set on every request.

use serde::Serialize;

use crate::models::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.review + self.done
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub urgent: usize,
}

impl PriorityCounts {
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.urgent
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub tasks_by_status: StatusCounts,
    pub tasks_by_priority: PriorityCounts,
    pub total_estimated_hours: f64,
    pub total_actual_hours: f64,
}

impl ProjectStats {
    /// Missing hour values count as zero.
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        tasks.into_iter().fold(Self::default(), |mut stats, task| {
            stats.total_tasks += 1;

            match task.status {
                TaskStatus::Todo => stats.tasks_by_status.todo += 1,
                TaskStatus::InProgress => stats.tasks_by_status.in_progress += 1,
                TaskStatus::Review => stats.tasks_by_status.review += 1,
                TaskStatus::Done => stats.tasks_by_status.done += 1,
            }

            match task.priority {
                TaskPriority::Low => stats.tasks_by_priority.low += 1,
                TaskPriority::Medium => stats.tasks_by_priority.medium += 1,
                TaskPriority::High => stats.tasks_by_priority.high += 1,
                TaskPriority::Urgent => stats.tasks_by_priority.urgent += 1,
            }

            stats.total_estimated_hours += task.estimated_hours.unwrap_or(0.0);
            stats.total_actual_hours += task.actual_hours.unwrap_or(0.0);
            stats
        })
    }
}
