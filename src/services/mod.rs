//! Resource services.
//!
//! Each operation runs the same pipeline: load the resource (404 when missing),
//! ask the policy (403 when denied), scope list queries to the actor, then hit
//! the store. Handlers stay thin and only shape the response envelope.

pub mod accounts;
pub mod projects;
pub mod tasks;
