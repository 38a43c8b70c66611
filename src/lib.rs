#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, the authorization policy, list-query scoping,"]
#![doc = "resource services, routing configuration and error handling for the Taskboard API."]
#![doc = "The binary (`main.rs`) builds the `App` from these pieces and runs it."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod routes;
pub mod scope;
pub mod services;
pub mod stats;

pub use crate::config::Config;
pub use crate::error::AppError;
