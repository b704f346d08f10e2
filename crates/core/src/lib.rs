//! Core library for Tarefas
//!
//! This crate contains the core business logic, including:
//! - Task storage and lifecycle
//! - Tag-scoped caching
//! - Delayed purge of completed tasks

pub mod cache;
pub mod error;
pub mod purge;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
