//! # Todolist Shared Library
//!
//! Domain types, authentication and the ownership-scoped resource service used
//! by the Todolist API server.
//!
//! ## Module Organization
//!
//! - `auth`: Token codec, password hashing, identity middleware
//! - `db`: Connection pool and migrations
//! - `models`: Users, lists, tasks, subtasks and their SQL
//! - `store`: Repository traits with PostgreSQL and in-memory adapters
//! - `ownership`: CRUD scoped to the caller's own hierarchy
//! - `pagination`: Page parameter resolution

pub mod auth;
pub mod db;
pub mod models;
pub mod ownership;
pub mod pagination;
pub mod store;

/// Current version of the Todolist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
