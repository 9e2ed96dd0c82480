//! # pmtool Shared Library
//!
//! Core of the multi-tenant project management service: entity models, field
//! validation, tenant resolution, the storage abstraction and the
//! query/mutation engine. Transport layers (the HTTP API) sit on top of
//! [`engine::Engine`].
//!
//! ## Module Organization
//!
//! - `models`: Organizations, projects, tasks and comments
//! - `validation`: Field rules applied before any store access
//! - `tenant`: Resolving the request tenant from a header value
//! - `store`: `EntityStore` trait with in-memory and PostgreSQL backends
//! - `db`: Connection pool and migrations
//! - `engine`: Operations, their results and the error taxonomy

pub mod db;
pub mod engine;
pub mod models;
pub mod store;
pub mod tenant;
pub mod validation;

/// Current version of the pmtool shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
