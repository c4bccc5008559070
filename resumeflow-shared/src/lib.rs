//! # ResumeFlow Shared Library
//!
//! Domain types and business logic used by the ResumeFlow API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool, migrations and bounded transactions
//! - `models`: Database models (users, refresh tokens, résumés, résumé logs)
//! - `auth`: Password digests, token service, refresh rotation and guards
//! - `workflow`: Résumé status transitions with audit logging
//! - `account`: Account deletion cascade

pub mod account;
pub mod auth;
pub mod db;
pub mod models;
pub mod workflow;

/// Current version of the ResumeFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
