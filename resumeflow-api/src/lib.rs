//! # ResumeFlow API Server Library
//!
//! HTTP surface of ResumeFlow: configuration, routing, guard layers and the
//! translation of domain errors into responses.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and guard layers
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors whose rejections use the error format
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
