//! # API Shared
//!
//! Shared definitions for the report portal APIs.
//!
//! Contains:
//! - Wire types for requests and responses (`dto` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the workspace runner.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
