//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod roster_service;

pub use roster_service::{RosterService, ServiceError, ServiceResult};
