//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into save/load use-cases.
//! - Keep CLI callers decoupled from storage details.

pub mod state_service;
