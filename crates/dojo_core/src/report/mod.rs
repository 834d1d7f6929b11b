//! Text reports over registry state.
//!
//! # Responsibility
//! - Render rooms, allocations, unallocated people and vacancies as text.
//! - Stay read-only; printing and file output belong to callers.

pub mod text;
