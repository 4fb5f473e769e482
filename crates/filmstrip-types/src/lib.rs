//! Shared domain types for the film strip workspace.

pub mod config;
pub mod export;
pub mod sampling;
pub mod trace;

mod errors;

pub use errors::{FilmstripError, Result};
