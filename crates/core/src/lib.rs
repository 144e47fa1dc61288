//! `blogapi-core` — the post entity and its validation rules.
//!
//! This crate is **pure domain** (no I/O, no storage assumptions).

pub mod error;
pub mod post;
pub mod validation;

pub use error::{DomainError, DomainResult};
pub use post::{NewPost, Post, PostId};
pub use validation::PostValidator;
