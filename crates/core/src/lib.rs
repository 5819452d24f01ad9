//! `quizhub-core`: shared primitives for the QuizHub client.
//!
//! This crate contains **pure** building blocks (no IO, no async).

pub mod error;
pub mod id;
pub mod validate;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
