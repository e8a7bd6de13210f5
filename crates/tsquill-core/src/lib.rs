//! tsquill Core: shared types, traits and errors.
//!
//! This crate provides the foundational types used across all tsquill crates.
//! It has no internal tsquill dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: The host collaborator traits ([`SearchStore`], [`SaveCallback`])
//! - [`value`]: SQL parameter and row values
//! - [`mock`]: In-memory [`MockSearchStore`] for tests

#![doc = include_str!("../README.md")]

pub mod error;
pub mod mock;
pub mod traits;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Error, ErrorKind, Result};
pub use mock::{MockSearchStore, RecordedStatement};
pub use traits::{ColumnUpdate, SaveCallback, SearchStore};
pub use value::{Row, SqlValue};
