//! Search query normalisation for PostgreSQL text search.
//!
//! This crate turns free-form user input into the boolean expression syntax
//! accepted by `to_tsquery`. Parsing is pure, total and allocation-light;
//! it never touches a database.
//!
//! # Pipeline
//!
//! ```text
//! raw input ──clean_query──▶ cleaned text ──query_to_terms──▶ [Term]
//!                                                             │
//!                        "a&(b&c)|!d"  ◀──terms_to_expression─┘
//! ```
//!
//! [`fix_tsearch_query`] runs the whole pipeline.
//!
//! # Example
//!
//! ```
//! use tsquill_query::fix_tsearch_query;
//!
//! assert_eq!(
//!     fix_tsearch_query("searching for AND something OR not"),
//!     "searching&for&something|not"
//! );
//! ```

#![doc = include_str!("../README.md")]

pub mod clean;
pub mod expression;
pub mod terms;

pub use clean::{clean_query, RESERVED_CHARS};
pub use expression::{fix_tsearch_query, terms_to_expression, TsQuery};
pub use terms::{query_to_terms, Operator, Term};
