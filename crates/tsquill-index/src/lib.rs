//! Weighted text-search vectors for tsquill.
//!
//! This crate turns declarative entity configuration into stored `tsvector`
//! columns, keeps them synchronized with their source columns, and runs
//! ranked searches against them. All database access goes through the
//! [`SearchStore`](tsquill_core::SearchStore) trait.
//!
//! # Features
//!
//! - `pg`: Enable [`PgStore`], a PostgreSQL store over an sqlx pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     tsquill-index                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EntitySpec (serde) ──configure──▶ VectorConfig             │
//! │    └── EntityVectors ── VectorDef ── FieldGroup / TableJoin │
//! ├─────────────────────────────────────────────────────────────┤
//! │  sql: WeightScheme, VectorExpression, SearchSql, Conditions │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Synchronizer (resync, SaveCallback)                        │
//! │  SearchExecutor (find, count)                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchStore                                                │
//! │  ├── MockSearchStore (tsquill-core, always available)       │
//! │  └── PgStore (feature: pg)                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tsquill_index::{EntitySpec, FieldsSpec, SearchExecutor, SearchOptions, VectorConfig};
//!
//! let mut config = VectorConfig::new();
//! config
//!     .configure(
//!         "blog_entries",
//!         &EntitySpec::with_fields(FieldsSpec::columns(["title", "description"])),
//!         store.as_ref(),
//!     )
//!     .await?;
//!
//! let executor = SearchExecutor::new(Arc::new(config), store);
//! let hits = executor
//!     .find("blog_entries", Some("bob or zippy"), None, &SearchOptions::new().with_limit(10))
//!     .await?;
//! for hit in hits {
//!     println!("{:.3} {:?}", hit.rank, hit.get("title"));
//! }
//! ```

pub mod config;
pub mod search;
pub mod sql;
pub mod sync;

#[cfg(feature = "pg")]
pub mod postgres;

// Re-exports: configuration
pub use config::{
    ColumnRef, ColumnsSpec, EntitySpec, EntityVectors, FieldGroup, FieldsSpec, GroupSpec,
    JoinSpec, TableJoin, VectorConfig, VectorDef, VectorSpec, DEFAULT_PRIMARY_KEY,
    DEFAULT_TEXT_SEARCH_CONFIG, DEFAULT_VECTOR,
};

// Re-exports: SQL building
pub use sql::{Conditions, SearchSql, Statement, VectorExpression, WeightLabel, WeightScheme};

// Re-exports: runtime
pub use search::{prepare_query, SearchExecutor, SearchHit, SearchOptions};
pub use sync::Synchronizer;

#[cfg(feature = "pg")]
pub use postgres::{PgSettings, PgStore};
