//! tsquill: boolean query normalisation and weighted `tsvector`
//! maintenance for PostgreSQL full-text search.
//!
//! This umbrella crate re-exports the component crates behind features.
//!
//! | Feature | Crate | Contents |
//! |---------|-------|----------|
//! | (always) | `tsquill-core` | errors, `SearchStore`, `SaveCallback`, mock store |
//! | `query` | `tsquill-query` | `clean_query`, `query_to_terms`, `fix_tsearch_query` |
//! | `index` | `tsquill-index` | vector configuration, synchronizer, search executor |
//! | `pg` | `tsquill-index` | `PgStore` over sqlx |
//! | `cli` | `tsquill-cli` | the `tsquill` command-line application |

pub use tsquill_core as core;
pub use tsquill_core::{Error, ErrorKind, Result, Row, SaveCallback, SearchStore, SqlValue};

#[cfg(feature = "query")]
pub use tsquill_query as query;

#[cfg(feature = "query")]
pub use tsquill_query::{clean_query, fix_tsearch_query, query_to_terms, Operator, Term, TsQuery};

#[cfg(feature = "index")]
pub use tsquill_index as index;

#[cfg(feature = "index")]
pub use tsquill_index::{
    Conditions, EntitySpec, FieldsSpec, GroupSpec, JoinSpec, SearchExecutor, SearchHit,
    SearchOptions, Synchronizer, VectorConfig, VectorSpec,
};

#[cfg(feature = "pg")]
pub use tsquill_index::{PgSettings, PgStore};

#[cfg(feature = "cli")]
pub use tsquill_cli as cli;

#[cfg(all(test, feature = "query"))]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_are_wired() {
        assert_eq!(fix_tsearch_query("bob or zippy"), "bob|zippy");
        assert_eq!(query::clean_query(" Bob "), "bob");
    }
}
