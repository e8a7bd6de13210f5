//! Ranked search and counting over configured vectors.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tsquill_core::{Error, Result, Row, SearchStore, SqlValue};
use tsquill_query::fix_tsearch_query;

use crate::config::{EntityVectors, VectorConfig, VectorDef};
use crate::sql::{Conditions, SearchSql, Statement, COUNT_COLUMN, RANK_COLUMN};

/// Options for [`SearchExecutor::find`] and [`SearchExecutor::count`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Vector to search; required when the entity has more than one.
    pub vector: Option<String>,
    /// Maximum number of hits.
    pub limit: Option<usize>,
    /// Hits to skip.
    pub offset: Option<usize>,
    /// Primary-table columns to return highlighted as `<column>_headline`.
    pub headlines: Vec<String>,
    /// Run the query through the query fixer first. When off, the query is
    /// passed to `to_tsquery` as-is.
    pub fix_query: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            vector: None,
            limit: None,
            offset: None,
            headlines: Vec::new(),
            fix_query: true,
        }
    }
}

impl SearchOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search a named vector.
    pub fn with_vector(mut self, vector: impl Into<String>) -> Self {
        self.vector = Some(vector.into());
        self
    }

    /// Cap the number of hits.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip hits.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add a headline column.
    pub fn with_headline(mut self, column: impl Into<String>) -> Self {
        self.headlines.push(column.into());
        self
    }

    /// Pass the query through unmodified.
    pub fn raw_query(mut self) -> Self {
        self.fix_query = false;
        self
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Relevance; higher is better.
    pub rank: f64,
    /// The primary-table row plus any headline columns. Vector storage
    /// columns are left out.
    pub row: Row,
}

impl SearchHit {
    /// Column value of the underlying row.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.row.get(column)
    }
}

/// Turn user input into the expression bound as the tsquery parameter.
///
/// A missing or blank query is rejected, as is one that has nothing left
/// after fixing. Quotes doubled by the cleaner are undone here; the value is
/// bound, not spliced.
pub fn prepare_query(query: Option<&str>, fix: bool) -> Result<String> {
    let query = query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| Error::invalid_query("search query is empty"))?;

    if !fix {
        return Ok(query.trim().to_string());
    }
    let expression = fix_tsearch_query(query);
    if expression.is_empty() {
        return Err(Error::invalid_query(format!(
            "search query '{query}' has no searchable terms"
        )));
    }
    Ok(expression.replace("''", "'"))
}

/// Runs ranked searches and counts against the store.
///
/// Holds the shared configuration and store. Cheap to clone.
#[derive(Clone)]
pub struct SearchExecutor {
    config: Arc<VectorConfig>,
    store: Arc<dyn SearchStore>,
}

impl SearchExecutor {
    /// Create an executor.
    pub fn new(config: Arc<VectorConfig>, store: Arc<dyn SearchStore>) -> Self {
        Self { config, store }
    }

    /// The shared configuration.
    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    fn builder<'a>(
        &'a self,
        entity: &'a EntityVectors,
        vector: &'a VectorDef,
        conditions: Option<&'a Conditions>,
    ) -> SearchSql<'a> {
        SearchSql::new(entity, vector, self.config.text_search_config()).with_conditions(conditions)
    }

    /// Find matching records, best first.
    ///
    /// Ties in rank are broken by primary key so paging is stable.
    pub async fn find(
        &self,
        entity: &str,
        query: Option<&str>,
        conditions: Option<&Conditions>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let (vectors, vector) = self.config.resolve(entity, options.vector.as_deref())?;
        let expression = prepare_query(query, options.fix_query)?;
        check_headlines(vectors, vector, &options.headlines)?;

        let Statement { sql, params } = self.builder(vectors, vector, conditions).select(
            &expression,
            &options.headlines,
            options.limit,
            options.offset,
        )?;

        log::debug!("search {}.{} for '{}'", vectors.table, vector.name, expression);
        let rows = self.store.execute(&sql, &params).await?;
        log::debug!("search returned {} row(s)", rows.len());

        Ok(rows
            .into_iter()
            .map(|mut row| {
                let rank = row
                    .take(RANK_COLUMN)
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                for storage in vectors.vectors.keys() {
                    row.take(storage);
                }
                SearchHit { rank, row }
            })
            .collect())
    }

    /// Count matching records, ignoring limit, offset and headlines.
    pub async fn count(
        &self,
        entity: &str,
        query: Option<&str>,
        conditions: Option<&Conditions>,
        options: &SearchOptions,
    ) -> Result<u64> {
        let (vectors, vector) = self.config.resolve(entity, options.vector.as_deref())?;
        let expression = prepare_query(query, options.fix_query)?;

        let Statement { sql, params } = self.builder(vectors, vector, conditions).count(&expression)?;
        let rows = self.store.execute(&sql, &params).await?;

        let count = rows
            .first()
            .and_then(|row| row.get(COUNT_COLUMN))
            .and_then(SqlValue::as_i64)
            .ok_or_else(|| Error::store("count query returned no count"))?;
        u64::try_from(count).map_err(|_| Error::store(format!("negative count {count}")))
    }
}

fn check_headlines(vectors: &EntityVectors, vector: &VectorDef, headlines: &[String]) -> Result<()> {
    for column in headlines {
        let known = vector
            .columns()
            .any(|c| c.table == vectors.table && &c.column == column);
        if !known {
            return Err(Error::invalid_query(format!(
                "headline column '{column}' is not a {} field of vector '{}'",
                vectors.table, vector.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntitySpec, FieldsSpec, GroupSpec, VectorSpec};
    use tsquill_core::{ErrorKind, MockSearchStore};

    async fn setup() -> (SearchExecutor, MockSearchStore) {
        let store = MockSearchStore::new()
            .with_table("blog_entries", &["id", "title", "description"])
            .with_table("profiles", &["id", "name", "public_info", "private_info"]);
        let mut config = VectorConfig::new();
        config
            .configure(
                "blog_entries",
                &EntitySpec::with_fields(FieldsSpec::groups([
                    ("a", GroupSpec::new(["title"], 1.0)),
                    ("b", GroupSpec::new(["description"], 0.5)),
                ])),
                &store,
            )
            .await
            .unwrap();
        config
            .configure(
                "profiles",
                &EntitySpec::new()
                    .vector("public_vector", VectorSpec::new(FieldsSpec::single("public_info")))
                    .vector("private_vector", VectorSpec::new(FieldsSpec::single("private_info"))),
                &store,
            )
            .await
            .unwrap();
        let executor = SearchExecutor::new(Arc::new(config), Arc::new(store.clone()));
        (executor, store)
    }

    // ------------------------------------------------------------------------
    // Query preparation
    // ------------------------------------------------------------------------

    #[test]
    fn test_prepare_query_rejects_blank() {
        for query in [None, Some(""), Some("   ")] {
            let err = prepare_query(query, true).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Input);
        }
        assert!(prepare_query(Some("(!&|)"), true).is_err());
    }

    #[test]
    fn test_prepare_query_fixes_and_unescapes() {
        assert_eq!(prepare_query(Some("bob or zippy"), true).unwrap(), "bob|zippy");
        assert_eq!(
            prepare_query(Some("\"O'Reily bookstore\""), true).unwrap(),
            "(o'reily&bookstore)"
        );
    }

    #[test]
    fn test_prepare_query_raw() {
        assert_eq!(prepare_query(Some(" a & !b "), false).unwrap(), "a & !b");
    }

    // ------------------------------------------------------------------------
    // find
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_find_binds_expression_and_extracts_rank() {
        let (executor, store) = setup().await;
        store
            .push_rows(vec![
                Row::new().with("id", 2).with("title", "Zippy").with(RANK_COLUMN, 0.9),
                Row::new().with("id", 1).with("title", "Bob").with(RANK_COLUMN, 0.4),
            ])
            .await;

        let hits = executor
            .find("blog_entries", Some("bob or zippy"), None, &SearchOptions::new())
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 0.9);
        assert_eq!(hits[0].get("title"), Some(&SqlValue::from("Zippy")));
        assert!(hits[0].get(RANK_COLUMN).is_none());

        let statements = store.statements().await;
        assert_eq!(statements[0].params, vec![SqlValue::from("bob|zippy")]);
        assert!(statements[0].sql.contains("'{0.1,0.2,0.5,1}'::float4[]"));
        assert!(statements[0].sql.contains("ORDER BY tsearch_rank DESC, blog_entries.id ASC"));
    }

    #[tokio::test]
    async fn test_find_leaves_out_vector_columns() {
        let (executor, store) = setup().await;
        store
            .push_rows(vec![Row::new()
                .with("id", 1)
                .with("title", "Bob")
                .with("vectors", SqlValue::Null)
                .with(RANK_COLUMN, 0.4)])
            .await;

        let hits = executor
            .find("blog_entries", Some("bob"), None, &SearchOptions::new())
            .await
            .unwrap();
        assert!(hits[0].get("vectors").is_none());
        assert_eq!(hits[0].row.len(), 2);
    }

    #[tokio::test]
    async fn test_find_with_conditions_and_paging() {
        let (executor, store) = setup().await;
        let conditions = Conditions::new().filter("blog_entries.id <> ?", [3]);
        let options = SearchOptions::new().with_limit(5).with_offset(10);

        executor
            .find("blog_entries", Some("bob"), Some(&conditions), &options)
            .await
            .unwrap();

        let statements = store.statements().await;
        assert!(statements[0].sql.contains("AND (blog_entries.id <> $2)"));
        assert!(statements[0].sql.ends_with("LIMIT $3 OFFSET $4"));
        assert_eq!(statements[0].params.len(), 4);
    }

    #[tokio::test]
    async fn test_find_requires_vector_when_ambiguous() {
        let (executor, store) = setup().await;
        let err = executor
            .find("profiles", Some("bob"), None, &SearchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousVector { .. }));
        assert!(store.statements().await.is_empty());

        executor
            .find(
                "profiles",
                Some("bob"),
                None,
                &SearchOptions::new().with_vector("public_vector"),
            )
            .await
            .unwrap();
        let statements = store.statements().await;
        assert!(statements[0].sql.contains("profiles.public_vector @@ tsearch_query"));
    }

    #[tokio::test]
    async fn test_find_unknown_entity() {
        let (executor, _) = setup().await;
        let err = executor
            .find("ghosts", Some("bob"), None, &SearchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EntityNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_find_empty_query_never_hits_store() {
        let (executor, store) = setup().await;
        assert!(executor
            .find("blog_entries", None, None, &SearchOptions::new())
            .await
            .is_err());
        assert!(executor
            .find("blog_entries", Some(""), None, &SearchOptions::new())
            .await
            .is_err());
        assert!(store.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_find_headlines() {
        let (executor, store) = setup().await;
        executor
            .find(
                "blog_entries",
                Some("bob"),
                None,
                &SearchOptions::new().with_headline("description"),
            )
            .await
            .unwrap();
        assert!(store.statements().await[0].sql.contains("AS description_headline"));

        let err = executor
            .find(
                "blog_entries",
                Some("bob"),
                None,
                &SearchOptions::new().with_headline("id"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[tokio::test]
    async fn test_find_timeout_surfaces() {
        let (executor, store) = setup().await;
        store.timeout_next("canceling statement due to statement timeout").await;
        let err = executor
            .find("blog_entries", Some("bob"), None, &SearchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    // ------------------------------------------------------------------------
    // count
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_count() {
        let (executor, store) = setup().await;
        store
            .push_rows(vec![Row::new().with(COUNT_COLUMN, 2i64)])
            .await;

        let count = executor
            .count("blog_entries", Some("bob or zippy"), None, &SearchOptions::new())
            .await
            .unwrap();
        assert_eq!(count, 2);

        let statements = store.statements().await;
        assert!(statements[0].sql.starts_with("SELECT count(*) AS tsearch_count"));
        assert!(!statements[0].sql.contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_count_without_row_is_store_error() {
        let (executor, _) = setup().await;
        let err = executor
            .count("blog_entries", Some("bob"), None, &SearchOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_store());
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: SearchOptions = serde_json::from_str(r#"{"limit": 3}"#).unwrap();
        assert_eq!(options.limit, Some(3));
        assert!(options.fix_query);
        assert!(options.headlines.is_empty());
    }
}
