//! Handler functions for query, check, resync, search, count and ddl.
//!
//! Each handler renders its output to a `String` so the formatting can be
//! tested without a terminal; the app prints it.

use std::fmt::Write as _;

use tsquill_core::{Error, Result, SearchStore, SqlValue};
use tsquill_index::{SearchExecutor, SearchOptions, Synchronizer, VectorConfig};
use tsquill_query::TsQuery;

// ============================================================================
// query
// ============================================================================

/// Render the tsquery expression (or term list) for raw search text.
pub fn render_query(text: &str, terms: bool) -> String {
    let query = TsQuery::parse(text);
    if !terms {
        return query.to_expression();
    }
    let mut out = String::new();
    for term in query.terms() {
        let _ = writeln!(out, "{}\t{}", term.operator.symbol(), term.text);
    }
    out.trim_end().to_string()
}

// ============================================================================
// check
// ============================================================================

/// Report every configured entity and whether its storage columns exist.
///
/// Source columns were already verified when the configuration was built;
/// this adds the vector columns themselves. Missing storage columns fail
/// the check.
pub async fn check(config: &VectorConfig, store: &dyn SearchStore) -> Result<String> {
    let mut out = String::new();
    let mut missing = Vec::new();

    for name in config.entity_names() {
        let Some(entity) = config.entity(name) else {
            continue;
        };
        let _ = writeln!(out, "{name} (table {}, key {})", entity.table, entity.primary_key);
        for vector in entity.vectors.values() {
            let present = store.column_exists(&entity.table, &vector.name).await?;
            let groups: Vec<String> = vector
                .field_groups
                .iter()
                .map(|g| {
                    let columns: Vec<String> = g.columns.iter().map(|c| c.to_string()).collect();
                    format!("{}[{}]={}", g.name, columns.join(","), g.weight)
                })
                .collect();
            let _ = writeln!(
                out,
                "  {} {}{} {}",
                if present { "ok" } else { "MISSING" },
                vector.name,
                if vector.auto_update { "" } else { " (manual)" },
                groups.join(" ")
            );
            if !present {
                missing.push(format!("{}.{}", entity.table, vector.name));
            }
        }
    }

    if missing.is_empty() {
        Ok(out.trim_end().to_string())
    } else {
        Err(Error::config(format!(
            "{}\nmissing vector columns: {} (see `tsquill ddl`)",
            out.trim_end(),
            missing.join(", ")
        )))
    }
}

// ============================================================================
// resync
// ============================================================================

/// Parse a primary key given on the command line.
pub fn parse_primary_key(raw: &str) -> SqlValue {
    raw.parse::<i64>()
        .map(SqlValue::Int)
        .unwrap_or_else(|_| SqlValue::from(raw))
}

/// Resync one record, one vector, or a whole entity.
pub async fn resync(
    sync: &Synchronizer,
    entity: &str,
    vector: Option<&str>,
    id: Option<&str>,
) -> Result<String> {
    if sync.config().entity(entity).is_none() {
        return Err(Error::EntityNotConfigured(entity.to_string()));
    }
    match (id, vector) {
        (Some(id), vector) => {
            let affected = sync
                .resync_one(entity, &parse_primary_key(id), vector)
                .await?;
            Ok(format!("{entity} {id}: {affected} row(s) updated"))
        }
        (None, Some(vector)) => {
            sync.resync_all(entity, Some(vector)).await?;
            Ok(format!("{entity}.{vector}: resynced"))
        }
        (None, None) => {
            let count = sync.resync_entity(entity).await?;
            Ok(format!("{entity}: {count} vector(s) resynced"))
        }
    }
}

// ============================================================================
// search / count
// ============================================================================

/// Run a search and render hits as JSON lines.
pub async fn search(
    executor: &SearchExecutor,
    entity: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<String> {
    let hits = executor.find(entity, Some(query), None, options).await?;
    let mut out = String::new();
    for hit in &hits {
        out.push_str(&serde_json::to_string(hit)?);
        out.push('\n');
    }
    Ok(out.trim_end().to_string())
}

/// Count matches.
pub async fn count(
    executor: &SearchExecutor,
    entity: &str,
    query: &str,
    vector: Option<&str>,
) -> Result<String> {
    let mut options = SearchOptions::new();
    options.vector = vector.map(String::from);
    Ok(executor
        .count(entity, Some(query), None, &options)
        .await?
        .to_string())
}

// ============================================================================
// ddl
// ============================================================================

/// Render, or apply, the storage DDL for a vector.
pub async fn ddl(
    sync: &Synchronizer,
    entity: &str,
    vector: Option<&str>,
    apply: bool,
) -> Result<String> {
    if apply {
        sync.create_vector_column(entity, vector).await?;
        return Ok(format!("{entity}: vector column ready"));
    }
    let statements = sync.vector_column_ddl(entity, vector)?;
    Ok(statements
        .iter()
        .map(|s| format!("{s};"))
        .collect::<Vec<_>>()
        .join("\n"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tsquill_core::{MockSearchStore, Row};
    use tsquill_index::{EntitySpec, FieldsSpec, VectorSpec};

    async fn setup() -> (Arc<VectorConfig>, MockSearchStore) {
        let store = MockSearchStore::new()
            .with_table("blog_entries", &["id", "title", "vectors"])
            .with_table("profiles", &["id", "name", "public_info"]);
        let mut config = VectorConfig::new();
        config
            .configure(
                "blog_entries",
                &EntitySpec::with_fields(FieldsSpec::single("title")),
                &store,
            )
            .await
            .unwrap();
        config
            .configure(
                "profiles",
                &EntitySpec::new().vector(
                    "public_vector",
                    VectorSpec::new(FieldsSpec::columns(["name", "public_info"]))
                        .with_auto_update(false),
                ),
                &store,
            )
            .await
            .unwrap();
        (Arc::new(config), store)
    }

    #[test]
    fn test_render_query() {
        assert_eq!(render_query("bob or -zippy", false), "bob|!zippy");
        assert_eq!(render_query("bob or -zippy", true), "&\tbob\n|\t!zippy");
        assert_eq!(render_query("(!&|)", false), "");
    }

    #[test]
    fn test_parse_primary_key() {
        assert_eq!(parse_primary_key("42"), SqlValue::Int(42));
        assert_eq!(
            parse_primary_key("a1b2"),
            SqlValue::Text("a1b2".to_string())
        );
    }

    #[tokio::test]
    async fn test_check_reports_missing_vector_column() {
        let (config, store) = setup().await;
        let err = check(&config, &store).await.unwrap_err().to_string();
        assert!(err.contains("  ok vectors a[blog_entries.title]=1"), "{err}");
        assert!(err.contains("MISSING public_vector (manual)"), "{err}");
        assert!(err.contains("missing vector columns: profiles.public_vector"));
    }

    #[tokio::test]
    async fn test_check_passes_when_columns_exist() {
        let (config, _) = setup().await;
        let store = MockSearchStore::new()
            .with_table("blog_entries", &["vectors"])
            .with_table("profiles", &["public_vector"]);
        let out = check(&config, &store).await.unwrap();
        assert!(out.starts_with("blog_entries (table blog_entries, key id)"));
    }

    #[tokio::test]
    async fn test_resync_variants() {
        let (config, store) = setup().await;
        let sync = Synchronizer::new(config, Arc::new(store.clone()));

        let out = resync(&sync, "blog_entries", None, Some("3")).await.unwrap();
        assert_eq!(out, "blog_entries 3: 1 row(s) updated");
        assert_eq!(store.updates().await[0].primary_key, SqlValue::Int(3));

        let out = resync(&sync, "profiles", None, None).await.unwrap();
        assert_eq!(out, "profiles: 1 vector(s) resynced");

        let out = resync(&sync, "profiles", Some("public_vector"), None)
            .await
            .unwrap();
        assert_eq!(out, "profiles.public_vector: resynced");

        let err = resync(&sync, "ghosts", None, None).await.unwrap_err();
        assert!(matches!(err, Error::EntityNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_resync_missing_record() {
        let (config, _) = setup().await;
        let store = MockSearchStore::new().with_missing_key(8);
        let sync = Synchronizer::new(config, Arc::new(store));

        let out = resync(&sync, "blog_entries", None, Some("8")).await.unwrap();
        assert_eq!(out, "blog_entries 8: 0 row(s) updated");
    }

    #[tokio::test]
    async fn test_search_renders_json_lines() {
        let (config, store) = setup().await;
        store
            .push_rows(vec![
                Row::new().with("id", 1).with("tsearch_rank", 0.5),
                Row::new().with("id", 2).with("tsearch_rank", 0.25),
            ])
            .await;
        let executor = SearchExecutor::new(config, Arc::new(store));

        let out = search(&executor, "blog_entries", "bob", &SearchOptions::new())
            .await
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"rank":0.5,"row":{"id":1}}"#);
    }

    #[tokio::test]
    async fn test_count_renders_number() {
        let (config, store) = setup().await;
        store
            .push_rows(vec![Row::new().with("tsearch_count", 3i64)])
            .await;
        let executor = SearchExecutor::new(config, Arc::new(store));
        assert_eq!(
            count(&executor, "profiles", "ben", None).await.unwrap(),
            "3"
        );
    }

    #[tokio::test]
    async fn test_ddl_print_and_apply() {
        let (config, store) = setup().await;
        let sync = Synchronizer::new(config, Arc::new(store.clone()));

        let out = ddl(&sync, "profiles", None, false).await.unwrap();
        assert_eq!(
            out,
            "ALTER TABLE profiles ADD COLUMN IF NOT EXISTS public_vector tsvector;\n\
             CREATE INDEX IF NOT EXISTS profiles_public_vector_idx ON profiles USING gin(public_vector);"
        );
        assert!(store.statements().await.is_empty());

        ddl(&sync, "profiles", None, true).await.unwrap();
        assert_eq!(store.statements().await.len(), 2);
    }
}
