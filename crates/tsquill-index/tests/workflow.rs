//! Configure → resync → search against the mock store, the way a host
//! application wires the pieces together.

use std::collections::BTreeMap;
use std::sync::Arc;

use tsquill_core::{MockSearchStore, Row, SaveCallback, SearchStore, SqlValue};
use tsquill_index::{
    Conditions, EntitySpec, SearchExecutor, SearchOptions, Synchronizer, VectorConfig,
};

const CONFIG: &str = r#"
[blog_entries]
fields = ["title", "description"]

[profiles.public_vector]
fields = ["name", "public_info"]

[profiles.private_vector]
fields = ["name", "private_info"]
auto_update_index = false
"#;

fn store() -> MockSearchStore {
    MockSearchStore::new()
        .with_table("blog_entries", &["id", "title", "description"])
        .with_table("profiles", &["id", "name", "public_info", "private_info"])
}

async fn wire(store: &MockSearchStore) -> (Synchronizer, SearchExecutor) {
    let specs: BTreeMap<String, EntitySpec> = toml::from_str(CONFIG).unwrap();
    let mut config = VectorConfig::new();
    config.configure_all(&specs, store).await.unwrap();

    let config = Arc::new(config);
    let shared: Arc<dyn SearchStore> = Arc::new(store.clone());
    (
        Synchronizer::new(config.clone(), shared.clone()),
        SearchExecutor::new(config, shared),
    )
}

#[test]
fn test_configure_from_toml() {
    tokio_test::block_on(async {
        let store = store();
        let (sync, _) = wire(&store).await;
        assert_eq!(sync.config().entity_names(), vec!["blog_entries", "profiles"]);
        assert_eq!(
            sync.config().entity("profiles").unwrap().vector_names(),
            vec!["private_vector", "public_vector"]
        );
    });
}

#[tokio::test]
async fn test_save_then_search() {
    let store = store();
    let (sync, executor) = wire(&store).await;

    let refreshed = sync
        .after_save("blog_entries", &SqlValue::Int(1))
        .await
        .unwrap();
    assert_eq!(refreshed, 1);

    store
        .push_rows(vec![
            Row::new()
                .with("id", 1)
                .with("title", "Bob eats apples")
                .with("tsearch_rank", 0.6),
        ])
        .await;
    let hits = executor
        .find("blog_entries", Some("Bob"), None, &SearchOptions::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get("id"), Some(&SqlValue::Int(1)));

    let statements = store.statements().await;
    assert_eq!(statements.last().unwrap().params[0], SqlValue::from("bob"));
}

#[tokio::test]
async fn test_manual_vector_needs_explicit_resync() {
    let store = store();
    let (sync, _) = wire(&store).await;

    sync.after_save("profiles", &SqlValue::Int(3)).await.unwrap();
    let columns: Vec<String> = store.updates().await.into_iter().map(|u| u.column).collect();
    assert_eq!(columns, vec!["public_vector"]);

    sync.resync_all("profiles", Some("private_vector"))
        .await
        .unwrap();
    let statements = store.statements().await;
    assert!(statements[0]
        .sql
        .starts_with("UPDATE profiles SET private_vector = "));
}

#[tokio::test]
async fn test_count_matches_find_filters() {
    let store = store();
    let (_, executor) = wire(&store).await;
    let conditions = Conditions::new().filter("profiles.id > ?", [10]);
    let options = SearchOptions::new()
        .with_vector("public_vector")
        .with_limit(1);

    store
        .push_rows(vec![Row::new().with("tsearch_count", 4i64)])
        .await;
    let count = executor
        .count("profiles", Some("-spam eggs"), Some(&conditions), &options)
        .await
        .unwrap();
    assert_eq!(count, 4);

    let statement = store.statements().await.remove(0);
    assert_eq!(
        statement.params,
        vec![SqlValue::from("!spam&eggs"), SqlValue::Int(10)]
    );
    assert!(!statement.sql.contains("LIMIT"));
}
