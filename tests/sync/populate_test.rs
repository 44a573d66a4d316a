//! Tests for first-time population of a base.

#[path = "../common/mod.rs"]
mod common;

use async_trait::async_trait;
use common::*;
use nocometa::introspect::{LiveRelation, Snapshot};
use nocometa::meta::{InMemoryMetaStore, MetaStore, Model, ModelType, RelationType, UiType};
use nocometa::sync::{MetaSync, SyncOptions, SyncResult, ViewRepair};
use tokio::sync::Mutex;

#[tokio::test]
async fn test_fresh_population_author_book() {
    let store = InMemoryMetaStore::new();
    let client = client(library());
    let report = engine(&client, &store)
        .populate(&base(), &project())
        .await
        .unwrap();

    assert_eq!(report.tables_count, 2);
    assert_eq!(report.views_count, 0);
    assert_eq!(report.relations_count, 1);
    // 5 per table, 5 per relation column
    assert_eq!(report.api_count, 20);

    let models = store.list_models(BASE_ID).await.unwrap();
    assert_eq!(models.len(), 2);

    let book = columns(&store, "Book").await;
    let author_id = by_name(&book, "author_id");
    assert_eq!(author_id.uidt, UiType::ForeignKey);
    assert!(author_id.system);
    assert_eq!(link_titles(&book, RelationType::BelongsTo), vec!["Author"]);

    let author = columns(&store, "Author").await;
    assert_eq!(link_titles(&author, RelationType::HasMany), vec!["Book List"]);
}

#[tokio::test]
async fn test_relation_columns_reference_each_other() {
    let store = populated(library()).await;
    let author = model(&store, "Author").await;
    let book = model(&store, "Book").await;
    let author_columns = columns(&store, "Author").await;
    let book_columns = columns(&store, "Book").await;

    let bt = by_title(&book_columns, "Author")
        .link_of(RelationType::BelongsTo)
        .unwrap();
    let hm = by_title(&author_columns, "Book List")
        .link_of(RelationType::HasMany)
        .unwrap();

    assert_eq!(bt.fk_related_model_id, author.id);
    assert_eq!(hm.fk_related_model_id, book.id);
    assert_eq!(bt.fk_child_column_id, hm.fk_child_column_id);
    assert_eq!(bt.fk_parent_column_id, hm.fk_parent_column_id);
    assert_eq!(bt.fk_child_column_id, by_name(&book_columns, "author_id").id);
    assert_eq!(bt.fk_parent_column_id, by_name(&author_columns, "id").id);
}

#[tokio::test]
async fn test_model_count_skips_ignored_tables() {
    let snapshot = library()
        .table("nc_evolutions", vec![id(), text("title")])
        .table("xc_knex_migrations", vec![id()])
        .view("BookAuthors", vec![text("title"), text("name")]);

    let store = InMemoryMetaStore::new();
    let client = client(snapshot);
    let report = engine(&client, &store)
        .populate(&base(), &project())
        .await
        .unwrap();

    assert_eq!(report.tables_count, 2);
    assert_eq!(report.views_count, 1);

    let models = store.list_models(BASE_ID).await.unwrap();
    let tables = models.iter().filter(|m| m.model_type == ModelType::Table).count();
    let views = models.iter().filter(|m| m.model_type == ModelType::View).count();
    assert_eq!((tables, views), (2, 1));
    assert!(store
        .get_model_by_table(BASE_ID, "nc_evolutions")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_custom_ignore_list() {
    let store = InMemoryMetaStore::new();
    let client = client(library());
    let options = SyncOptions::default().with_ignore_tables(vec!["Author".to_string()]);
    let report = MetaSync::new(&client, &store, options)
        .populate(&base(), &project())
        .await
        .unwrap();

    assert_eq!(report.tables_count, 1);
    // The relation's parent was never imported, so its columns are skipped.
    let book = columns(&store, "Book").await;
    assert!(link_titles(&book, RelationType::BelongsTo).is_empty());
}

#[tokio::test]
async fn test_prefix_filters_and_strips_for_meta_base() {
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("nc_ab12_books", vec![id(), text("title")])
        .table("nc_zz99_books", vec![id(), text("title")])
        .table("legacy", vec![id()]);

    let mut project = project();
    project.prefix = Some("nc_ab12_".to_string());
    let mut base = base();
    base.is_meta = true;

    let store = InMemoryMetaStore::new();
    let client = client(snapshot);
    let report = engine(&client, &store)
        .populate(&base, &project)
        .await
        .unwrap();

    assert_eq!(report.tables_count, 1);
    let models = store.list_models(BASE_ID).await.unwrap();
    assert_eq!(models[0].table_name, "nc_ab12_books");
    assert_eq!(models[0].title, "books");
}

#[tokio::test]
async fn test_prefix_ignored_for_external_base() {
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("nc_ab12_books", vec![id()])
        .table("legacy", vec![id()]);

    let mut project = project();
    project.prefix = Some("nc_ab12_".to_string());

    let store = populated_with(snapshot, &project).await;
    let titles: Vec<String> = store
        .list_models(BASE_ID)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["nc_ab12_books", "legacy"]);
}

async fn populated_with(snapshot: Snapshot, project: &nocometa::meta::Project) -> InMemoryMetaStore {
    let store = InMemoryMetaStore::new();
    let client = client(snapshot);
    engine(&client, &store).populate(&base(), project).await.unwrap();
    store
}

#[tokio::test]
async fn test_orders_start_at_two_and_views_continue() {
    let snapshot = library().view("BookAuthors", vec![text("title")]);
    let store = populated(snapshot).await;

    let orders: Vec<(String, u32)> = store
        .list_models(BASE_ID)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.table_name, m.order))
        .collect();
    assert_eq!(
        orders,
        vec![
            ("Author".to_string(), 2),
            ("Book".to_string(), 3),
            ("BookAuthors".to_string(), 4),
        ]
    );

    let book = columns(&store, "Book").await;
    let column_orders: Vec<u32> = book.iter().map(|c| c.order).collect();
    assert_eq!(column_orders, vec![1, 2, 3, 4]);
    assert!(book[3].is_virtual());
}

#[tokio::test]
async fn test_display_value_follows_primary_key() {
    let store = populated(library()).await;
    let author = columns(&store, "Author").await;

    let pv: Vec<&str> = author
        .iter()
        .filter(|c| c.pv)
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(pv, vec!["name"]);
}

#[tokio::test]
async fn test_colliding_relation_titles_get_suffixes() {
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("Author", vec![id(), text("name")])
        .table(
            "Book",
            vec![id(), text("title"), int("author_id"), int("editor_id")],
        )
        .relation(LiveRelation::new("Book", "author_id", "Author", "id"))
        .relation(LiveRelation::new("Book", "editor_id", "Author", "id"));
    let store = populated(snapshot).await;

    let book = columns(&store, "Book").await;
    assert_eq!(
        link_titles(&book, RelationType::BelongsTo),
        vec!["Author", "Author1"]
    );

    let author = columns(&store, "Author").await;
    assert_eq!(
        link_titles(&author, RelationType::HasMany),
        vec!["Book List", "Book List1"]
    );
}

#[tokio::test]
async fn test_self_reference() {
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("Employee", vec![id(), text("name"), int("manager_id")])
        .relation(LiveRelation::new("Employee", "manager_id", "Employee", "id"));
    let store = populated(snapshot).await;

    let employee = columns(&store, "Employee").await;
    assert_eq!(link_titles(&employee, RelationType::HasMany), vec!["Employee List"]);
    assert_eq!(link_titles(&employee, RelationType::BelongsTo), vec!["Employee"]);
}

#[tokio::test]
async fn test_relation_metadata_is_kept() {
    let mut relation = LiveRelation::new("Book", "author_id", "Author", "id");
    relation.cstn = Some("book_author_fk".to_string());
    relation.dr = Some("CASCADE".to_string());
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("Author", vec![id(), text("name")])
        .table("Book", vec![id(), text("title"), int("author_id")])
        .relation(relation);
    let store = populated(snapshot).await;

    let book = columns(&store, "Book").await;
    let link = by_title(&book, "Author").link().unwrap();
    assert_eq!(link.fk_index_name.as_deref(), Some("book_author_fk"));
    assert_eq!(link.delete_rule.as_deref(), Some("CASCADE"));
    assert!(!link.virtual_link);
}

#[tokio::test]
async fn test_second_population_does_not_duplicate() {
    let store = populated(library()).await;
    let client = client(library());
    let report = engine(&client, &store)
        .populate(&base(), &project())
        .await
        .unwrap();

    assert_eq!(report.tables_count, 0);
    assert_eq!(store.list_models(BASE_ID).await.unwrap().len(), 2);
    let author = columns(&store, "Author").await;
    assert_eq!(link_titles(&author, RelationType::HasMany), vec!["Book List"]);
}

/// Records every repaired view.
#[derive(Default)]
struct RecordingViewRepair {
    fixed: Mutex<Vec<String>>,
}

#[async_trait]
impl ViewRepair for RecordingViewRepair {
    async fn grid_views(&self, model: &Model) -> SyncResult<Vec<String>> {
        Ok(vec![format!("vw_{}", model.table_name)])
    }

    async fn fix_pv_column_for_view(&self, view_id: &str) -> SyncResult<()> {
        self.fixed.lock().await.push(view_id.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_grid_views_are_repaired() {
    let store = InMemoryMetaStore::new();
    let client = client(library().view("BookAuthors", vec![text("title")]));
    let repair = RecordingViewRepair::default();

    engine(&client, &store)
        .with_view_repair(&repair)
        .populate(&base(), &project())
        .await
        .unwrap();

    let mut fixed = repair.fixed.lock().await.clone();
    fixed.sort();
    assert_eq!(fixed, vec!["vw_Author", "vw_Book", "vw_BookAuthors"]);
}

#[tokio::test]
async fn test_unknown_table_in_snapshot_fails_fast() {
    let json = r#"{
        "dialect": "pg",
        "tables": [{ "tn": "Book", "columns": [{ "cn": "id", "dt": "int4" }] }],
        "relations": [{ "tn": "Book", "cn": "author_id", "rtn": "Author", "rcn": "id" }]
    }"#;
    assert!(nocometa::introspect::SnapshotClient::from_json(json).is_err());
}
