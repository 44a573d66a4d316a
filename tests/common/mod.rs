//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use nocometa::config::Dialect;
use nocometa::introspect::{LiveColumn, LiveRelation, Snapshot, SnapshotClient};
use nocometa::meta::{Base, Column, InMemoryMetaStore, MetaStore, Model, Project, RelationType};
use nocometa::sync::{MetaSync, SyncOptions};

pub const BASE_ID: &str = "p_test_default";

pub fn project() -> Project {
    Project {
        id: "p_test".to_string(),
        title: "Library".to_string(),
        prefix: None,
        uuid: None,
        deleted: false,
        bases: vec![base()],
    }
}

pub fn base() -> Base {
    Base {
        id: BASE_ID.to_string(),
        project_id: "p_test".to_string(),
        alias: Some("default".to_string()),
        dialect: Dialect::Postgres,
        config: None,
        is_meta: false,
        inflection_table: None,
        inflection_column: None,
    }
}

pub fn id() -> LiveColumn {
    LiveColumn::primary_key("id", "int4")
}

pub fn text(cn: &str) -> LiveColumn {
    LiveColumn::new(cn, "varchar")
}

pub fn int(cn: &str) -> LiveColumn {
    LiveColumn::new(cn, "int4")
}

/// `Author(id, name)` and `Book(id, title, author_id -> Author.id)`.
pub fn library() -> Snapshot {
    Snapshot::new(Dialect::Postgres)
        .table("Author", vec![id(), text("name")])
        .table("Book", vec![id(), text("title"), int("author_id")])
        .relation(LiveRelation::new("Book", "author_id", "Author", "id"))
}

/// The library plus `Tag(id, name)` and the junction
/// `BookTag(id, book_id -> Book.id, tag_id -> Tag.id)`.
pub fn library_with_tags() -> Snapshot {
    library()
        .table("Tag", vec![id(), text("name")])
        .table("BookTag", vec![id(), int("book_id"), int("tag_id")])
        .relation(LiveRelation::new("BookTag", "book_id", "Book", "id"))
        .relation(LiveRelation::new("BookTag", "tag_id", "Tag", "id"))
}

pub fn client(snapshot: Snapshot) -> SnapshotClient {
    SnapshotClient::new(snapshot)
}

pub fn engine<'a>(client: &'a SnapshotClient, store: &'a InMemoryMetaStore) -> MetaSync<'a> {
    MetaSync::new(client, store, SyncOptions::default())
}

/// A store populated from `snapshot`.
pub async fn populated(snapshot: Snapshot) -> InMemoryMetaStore {
    let store = InMemoryMetaStore::new();
    let client = client(snapshot);
    engine(&client, &store)
        .populate(&base(), &project())
        .await
        .unwrap();
    store
}

pub async fn model(store: &dyn MetaStore, table_name: &str) -> Model {
    store
        .get_model_by_table(BASE_ID, table_name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no model for {}", table_name))
}

pub async fn columns(store: &dyn MetaStore, table_name: &str) -> Vec<Column> {
    let model = model(store, table_name).await;
    store.list_columns(&model.id).await.unwrap()
}

pub fn by_title<'c>(columns: &'c [Column], title: &str) -> &'c Column {
    columns
        .iter()
        .find(|c| c.title == title)
        .unwrap_or_else(|| panic!("no column titled {}", title))
}

pub fn by_name<'c>(columns: &'c [Column], name: &str) -> &'c Column {
    columns
        .iter()
        .find(|c| c.column_name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no column named {}", name))
}

/// Titles of the link columns of one relation kind.
pub fn link_titles(columns: &[Column], relation_type: RelationType) -> Vec<String> {
    columns
        .iter()
        .filter(|c| c.link_of(relation_type).is_some())
        .map(|c| c.title.clone())
        .collect()
}
