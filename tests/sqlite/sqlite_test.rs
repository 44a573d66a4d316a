//! End-to-end sync of a SQLite database into the SQLite metadata store.

#[path = "../common/mod.rs"]
mod common;

use std::path::Path;

use common::{by_name, link_titles, BASE_ID};
use nocometa::config::Dialect;
use nocometa::introspect::{SqlClient, SqliteClient};
use nocometa::meta::{Base, MetaStore, RelationType, SqliteMetaStore, UiType};
use nocometa::sync::{MetaDiffType, MetaSync, SyncOptions};
use rusqlite::Connection;
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE author (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE book (
        id INTEGER PRIMARY KEY,
        title VARCHAR(200),
        author_id INTEGER REFERENCES author(id) ON DELETE CASCADE
    );
    CREATE TABLE tag (id INTEGER PRIMARY KEY, label TEXT);
    CREATE TABLE book_tag (
        id INTEGER PRIMARY KEY,
        book_id INTEGER REFERENCES book(id),
        tag_id INTEGER REFERENCES tag(id)
    );
    CREATE VIEW book_titles AS SELECT id, title FROM book;
";

fn sqlite_base() -> Base {
    Base {
        dialect: Dialect::Sqlite,
        ..common::base()
    }
}

fn live_db(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("live.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    path
}

fn alter(path: &Path, sql: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(sql).unwrap();
}

async fn populate(live: &Path, store: &SqliteMetaStore) {
    let client = SqliteClient::open(live).unwrap();
    MetaSync::new(&client, store, SyncOptions::default())
        .populate(&sqlite_base(), &common::project())
        .await
        .unwrap();
}

async fn columns(store: &SqliteMetaStore, tn: &str) -> Vec<nocometa::meta::Column> {
    common::columns(store, tn).await
}

#[tokio::test]
async fn test_introspects_sqlite_schema() {
    let dir = TempDir::new().unwrap();
    let client = SqliteClient::open(live_db(&dir)).unwrap();

    let tables: Vec<String> = client
        .table_list()
        .await
        .unwrap()
        .into_list()
        .into_iter()
        .map(|t| t.tn)
        .collect();
    assert_eq!(tables, vec!["author", "book", "tag", "book_tag"]);

    let book = client.column_list("book").await.unwrap().into_list();
    assert_eq!(book[1].dt, "varchar");
    assert_eq!(book[1].dtxp.as_deref(), Some("200"));

    let relations = client.relation_list_all().await.unwrap().into_list();
    assert_eq!(relations.len(), 3);
    assert!(relations[0].same_key("book", "author_id", "author", "id"));
    assert_eq!(relations[0].dr.as_deref(), Some("CASCADE"));

    assert!(client.column_list("nope").await.is_err());
}

#[tokio::test]
async fn test_populate_persists_to_disk() {
    let dir = TempDir::new().unwrap();
    let live = live_db(&dir);
    let meta = dir.path().join("meta").join("meta.db");

    {
        let store = SqliteMetaStore::open(&meta).unwrap();
        populate(&live, &store).await;
    }

    let store = SqliteMetaStore::open(&meta).unwrap();
    let models = store.list_models(BASE_ID).await.unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.table_name.as_str()).collect();
    assert_eq!(names, vec!["author", "book", "tag", "book_tag", "book_titles"]);
    assert!(models[3].mm);

    let author = columns(&store, "author").await;
    assert!(by_name(&author, "id").ai);
    assert!(by_name(&author, "name").pv);
    assert_eq!(by_name(&author, "name").uidt, UiType::LongText);

    let book = columns(&store, "book").await;
    assert_eq!(by_name(&book, "author_id").uidt, UiType::ForeignKey);
    assert_eq!(link_titles(&book, RelationType::BelongsTo), vec!["author"]);
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["tag List"]);
    let link = book
        .iter()
        .find_map(|c| c.link_of(RelationType::BelongsTo))
        .unwrap();
    assert_eq!(link.delete_rule.as_deref(), Some("CASCADE"));
}

#[tokio::test]
async fn test_schema_drift_round_trip() {
    let dir = TempDir::new().unwrap();
    let live = live_db(&dir);
    let store = SqliteMetaStore::open(dir.path().join("meta.db")).unwrap();
    populate(&live, &store).await;

    alter(
        &live,
        "CREATE TABLE publisher (id INTEGER PRIMARY KEY, name TEXT);
         ALTER TABLE book ADD COLUMN isbn VARCHAR(13);
         ALTER TABLE book ADD COLUMN publisher_id INTEGER REFERENCES publisher(id);
         DROP TABLE book_tag;
         DROP VIEW book_titles;",
    );

    let client = SqliteClient::open(&live).unwrap();
    let sync = MetaSync::new(&client, &store, SyncOptions::default());
    let diffs = sync.compute_diff(&sqlite_base(), &common::project()).await.unwrap();

    let book: Vec<MetaDiffType> = diffs
        .iter()
        .find(|d| d.table_name == "book")
        .unwrap()
        .detected_changes
        .iter()
        .map(|c| c.kind())
        .collect();
    assert!(book.contains(&MetaDiffType::TableColumnAdd));
    assert!(book.contains(&MetaDiffType::TableRelationAdd));
    assert!(book.contains(&MetaDiffType::TableVirtualM2mRemove));
    assert!(diffs
        .iter()
        .any(|d| d.table_name == "book_titles" && d.detected_changes[0].kind() == MetaDiffType::ViewRemove));

    let report = sync.apply_diff(&sqlite_base(), &common::project()).await.unwrap();
    assert_eq!(report.skipped, 0);

    let diffs = sync.compute_diff(&sqlite_base(), &common::project()).await.unwrap();
    assert!(diffs.iter().all(|d| d.is_empty()), "{:#?}", diffs);

    let book = columns(&store, "book").await;
    assert_eq!(by_name(&book, "isbn").dtxp.as_deref(), Some("13"));
    assert_eq!(by_name(&book, "publisher_id").uidt, UiType::ForeignKey);
    assert_eq!(
        link_titles(&book, RelationType::BelongsTo),
        vec!["author", "publisher"]
    );
    assert!(store
        .get_model_by_table(BASE_ID, "book_tag")
        .await
        .unwrap()
        .is_none());
}
