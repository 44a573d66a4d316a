//! Tests for applying a meta diff to the store.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use nocometa::config::Dialect;
use nocometa::introspect::{LiveColumn, LiveRelation, Snapshot};
use nocometa::meta::{InMemoryMetaStore, MetaStore, RelationType, UiType};
use nocometa::sync::{sort_for_apply, ApplyReport, MetaDiff, MetaDiffType};

async fn apply(store: &InMemoryMetaStore, live: Snapshot) -> ApplyReport {
    let client = client(live);
    engine(&client, store)
        .apply_diff(&base(), &project())
        .await
        .unwrap()
}

async fn diff(store: &InMemoryMetaStore, live: Snapshot) -> Vec<MetaDiff> {
    let client = client(live);
    engine(&client, store)
        .compute_diff(&base(), &project())
        .await
        .unwrap()
}

async fn assert_converged(store: &InMemoryMetaStore, live: Snapshot) {
    let diffs = diff(store, live).await;
    assert!(diffs.iter().all(|d| d.is_empty()), "{:#?}", diffs);
}

/// Columns added and retyped, a table added with a new relation, the tag
/// tables dropped and the views swapped.
fn evolved() -> Snapshot {
    Snapshot::new(Dialect::Postgres)
        .table("Author", vec![id(), text("name"), int("born")])
        .table(
            "Book",
            vec![
                id(),
                LiveColumn::new("title", "text"),
                int("author_id"),
                int("publisher_id"),
            ],
        )
        .table("Publisher", vec![id(), text("name")])
        .view("BookAuthors", vec![text("title"), text("name")])
        .relation(LiveRelation::new("Book", "author_id", "Author", "id"))
        .relation(LiveRelation::new("Book", "publisher_id", "Publisher", "id"))
}

#[tokio::test]
async fn test_apply_then_diff_is_empty() {
    let store = populated(library_with_tags().view("Stale", vec![text("x")])).await;

    let report = apply(&store, evolved()).await;
    assert_eq!(
        report,
        ApplyReport {
            applied: 12,
            skipped: 0
        }
    );

    assert_converged(&store, evolved()).await;

    let tables: Vec<String> = store
        .list_models(BASE_ID)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.table_name)
        .collect();
    assert_eq!(tables, vec!["Author", "Book", "Publisher", "BookAuthors"]);

    let book = columns(&store, "Book").await;
    assert_eq!(by_name(&book, "title").dt.as_deref(), Some("text"));
    assert_eq!(by_name(&book, "title").uidt, UiType::LongText);
    assert!(link_titles(&book, RelationType::ManyToMany).is_empty());
    assert_eq!(
        link_titles(&book, RelationType::BelongsTo),
        vec!["Author", "Publisher"]
    );
}

#[tokio::test]
async fn test_new_models_are_appended_in_order() {
    let store = populated(library()).await;
    apply(&store, evolved()).await;

    let publisher = model(&store, "Publisher").await;
    let view = model(&store, "BookAuthors").await;
    assert_eq!((publisher.order, view.order), (4, 5));
}

#[tokio::test]
async fn test_relation_add_marks_foreign_key() {
    let unlinked = Snapshot::new(Dialect::Postgres)
        .table("Author", vec![id(), text("name")])
        .table("Book", vec![id(), text("title"), int("author_id")]);
    let store = populated(unlinked).await;
    assert_eq!(by_name(&columns(&store, "Book").await, "author_id").uidt, UiType::Number);

    let report = apply(&store, library()).await;
    assert_eq!(report.applied, 2);

    let book = columns(&store, "Book").await;
    let author_id = by_name(&book, "author_id");
    assert_eq!(author_id.uidt, UiType::ForeignKey);
    assert!(author_id.system);
    assert_eq!(link_titles(&book, RelationType::BelongsTo), vec!["Author"]);
    assert_eq!(
        link_titles(&columns(&store, "Author").await, RelationType::HasMany),
        vec!["Book List"]
    );

    assert_converged(&store, library()).await;
}

#[tokio::test]
async fn test_foreign_key_survives_type_change() {
    let store = populated(library()).await;
    let mut live = library();
    live.columns_mut("Book").unwrap()[2] = LiveColumn::new("author_id", "int8");

    apply(&store, live.clone()).await;

    let author_id = by_name(&columns(&store, "Book").await, "author_id").clone();
    assert_eq!(author_id.uidt, UiType::ForeignKey);
    assert_eq!(author_id.dt.as_deref(), Some("int8"));
    assert_converged(&store, live).await;
}

#[tokio::test]
async fn test_props_change_is_copied() {
    let store = populated(library()).await;
    let mut live = library();
    live.columns_mut("Author").unwrap()[1].rqd = true;
    live.columns_mut("Author").unwrap()[1].unique = true;

    apply(&store, live.clone()).await;

    let name = by_name(&columns(&store, "Author").await, "name").clone();
    assert!(name.rqd && name.unique);
    assert_converged(&store, live).await;
}

#[tokio::test]
async fn test_relation_removals_sorted_first() {
    let store = populated(library_with_tags()).await;
    let live = library()
        .table("Tag", vec![id(), text("name")])
        .table("BookTag", vec![id(), int("book_id")])
        .relation(LiveRelation::new("BookTag", "book_id", "Book", "id"));

    let diffs = diff(&store, live).await;
    let mut changes = diffs
        .into_iter()
        .find(|d| d.table_name == "BookTag")
        .unwrap()
        .detected_changes;
    sort_for_apply(&mut changes);

    let kinds: Vec<MetaDiffType> = changes.iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            MetaDiffType::TableRelationRemove,
            MetaDiffType::TableColumnRemove
        ]
    );
}

#[tokio::test]
async fn test_new_junction_gets_mm_columns() {
    let store = populated(library().table("Tag", vec![id(), text("name")])).await;

    apply(&store, library_with_tags()).await;

    assert!(model(&store, "BookTag").await.mm);
    let book = columns(&store, "Book").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["Tag List"]);
    assert!(by_title(&book, "BookTag List").system);
    let tag = columns(&store, "Tag").await;
    assert_eq!(link_titles(&tag, RelationType::ManyToMany), vec!["Book List"]);

    let bridge = columns(&store, "BookTag").await;
    assert_eq!(by_name(&bridge, "tag_id").uidt, UiType::ForeignKey);

    assert_converged(&store, library_with_tags()).await;
}

#[tokio::test]
async fn test_removed_junction_is_cleaned_up() {
    let store = populated(library_with_tags()).await;
    let live = library().table("Tag", vec![id(), text("name")]);

    apply(&store, live.clone()).await;

    assert!(store
        .get_model_by_table(BASE_ID, "BookTag")
        .await
        .unwrap()
        .is_none());
    let book = columns(&store, "Book").await;
    assert!(book.iter().all(|c| c.title != "Tag List" && c.title != "BookTag List"));
    let tag = columns(&store, "Tag").await;
    assert!(tag.iter().all(|c| !c.is_virtual()));

    assert_converged(&store, live).await;
}

#[tokio::test]
async fn test_degraded_junction_shows_has_many_again() {
    let store = populated(library_with_tags()).await;
    assert!(by_title(&columns(&store, "Book").await, "BookTag List").system);

    let live = library()
        .table("Tag", vec![id(), text("name")])
        .table("BookTag", vec![id(), int("book_id")])
        .relation(LiveRelation::new("BookTag", "book_id", "Book", "id"));
    apply(&store, live.clone()).await;

    assert!(!model(&store, "BookTag").await.mm);
    let book = columns(&store, "Book").await;
    assert!(link_titles(&book, RelationType::ManyToMany).is_empty());
    assert_eq!(link_titles(&book, RelationType::HasMany), vec!["BookTag List"]);
    assert!(!by_title(&book, "BookTag List").system);

    assert_converged(&store, live).await;
}

#[tokio::test]
async fn test_failed_change_is_skipped() {
    let store = populated(library()).await;
    let live = Snapshot::new(Dialect::Postgres)
        .table("Author", vec![id()])
        .table("Book", vec![id(), text("title"), int("author_id")])
        .relation(LiveRelation::new("Book", "author_id", "Author", "id"));

    let diffs = diff(&store, live.clone()).await;
    // The column disappears between diff and apply.
    let name = by_name(&columns(&store, "Author").await, "name").id.clone();
    store.delete_column(&name).await.unwrap();

    let client = client(live);
    let report = engine(&client, &store)
        .apply_changes(&base(), &project(), diffs)
        .await
        .unwrap();
    assert_eq!(
        report,
        ApplyReport {
            applied: 0,
            skipped: 1
        }
    );
}

#[tokio::test]
async fn test_apply_without_drift_is_a_no_op() {
    let store = populated(library_with_tags()).await;
    let before = store.list_models(BASE_ID).await.unwrap();

    let report = apply(&store, library_with_tags()).await;

    assert_eq!(report, ApplyReport::default());
    assert_eq!(store.list_models(BASE_ID).await.unwrap(), before);
}
