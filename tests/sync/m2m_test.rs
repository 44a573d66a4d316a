//! Tests for many-to-many derivation over junction tables.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use nocometa::introspect::{LiveRelation, Snapshot};
use nocometa::meta::{MetaStore, NewColumn, RelationType, UiType};
use nocometa::sync::derive_m2m;

#[tokio::test]
async fn test_junction_table_scenario() {
    let store = populated(library_with_tags()).await;

    let book_tag = model(&store, "BookTag").await;
    assert!(book_tag.mm);

    let book = columns(&store, "Book").await;
    let tag = columns(&store, "Tag").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["Tag List"]);
    assert_eq!(link_titles(&tag, RelationType::ManyToMany), vec!["Book List"]);

    // The raw has-many views of the junction are hidden.
    assert!(by_title(&book, "BookTag List").system);
    assert!(by_title(&tag, "BookTag List").system);
    // Unrelated has-many columns are not.
    let author = columns(&store, "Author").await;
    assert!(!by_title(&author, "Book List").system);
}

#[tokio::test]
async fn test_mm_columns_are_symmetric() {
    let store = populated(library_with_tags()).await;
    let book_model = model(&store, "Book").await;
    let tag_model = model(&store, "Tag").await;
    let junction = model(&store, "BookTag").await;

    let book = columns(&store, "Book").await;
    let tag = columns(&store, "Tag").await;
    let bridge = columns(&store, "BookTag").await;

    let book_to_tag = by_title(&book, "Tag List")
        .link_of(RelationType::ManyToMany)
        .unwrap();
    let tag_to_book = by_title(&tag, "Book List")
        .link_of(RelationType::ManyToMany)
        .unwrap();

    assert_eq!(book_to_tag.fk_related_model_id, tag_model.id);
    assert_eq!(tag_to_book.fk_related_model_id, book_model.id);
    assert_eq!(book_to_tag.fk_child_column_id, by_name(&book, "id").id);
    assert_eq!(book_to_tag.fk_parent_column_id, by_name(&tag, "id").id);

    let forward = book_to_tag.junction.as_ref().unwrap();
    let backward = tag_to_book.junction.as_ref().unwrap();
    assert_eq!(forward.fk_mm_model_id, junction.id);
    assert_eq!(backward.fk_mm_model_id, junction.id);
    assert_eq!(forward.fk_mm_child_column_id, by_name(&bridge, "book_id").id);
    assert_eq!(forward.fk_mm_parent_column_id, by_name(&bridge, "tag_id").id);
    assert_eq!(forward.fk_mm_child_column_id, backward.fk_mm_parent_column_id);
    assert_eq!(forward.fk_mm_parent_column_id, backward.fk_mm_child_column_id);
}

fn junction_with(extra: usize) -> Snapshot {
    let mut columns = vec![id(), int("book_id"), int("tag_id")];
    columns.extend((0..extra).map(|i| text(&format!("note{}", i))));
    library()
        .table("Tag", vec![id(), text("name")])
        .table("BookTag", columns)
        .relation(LiveRelation::new("BookTag", "book_id", "Book", "id"))
        .relation(LiveRelation::new("BookTag", "tag_id", "Tag", "id"))
}

#[tokio::test]
async fn test_four_normal_columns_is_a_junction() {
    let store = populated(junction_with(1)).await;

    assert!(model(&store, "BookTag").await.mm);
    let book = columns(&store, "Book").await;
    let tag = columns(&store, "Tag").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany).len(), 1);
    assert_eq!(link_titles(&tag, RelationType::ManyToMany).len(), 1);
}

#[tokio::test]
async fn test_five_normal_columns_is_not_a_junction() {
    let store = populated(junction_with(2)).await;

    assert!(!model(&store, "BookTag").await.mm);
    let book = columns(&store, "Book").await;
    assert!(link_titles(&book, RelationType::ManyToMany).is_empty());
    assert!(!by_title(&book, "BookTag List").system);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = populated(library_with_tags()).await;
    let models = store.list_models(BASE_ID).await.unwrap();

    assert_eq!(derive_m2m(&store, &models).await, 0);

    let book = columns(&store, "Book").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["Tag List"]);
}

#[tokio::test]
async fn test_flag_cleared_when_bridge_shape_is_lost() {
    let store = populated(library_with_tags()).await;
    let junction = model(&store, "BookTag").await;
    assert!(junction.mm);

    for name in ["added_by", "added_at"] {
        store
            .insert_column(NewColumn {
                model_id: junction.id.clone(),
                column_name: Some(name.to_string()),
                title: name.to_string(),
                uidt: UiType::SingleLineText,
                dt: Some("varchar".to_string()),
                dtxp: None,
                order: None,
                system: false,
                pv: false,
                pk: false,
                ai: false,
                rqd: false,
                un: false,
                unique: false,
                cdf: None,
                options: None,
            })
            .await
            .unwrap();
    }

    let models = store.list_models(BASE_ID).await.unwrap();
    derive_m2m(&store, &models).await;

    assert!(!model(&store, "BookTag").await.mm);
    // Existing mm columns are left for the diff to clean up.
    let book = columns(&store, "Book").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["Tag List"]);
}

#[tokio::test]
async fn test_mm_title_avoids_collisions() {
    // "Tag List" is already a physical column on Book.
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("Book", vec![id(), text("Tag List")])
        .table("Tag", vec![id(), text("name")])
        .table("BookTag", vec![id(), int("book_id"), int("tag_id")])
        .relation(LiveRelation::new("BookTag", "book_id", "Book", "id"))
        .relation(LiveRelation::new("BookTag", "tag_id", "Tag", "id"));
    let store = populated(snapshot).await;
    let book = columns(&store, "Book").await;
    assert_eq!(link_titles(&book, RelationType::ManyToMany), vec!["Tag List1"]);
}

#[tokio::test]
async fn test_self_referencing_junction() {
    let snapshot = Snapshot::new(nocometa::config::Dialect::Postgres)
        .table("Person", vec![id(), text("name")])
        .table("Friendship", vec![id(), int("person_id"), int("friend_id")])
        .relation(LiveRelation::new("Friendship", "person_id", "Person", "id"))
        .relation(LiveRelation::new("Friendship", "friend_id", "Person", "id"));
    let store = populated(snapshot).await;

    assert!(model(&store, "Friendship").await.mm);
    let person = columns(&store, "Person").await;
    assert_eq!(
        link_titles(&person, RelationType::ManyToMany),
        vec!["Person List", "Person List1"]
    );
}
