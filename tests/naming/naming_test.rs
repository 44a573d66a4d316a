//! Tests for display titles of tables and columns.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use nocometa::config::Dialect;
use nocometa::introspect::{LiveRelation, Snapshot};
use nocometa::meta::{InMemoryMetaStore, MetaStore, RelationType};
use nocometa::naming::{
    pluralize, singularize, table_alias, unique_title, Inflection, InflectionStep, NamingPolicy,
};

#[test]
fn test_alias_without_prefix_or_inflection_is_identity() {
    let policy = NamingPolicy::for_base(&base(), &project());
    for name in ["Author", "book_tags", "nc_ab12_x", "Ünïcode tablé"] {
        assert_eq!(policy.table_alias(name), name);
        assert_eq!(policy.column_alias(name), name);
    }
}

#[test]
fn test_aliasing_an_alias_changes_nothing() {
    let inflection = Inflection::parse("camelize");
    let once = table_alias("nc_ab12_book_tags", Some("nc_ab12_"), &inflection);
    let twice = table_alias(&once, Some("nc_ab12_"), &inflection);
    assert_eq!(once, "BookTags");
    assert_eq!(twice, once);
}

#[test]
fn test_prefix_replaces_first_occurrence() {
    let identity = Inflection::identity();
    assert_eq!(table_alias("nc_x_nc_x_t", Some("nc_x_"), &identity), "nc_x_t");
    assert_eq!(table_alias("t_nc_x_", Some("nc_x_"), &identity), "t_");
    assert_eq!(table_alias("orders", Some(""), &identity), "orders");
}

#[test]
fn test_inflection_settings() {
    let chain = Inflection::parse("underscore, pluralize, bogus");
    assert_eq!(
        chain.steps(),
        &[InflectionStep::Underscore, InflectionStep::Pluralize]
    );
    assert_eq!(chain.apply("OrderPerson"), "order_people");

    assert!(Inflection::from_setting(Some("none")).is_identity());
    assert_eq!(Inflection::from_setting(None).to_string(), "none");
}

#[test]
fn test_plural_forms() {
    assert_eq!(pluralize("book_tag"), "book_tags");
    assert_eq!(pluralize("child"), "children");
    assert_eq!(singularize("line_items"), "line_item");
    assert_eq!(singularize("data"), "datum");
}

#[test]
fn test_unique_title_suffixes() {
    let taken = ["Tag List", "Tag List1", "Tag List3"];
    assert_eq!(unique_title("Tag List", taken), "Tag List2");
    assert_eq!(unique_title("Tag", taken), "Tag");
}

#[tokio::test]
async fn test_population_uses_base_inflection() {
    let snapshot = Snapshot::new(Dialect::Postgres)
        .table("author", vec![id(), text("full_name")])
        .table("book", vec![id(), text("title"), int("author_id")])
        .relation(LiveRelation::new("book", "author_id", "author", "id"));

    let mut base = base();
    base.inflection_table = Some("camelize".to_string());
    base.inflection_column = Some("humanize".to_string());

    let store = InMemoryMetaStore::new();
    let live = client(snapshot);
    engine(&live, &store).populate(&base, &project()).await.unwrap();

    let titles: Vec<String> = store
        .list_models(BASE_ID)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["Author", "Book"]);

    let book = columns(&store, "book").await;
    assert_eq!(by_name(&book, "author_id").title, "Author id");
    assert_eq!(link_titles(&book, RelationType::BelongsTo), vec!["Author"]);
    let author = columns(&store, "author").await;
    assert_eq!(by_name(&author, "full_name").title, "Full name");
    assert_eq!(link_titles(&author, RelationType::HasMany), vec!["Book List"]);
}
