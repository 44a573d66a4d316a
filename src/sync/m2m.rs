//! Many-to-many derivation over junction tables.

use tracing::{debug, info, warn};

use super::error::{SyncError, SyncResult};
use crate::meta::graph;
use crate::meta::{
    Column, Junction, LinkToAnotherRecord, MetaStore, Model, ModelType, NewColumn, RelationType,
};
use crate::naming::unique_title;

/// A junction table has fewer physical columns than this.
pub const BRIDGE_NORMAL_COLUMN_LIMIT: usize = 5;

/// The two belongs-to links of a junction table, if `columns` has bridge
/// shape: exactly two belongs-to columns and fewer than
/// [`BRIDGE_NORMAL_COLUMN_LIMIT`] physical columns.
fn bridge_links(columns: &[Column]) -> Option<(LinkToAnotherRecord, LinkToAnotherRecord)> {
    let normal = columns.iter().filter(|c| !c.is_virtual()).count();
    let belongs_to: Vec<&LinkToAnotherRecord> = columns
        .iter()
        .filter_map(|c| c.link_of(RelationType::BelongsTo))
        .collect();

    match belongs_to.as_slice() {
        [first, second] if normal < BRIDGE_NORMAL_COLUMN_LIMIT => {
            Some(((*first).clone(), (*second).clone()))
        }
        _ => None,
    }
}

/// Whether a model with these columns is a junction table.
pub fn is_bridge(columns: &[Column]) -> bool {
    bridge_links(columns).is_some()
}

/// Flag junction tables among `models` and link the tables they join.
///
/// For each junction `J` joining `A` and `B`, an `mm` column titled
/// `"<B title> List"` is added to `A` and its mirror to `B` unless one
/// already exists, `J` is flagged `mm`, and the has-many columns `A` and `B`
/// hold on `J` are hidden. A model that lost its bridge shape has the flag
/// cleared and the has-many columns mirroring its remaining belongs-to links
/// shown again; its `mm` columns are left for the diff to remove.
///
/// Safe to re-run. Failures concern one model and are logged. Returns the
/// number of `mm` columns inserted.
pub async fn derive_m2m(store: &dyn MetaStore, models: &[Model]) -> usize {
    let mut inserted = 0;
    for model in models.iter().filter(|m| m.model_type == ModelType::Table) {
        match derive_one(store, model).await {
            Ok(n) => inserted += n,
            Err(e) => warn!(table = %model.table_name, error = %e, "m2m derivation skipped"),
        }
    }
    if inserted > 0 {
        info!(columns = inserted, "derived many-to-many columns");
    }
    inserted
}

async fn derive_one(store: &dyn MetaStore, model: &Model) -> SyncResult<usize> {
    let columns = store.list_columns(&model.id).await?;

    let Some((first, second)) = bridge_links(&columns) else {
        if model.mm {
            debug!(table = %model.table_name, "no longer a junction table");
            store.set_mm(&model.id, false).await?;
            for link in columns.iter().filter_map(|c| c.link_of(RelationType::BelongsTo)) {
                set_has_many_hidden(store, link, false).await?;
            }
        }
        return Ok(0);
    };

    let model_a = graph::related_model(store, &first)
        .await?
        .ok_or_else(|| SyncError::MissingModel(first.fk_related_model_id.to_string()))?;
    let model_b = graph::related_model(store, &second)
        .await?
        .ok_or_else(|| SyncError::MissingModel(second.fk_related_model_id.to_string()))?;

    let mut inserted = 0;
    if add_mm_column(store, model, &model_a, &model_b, &first, &second).await? {
        inserted += 1;
    }
    if add_mm_column(store, model, &model_b, &model_a, &second, &first).await? {
        inserted += 1;
    }

    if !model.mm {
        store.set_mm(&model.id, true).await?;
    }

    for link in [&first, &second] {
        set_has_many_hidden(store, link, true).await?;
    }

    Ok(inserted)
}

/// Add the `mm` column on `source` reaching `target` through `junction`.
///
/// `own` is the junction's belongs-to link pointing at `source`, `other`
/// the one pointing at `target`. Returns false when the column exists.
async fn add_mm_column(
    store: &dyn MetaStore,
    junction: &Model,
    source: &Model,
    target: &Model,
    own: &LinkToAnotherRecord,
    other: &LinkToAnotherRecord,
) -> SyncResult<bool> {
    // Reload: with a self-referencing junction the previous insert landed here.
    let columns = store.list_columns(&source.id).await?;

    let link = LinkToAnotherRecord {
        relation_type: RelationType::ManyToMany,
        fk_child_column_id: own.fk_parent_column_id.clone(),
        fk_parent_column_id: other.fk_parent_column_id.clone(),
        fk_related_model_id: target.id.clone(),
        junction: Some(Junction {
            fk_mm_model_id: junction.id.clone(),
            fk_mm_child_column_id: own.fk_child_column_id.clone(),
            fk_mm_parent_column_id: other.fk_child_column_id.clone(),
        }),
        fk_index_name: None,
        update_rule: None,
        delete_rule: None,
        virtual_link: false,
    };

    let exists = columns
        .iter()
        .filter_map(|c| c.link_of(RelationType::ManyToMany))
        .any(|existing| {
            existing.junction == link.junction
                && existing.fk_child_column_id == link.fk_child_column_id
                && existing.fk_parent_column_id == link.fk_parent_column_id
        });
    if exists {
        return Ok(false);
    }

    let title = unique_title(
        &format!("{} List", target.title),
        columns.iter().map(|c| c.title.as_str()),
    );
    let order = columns.iter().map(|c| c.order).max().unwrap_or(0) + 1;
    let column = store
        .insert_column(NewColumn::link(source.id.clone(), title, link).with_order(order))
        .await?;

    debug!(
        table = %source.table_name,
        column = %column.title,
        junction = %junction.table_name,
        "inserted mm column"
    );
    Ok(true)
}

/// Hide or show the has-many column mirroring a junction's belongs-to link.
async fn set_has_many_hidden(
    store: &dyn MetaStore,
    belongs_to: &LinkToAnotherRecord,
    hidden: bool,
) -> SyncResult<()> {
    let columns = store.list_columns(&belongs_to.fk_related_model_id).await?;
    let mirror = columns.iter().find(|c| {
        c.link_of(RelationType::HasMany).is_some_and(|hm| {
            hm.fk_child_column_id == belongs_to.fk_child_column_id
                && hm.fk_parent_column_id == belongs_to.fk_parent_column_id
        })
    });

    if let Some(column) = mirror {
        if column.system != hidden {
            store.mark_system(&column.id, hidden).await?;
        }
    }
    Ok(())
}
