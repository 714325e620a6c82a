//! Product reconciliation
//!
//! One call handles one product entry inside the transaction the
//! orchestrator opened for it:
//!
//! 1. Validate the entry and resolve its timestamps.
//! 2. Insert the product, or diff and update its scalar fields.
//! 3. Rebuild the category and mark associations (link-replace).
//! 4. Diff every owned child collection against the stored one
//!    (delete by absence, update in place, insert when new).
//!
//! Nested sections whose key is absent from the entry are left untouched.
//! Each collection runs under its own savepoint, and each item inside it
//! under a nested one.

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, warn};

use catsync_core::domain::payload::{check_required, decode, read_id, Timestamp};
use catsync_core::domain::{
    Category, ChangeRecord, ChildKind, ChildRecord, EntityKind, EntityRef, FieldDiff,
    IncomingProduct, LinkKind, Mark,
};
use catsync_core::ports::ICatalogTransaction;

use crate::SyncError;

/// Reconciler for product entries and their nested collections
pub struct ProductReconciler;

impl ProductReconciler {
    /// Reconciles one raw product entry
    ///
    /// # Errors
    /// Returns an error only when a write outside every savepoint fails
    /// (the product row itself, or savepoint bookkeeping). The caller then
    /// discards the product's transaction.
    pub async fn reconcile(
        tx: &mut dyn ICatalogTransaction,
        raw: &Value,
    ) -> Result<Vec<ChangeRecord>, SyncError> {
        let incoming = match IncomingProduct::decode(raw) {
            Ok(product) => product,
            Err(err) => {
                let entity = product_ref(read_id(raw, "Product_ID").ok());
                warn!(entity = %entity, error = %err, "Skipping invalid product");
                return Ok(vec![ChangeRecord::warning(entity, err.to_string())]);
            }
        };

        let product_id = incoming.id;
        let entity = EntityRef::new(EntityKind::Product, product_id);
        let mut records = Vec::new();

        let existing = tx
            .get_product(product_id)
            .await
            .with_context(|| format!("Failed to load product {product_id}"))?;

        let now = Utc::now();
        match existing {
            None => {
                let created_at = resolve(incoming.created_at(), now, &entity, &mut records);
                let updated_at = resolve(incoming.updated_at(), now, &entity, &mut records);
                tx.insert_product(&incoming.to_product(created_at, updated_at))
                    .await
                    .with_context(|| format!("Failed to insert product {product_id}"))?;
                debug!(product_id, "Inserted product");
                records.push(ChangeRecord::added(entity.clone()));
            }
            Some(stored) => {
                // created_at never changes once stored
                let updated_at = resolve(incoming.updated_at(), now, &entity, &mut records);
                let candidate = incoming.to_product(stored.created_at, updated_at);
                let changes = stored.diff(&candidate);
                if !changes.is_empty() {
                    tx.update_product(&candidate)
                        .await
                        .with_context(|| format!("Failed to update product {product_id}"))?;
                    records.extend(
                        changes
                            .into_iter()
                            .map(|change| ChangeRecord::updated(entity.clone(), change)),
                    );
                }
            }
        }

        for kind in LinkKind::ALL {
            let Some(entries) = incoming.section(kind.section_key()) else {
                continue;
            };
            tx.savepoint().await?;
            match replace_links(tx, product_id, kind, entries).await {
                Ok(lines) => {
                    tx.release_savepoint().await?;
                    records.extend(lines);
                }
                Err(err) => {
                    tx.rollback_to_savepoint().await?;
                    records.push(collection_failure(&entity, kind.section_key(), err));
                }
            }
        }

        for kind in ChildKind::ALL {
            let Some(entries) = incoming.section(kind.section_key()) else {
                continue;
            };
            tx.savepoint().await?;
            match diff_children(tx, product_id, kind, entries).await {
                Ok(lines) => {
                    tx.release_savepoint().await?;
                    records.extend(lines);
                }
                Err(err) => {
                    tx.rollback_to_savepoint().await?;
                    records.push(collection_failure(&entity, kind.section_key(), err));
                }
            }
        }

        Ok(records)
    }
}

fn product_ref(id: Option<i64>) -> EntityRef {
    match id {
        Some(id) => EntityRef::new(EntityKind::Product, id),
        None => EntityRef::unkeyed(EntityKind::Product),
    }
}

/// Picks the parsed timestamp, or `fallback` with one warning record
fn resolve(
    timestamp: Timestamp,
    fallback: DateTime<Utc>,
    entity: &EntityRef,
    records: &mut Vec<ChangeRecord>,
) -> DateTime<Utc> {
    match timestamp {
        Timestamp::Parsed(ts) => ts,
        Timestamp::Fallback(reason) => {
            warn!(entity = %entity, %reason, "Using fallback timestamp");
            records.push(ChangeRecord::warning(
                entity.clone(),
                format!("{reason}; using {}", fallback.to_rfc3339()),
            ));
            fallback
        }
    }
}

fn collection_failure(entity: &EntityRef, section: &str, err: anyhow::Error) -> ChangeRecord {
    error!(entity = %entity, section, error = %format!("{err:#}"), "Nested collection failed");
    ChangeRecord::error(entity.clone(), format!("{section}: {err:#}"))
}

// ============================================================================
// Link-replace
// ============================================================================

/// Rebuilds one association set from `entries`
///
/// Linked entities missing from their own table are created from the
/// embedded payload, which then has to carry the full required set. One
/// `Linked` record is emitted only when the sorted ID set changed.
async fn replace_links(
    tx: &mut dyn ICatalogTransaction,
    product_id: i64,
    kind: LinkKind,
    entries: &[Value],
) -> anyhow::Result<Vec<ChangeRecord>> {
    let mut records = Vec::new();
    let before = tx.linked_ids(kind, product_id).await?;
    tx.clear_links(kind, product_id).await?;

    for entry in entries {
        let target_id = match read_id(entry, kind.id_field()) {
            Ok(id) => id,
            Err(err) => {
                let entity = EntityRef::unkeyed(kind.entity_kind()).in_product(product_id);
                warn!(entity = %entity, error = %err, "Skipping link entry");
                records.push(ChangeRecord::warning(entity, err.to_string()));
                continue;
            }
        };
        let entity = EntityRef::new(kind.entity_kind(), target_id);

        tx.savepoint().await?;
        match link_one(tx, product_id, kind, target_id, entry, &entity).await {
            Ok(lines) => {
                tx.release_savepoint().await?;
                records.extend(lines);
            }
            Err(err) => {
                tx.rollback_to_savepoint().await?;
                error!(entity = %entity, product_id, error = %format!("{err:#}"), "Link failed");
                records.push(ChangeRecord::error(
                    entity.in_product(product_id),
                    format!("{err:#}"),
                ));
            }
        }
    }

    let after = tx.linked_ids(kind, product_id).await?;
    if before != after {
        records.push(ChangeRecord::linked(
            EntityRef::new(EntityKind::Product, product_id),
            kind.section_key(),
            &before,
            &after,
        ));
    }
    Ok(records)
}

async fn link_one(
    tx: &mut dyn ICatalogTransaction,
    product_id: i64,
    kind: LinkKind,
    target_id: i64,
    entry: &Value,
    entity: &EntityRef,
) -> anyhow::Result<Vec<ChangeRecord>> {
    let mut records = Vec::new();

    let exists = match kind {
        LinkKind::Category => tx.get_category(target_id).await?.is_some(),
        LinkKind::Mark => tx.get_mark(target_id).await?.is_some(),
    };

    if !exists {
        let created = match create_linked(tx, kind, entry).await? {
            Ok(()) => true,
            Err(reason) => {
                warn!(entity = %entity, %reason, "Cannot create linked entity");
                records.push(ChangeRecord::warning(entity.clone(), reason));
                false
            }
        };
        if !created {
            return Ok(records);
        }
        debug!(entity = %entity, "Created linked entity");
        records.push(ChangeRecord::added(entity.clone()));
    }

    tx.add_link(kind, product_id, target_id)
        .await
        .with_context(|| format!("Failed to link {entity} to product {product_id}"))?;
    Ok(records)
}

/// Inserts a linked entity from its embedded payload
///
/// The inner `Err` is a validation failure (skip with a warning); the outer
/// one is a storage failure.
async fn create_linked(
    tx: &mut dyn ICatalogTransaction,
    kind: LinkKind,
    entry: &Value,
) -> anyhow::Result<Result<(), String>> {
    if let Err(err) = check_required(entry, kind.required_fields()) {
        return Ok(Err(err.to_string()));
    }
    match kind {
        LinkKind::Category => match decode::<Category>(entry) {
            Ok(category) => tx.insert_category(&category).await?,
            Err(err) => return Ok(Err(err.to_string())),
        },
        LinkKind::Mark => match decode::<Mark>(entry) {
            Ok(mark) => tx.insert_mark(&mark).await?,
            Err(err) => return Ok(Err(err.to_string())),
        },
    }
    Ok(Ok(()))
}

// ============================================================================
// Owned-set diff
// ============================================================================

/// Brings one owned collection in line with `entries`
///
/// An entry whose ID can be read keeps its stored row alive even when the
/// rest of it is malformed.
async fn diff_children(
    tx: &mut dyn ICatalogTransaction,
    product_id: i64,
    kind: ChildKind,
    entries: &[Value],
) -> anyhow::Result<Vec<ChangeRecord>> {
    let mut records = Vec::new();

    let mut current: HashMap<i64, ChildRecord> = tx
        .load_children(kind, product_id)
        .await?
        .into_iter()
        .map(|child| (child.id(), child))
        .collect();

    let incoming_ids: HashSet<i64> = entries
        .iter()
        .filter_map(|entry| read_id(entry, kind.id_field()).ok())
        .collect();

    let mut stale: Vec<i64> = current
        .keys()
        .copied()
        .filter(|id| !incoming_ids.contains(id))
        .collect();
    stale.sort_unstable();

    for id in stale {
        tx.delete_child(kind, id)
            .await
            .with_context(|| format!("Failed to delete {kind} #{id}"))?;
        current.remove(&id);
        records.push(ChangeRecord::deleted(
            EntityRef::new(kind.entity_kind(), id).in_product(product_id),
        ));
    }

    for entry in entries {
        let child = match ChildRecord::decode(kind, entry) {
            Ok(child) => child,
            Err(err) => {
                let entity = match read_id(entry, kind.id_field()) {
                    Ok(id) => EntityRef::new(kind.entity_kind(), id),
                    Err(_) => EntityRef::unkeyed(kind.entity_kind()),
                }
                .in_product(product_id);
                warn!(entity = %entity, error = %err, "Skipping invalid child");
                records.push(ChangeRecord::warning(entity, err.to_string()));
                continue;
            }
        };

        let entity = EntityRef::new(kind.entity_kind(), child.id()).in_product(product_id);
        tx.savepoint().await?;
        match apply_child(tx, product_id, current.get(&child.id()), &child, &entity).await {
            Ok(lines) => {
                tx.release_savepoint().await?;
                records.extend(lines);
                // later duplicates of the same ID diff against this version
                current.insert(child.id(), child);
            }
            Err(err) => {
                tx.rollback_to_savepoint().await?;
                error!(entity = %entity, error = %format!("{err:#}"), "Child write failed");
                records.push(ChangeRecord::error(entity, format!("{err:#}")));
            }
        }
    }

    Ok(records)
}

async fn apply_child(
    tx: &mut dyn ICatalogTransaction,
    product_id: i64,
    stored: Option<&ChildRecord>,
    child: &ChildRecord,
    entity: &EntityRef,
) -> anyhow::Result<Vec<ChangeRecord>> {
    match stored {
        Some(stored) => {
            let changes = stored.diff(child);
            if !changes.is_empty() {
                tx.update_child(child).await?;
            }
            Ok(changes
                .into_iter()
                .map(|change| ChangeRecord::updated(entity.clone(), change))
                .collect())
        }
        None => {
            tx.insert_child(product_id, child).await?;
            Ok(vec![ChangeRecord::added(entity.clone())])
        }
    }
}
