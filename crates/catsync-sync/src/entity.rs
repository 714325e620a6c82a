//! Field-diff reconciliation of top-level entities
//!
//! Applies one batch of incoming records of a single kind inside the
//! caller's transaction. Each record is written under its own savepoint so
//! that a failing write only discards that record.

use serde_json::Value;
use tracing::{debug, error, warn};

use catsync_core::domain::payload::{decode, read_id};
use catsync_core::domain::{ChangeRecord, EntityRef, IncomingRecord, RecordError};
use catsync_core::ports::ICatalogTransaction;

use crate::targets::ReconcileTarget;
use crate::SyncError;

/// An incoming record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Natural key, when it could still be read
    pub key: Option<String>,
    pub error: RecordError,
}

/// One validated record or the reason it was rejected
pub type Incoming<T> = Result<T, Rejected>;

/// Validates every entry of a list-shaped section
///
/// `id_field` is read separately so that a rejected entry can still be
/// named in the report.
pub fn decode_section<T: IncomingRecord>(raw: &[Value], id_field: &'static str) -> Vec<Incoming<T>> {
    raw.iter()
        .map(|entry| {
            decode::<T>(entry).map_err(|error| Rejected {
                key: read_id(entry, id_field).ok().map(|id| id.to_string()),
                error,
            })
        })
        .collect()
}

/// Generic reconciler for categories, marks and the project rows
pub struct EntityReconciler;

impl EntityReconciler {
    /// Reconciles `incoming` against the rows visible through `tx`
    ///
    /// Per record: a rejected record yields one warning; an absent key is
    /// inserted (one `Added` record); a present key is diffed and updated
    /// (one `Updated` record per differing field, nothing when equal); a
    /// failed write is rolled back to the record's savepoint and yields one
    /// error record.
    ///
    /// # Errors
    /// Only savepoint bookkeeping failures abort the batch.
    pub async fn reconcile<T: ReconcileTarget>(
        tx: &mut dyn ICatalogTransaction,
        incoming: Vec<Incoming<T>>,
    ) -> Result<Vec<ChangeRecord>, SyncError> {
        let mut records = Vec::new();

        for item in incoming {
            let record = match item {
                Ok(record) => record,
                Err(rejected) => {
                    let entity = match rejected.key {
                        Some(key) => EntityRef::new(T::ENTITY, key),
                        None => EntityRef::unkeyed(T::ENTITY),
                    };
                    warn!(entity = %entity, error = %rejected.error, "Skipping invalid record");
                    records.push(ChangeRecord::warning(entity, rejected.error.to_string()));
                    continue;
                }
            };

            let entity = EntityRef::new(T::ENTITY, record.key());
            tx.savepoint().await?;
            match apply(tx, &record, &entity).await {
                Ok(changes) => {
                    tx.release_savepoint().await?;
                    records.extend(changes);
                }
                Err(err) => {
                    tx.rollback_to_savepoint().await?;
                    error!(entity = %entity, error = %format!("{err:#}"), "Record write failed");
                    records.push(ChangeRecord::error(entity, format!("{err:#}")));
                }
            }
        }

        Ok(records)
    }
}

async fn apply<T: ReconcileTarget>(
    tx: &mut dyn ICatalogTransaction,
    record: &T,
    entity: &EntityRef,
) -> anyhow::Result<Vec<ChangeRecord>> {
    match record.find(tx).await? {
        Some(existing) => {
            let changes = existing.diff(record);
            if changes.is_empty() {
                return Ok(Vec::new());
            }
            record.update(tx).await?;
            debug!(entity = %entity, fields = changes.len(), "Updated");
            Ok(changes
                .into_iter()
                .map(|change| ChangeRecord::updated(entity.clone(), change))
                .collect())
        }
        None => {
            record.insert(tx).await?;
            debug!(entity = %entity, "Inserted");
            Ok(vec![ChangeRecord::added(entity.clone())])
        }
    }
}
