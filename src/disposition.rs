//! Disposition executor.
//!
//! Applies the configured rule to each matched item in order and records
//! exactly one outcome per item. Store rejections are captured here and
//! never propagated: one refused item does not stop the batch, and nothing
//! already applied is rolled back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::content::ContentId;
use crate::store::ContentStore;
use crate::types::DispositionRule;

/// Final outcome of a disposition batch.
///
/// The three id lists are pairwise disjoint and keep the order in which the
/// items were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionResult {
    /// Items left in the archived status
    pub archived_ids: Vec<ContentId>,
    /// Items removed from the store
    pub deleted_ids: Vec<ContentId>,
    /// Items whose archive transition was rejected
    pub failed_ids: Vec<ContentId>,
}

impl DispositionResult {
    /// Returns true if any item changed state
    pub fn has_changes(&self) -> bool {
        !self.archived_ids.is_empty() || !self.deleted_ids.is_empty()
    }

    pub fn total(&self) -> usize {
        self.archived_ids.len() + self.deleted_ids.len() + self.failed_ids.len()
    }
}

/// Apply `rule` to each id, in order.
///
/// With `Delete`, an item is archived first; if archiving is refused the
/// delete is not attempted and the item is recorded as failed. If the
/// delete is refused the item stays archived.
pub fn execute<S: ContentStore + ?Sized>(
    store: &mut S,
    ids: &[ContentId],
    rule: DispositionRule,
) -> DispositionResult {
    let mut result = DispositionResult::default();

    for &id in ids {
        if let Err(err) = store.archive(id) {
            warn!(id, error = %err, "archive rejected");
            result.failed_ids.push(id);
            continue;
        }
        debug!(id, "archived");

        if !rule.removes_items() {
            result.archived_ids.push(id);
            continue;
        }

        match store.delete(id) {
            Ok(()) => {
                debug!(id, "deleted");
                result.deleted_ids.push(id);
            }
            Err(err) => {
                warn!(id, error = %err, "delete rejected, item left archived");
                result.archived_ids.push(id);
            }
        }
    }

    result
}
