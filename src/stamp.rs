//! Scan stamping: record when published content was last looked at.
//!
//! Independent of the stale-content policy; it never archives or deletes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::content::ContentId;
use crate::store::{ContentStore, ListQuery, StoreError};

/// Which published items to stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampQuery {
    pub content_types: Vec<String>,
    /// Only items published after this date
    pub start_date: Option<NaiveDate>,
    /// Only items published before this date
    pub end_date: Option<NaiveDate>,
    pub ids: Option<Vec<ContentId>>,
}

impl Default for StampQuery {
    fn default() -> Self {
        Self {
            content_types: vec!["post".to_string()],
            start_date: None,
            end_date: None,
            ids: None,
        }
    }
}

impl StampQuery {
    fn to_list_query(&self) -> ListQuery {
        let midnight = |date: NaiveDate| date.and_time(chrono::NaiveTime::MIN).and_utc();
        ListQuery {
            content_types: self.content_types.clone(),
            published_after: self.start_date.map(midnight),
            published_before: self.end_date.map(midnight),
            ids: self.ids.clone(),
        }
    }
}

/// Outcome of a stamping run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampReport {
    /// Every item considered, in store order
    pub scanned_ids: Vec<ContentId>,
    /// Number of items whose stamp was written
    pub updated: usize,
    pub dry_run: bool,
}

/// Set `last_scanned_at = now` on every matching published item.
///
/// A dry run lists the items without writing anything.
pub fn stamp_last_scan<S: ContentStore + ?Sized>(
    store: &mut S,
    query: &StampQuery,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<StampReport, StoreError> {
    let items = store.list(&query.to_list_query())?;
    info!(found = items.len(), dry_run, "stamping scanned content");

    let mut report = StampReport {
        scanned_ids: Vec::with_capacity(items.len()),
        updated: 0,
        dry_run,
    };

    for item in items {
        debug!(id = item.id, title = %item.title, "scanning item");
        report.scanned_ids.push(item.id);
        if dry_run {
            continue;
        }
        store.mark_scanned(item.id, now)?;
        report.updated += 1;
    }

    if report.updated > 0 {
        store.flush()?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItem;
    use crate::store::MemoryStore;
    use crate::types::ContentStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new().with_items([
            ContentItem::new(1, "post", at(2023, 1, 15)),
            ContentItem::new(2, "post", at(2023, 7, 1)),
            ContentItem::new(3, "page", at(2023, 2, 1)),
            ContentItem::new(4, "post", at(2023, 3, 1)).with_status(ContentStatus::Draft),
        ])
    }

    #[test]
    fn test_stamps_published_posts_by_default() {
        let mut store = store();
        let report = stamp_last_scan(&mut store, &StampQuery::default(), now(), false).unwrap();
        assert_eq!(report.scanned_ids, vec![1, 2]);
        assert_eq!(report.updated, 2);
        assert_eq!(store.get(1).unwrap().last_scanned_at, Some(now()));
        assert!(store.get(4).unwrap().last_scanned_at.is_none());
    }

    #[test]
    fn test_date_range_and_ids() {
        let mut store = store();
        let query = StampQuery {
            content_types: vec!["post".into(), "page".into()],
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2023, 6, 30),
            ids: None,
        };
        let report = stamp_last_scan(&mut store, &query, now(), false).unwrap();
        assert_eq!(report.scanned_ids, vec![1, 3]);

        let query = StampQuery {
            ids: Some(vec![2]),
            ..StampQuery::default()
        };
        let report = stamp_last_scan(&mut store, &query, now(), false).unwrap();
        assert_eq!(report.scanned_ids, vec![2]);
    }

    #[test]
    fn test_stamps_are_flushed_to_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        let mut store = store().persist_to(&path);
        stamp_last_scan(&mut store, &StampQuery::default(), now(), false).unwrap();

        let reloaded = MemoryStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.get(2).unwrap().last_scanned_at, Some(now()));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store().persist_to(dir.path().join("missing").join("content.json"));
        let report = stamp_last_scan(&mut store, &StampQuery::default(), now(), true).unwrap();
        assert_eq!(report.scanned_ids, vec![1, 2]);
        assert_eq!(report.updated, 0);
        assert!(store.items().iter().all(|item| item.last_scanned_at.is_none()));
    }
}
