//! Scan orchestrator.
//!
//! Ties validation, the store query, the evaluator and the disposition
//! executor into one invocation, then hands non-empty outcomes to the
//! transient cache and the notification channel.
//!
//! # Flow
//!
//! ```text
//! validate ──✗──▶ ScanError::Validation   (store never queried)
//!    │
//! query store ──✗──▶ ScanError::Unexpected
//!    │
//! recheck each item with filter::matches
//!    │
//! execute disposition (skipped on dry run)
//!    │
//! changes? ──▶ flush store ──✗──▶ ScanError::Unexpected
//!    │             │
//!    │        cache + notify   (failures logged, never fatal)
//!    │
//! ScanRun
//! ```
//!
//! Collaborators are passed in at construction; nothing here is global.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CachedResult, DEFAULT_TTL_HOURS, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::content::ContentId;
use crate::criteria::{FilterCriteria, RawScanRequest, ValidationErrors};
use crate::disposition::{self, DispositionResult};
use crate::filter;
use crate::notify::{Notification, Notifier};
use crate::store::{ContentStore, StoreError, StoreQuery};
use crate::types::{DispositionRule, TriggeredBy};

/// Recipient used when none is configured
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";

/// Why a scan did not run to completion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Criteria rejected before any store access
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The store failed outside of a per-item transition
    #[error("unexpected store failure: {0}")]
    Unexpected(StoreError),
}

/// Record of one scan invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRun {
    pub criteria: FilterCriteria,
    pub rule: DispositionRule,
    pub triggered_by: TriggeredBy,
    pub dry_run: bool,
    /// Items that passed the evaluator, in store order
    pub matched_ids: Vec<ContentId>,
    pub result: DispositionResult,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Runs maintenance scans against one content store
pub struct ScanOrchestrator<S> {
    store: S,
    notifier: Box<dyn Notifier>,
    cache: Box<dyn ResultCache>,
    clock: Box<dyn Clock>,
    rule: DispositionRule,
    cache_ttl: Duration,
    admin_email: String,
    dry_run: bool,
}

impl<S: ContentStore> ScanOrchestrator<S> {
    pub fn new(
        store: S,
        notifier: impl Notifier + 'static,
        cache: impl ResultCache + 'static,
    ) -> Self {
        Self {
            store,
            notifier: Box::new(notifier),
            cache: Box::new(cache),
            clock: Box::new(SystemClock),
            rule: DispositionRule::default(),
            cache_ttl: Duration::hours(DEFAULT_TTL_HOURS),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            dry_run: false,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_rule(mut self, rule: DispositionRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = email.into();
        self
    }

    /// Report matches without changing anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse an untyped request and run it
    pub fn scan_request(
        &mut self,
        request: &RawScanRequest,
        triggered_by: TriggeredBy,
    ) -> Result<ScanRun, ScanError> {
        let criteria = request.parse(&self.store).inspect_err(|errors| {
            info!(%triggered_by, details = ?errors.details(), "scan request rejected");
        })?;
        self.execute(criteria, triggered_by)
    }

    /// Validate the criteria and run a scan
    pub fn run_scan(
        &mut self,
        criteria: &FilterCriteria,
        triggered_by: TriggeredBy,
    ) -> Result<ScanRun, ScanError> {
        criteria.validate(&self.store).inspect_err(|errors| {
            info!(%triggered_by, details = ?errors.details(), "scan criteria rejected");
        })?;
        self.execute(criteria.clone(), triggered_by)
    }

    /// Runs already-validated criteria
    fn execute(
        &mut self,
        criteria: FilterCriteria,
        triggered_by: TriggeredBy,
    ) -> Result<ScanRun, ScanError> {
        let started_at = self.clock.now();
        info!(
            %triggered_by,
            rule = %self.rule,
            dry_run = self.dry_run,
            types = ?criteria.content_types,
            age = criteria.age_threshold_days,
            engagement = criteria.engagement_threshold,
            "starting maintenance scan"
        );

        let query = StoreQuery {
            content_types: criteria.content_types.clone(),
            category_ids: criteria.category_ids.clone(),
            published_before: criteria.published_before(started_at),
            engagement_below: criteria.engagement_threshold,
        };

        let candidates = self.store.query(&query).map_err(|err| {
            error!(error = %err, "content store query failed");
            ScanError::Unexpected(err)
        })?;
        let candidate_count = candidates.len();

        let (_keep, act_on) = filter::partition(candidates, &criteria, started_at);
        let matched_ids: Vec<ContentId> = act_on.iter().map(|item| item.id).collect();
        debug!(
            candidates = candidate_count,
            matched = matched_ids.len(),
            "evaluated store results"
        );

        let result = if self.dry_run {
            DispositionResult::default()
        } else {
            disposition::execute(&mut self.store, &matched_ids, self.rule)
        };

        if result.has_changes() {
            // Nothing is reported until the store has made the changes durable
            self.store.flush().map_err(|err| {
                error!(error = %err, "content store flush failed, result not published");
                ScanError::Unexpected(err)
            })?;
            self.publish(&result, triggered_by, started_at);
        }

        let completed_at = self.clock.now();
        info!(
            matched = matched_ids.len(),
            archived = result.archived_ids.len(),
            deleted = result.deleted_ids.len(),
            failed = result.failed_ids.len(),
            "maintenance scan finished"
        );

        Ok(ScanRun {
            criteria,
            rule: self.rule,
            triggered_by,
            dry_run: self.dry_run,
            matched_ids,
            result,
            started_at,
            completed_at,
        })
    }

    /// Cache and announce a result. Mutations already happened, so
    /// failures here are logged rather than returned.
    fn publish(&self, result: &DispositionResult, triggered_by: TriggeredBy, now: DateTime<Utc>) {
        let entry = CachedResult::new(result.clone(), triggered_by, now, self.cache_ttl);
        if let Err(err) = self.cache.put(entry) {
            warn!(error = %err, "failed to cache maintenance result");
        }

        let notification = Notification::maintenance_report(&self.admin_email, result);
        if let Err(err) = self.notifier.notify(&notification) {
            warn!(error = %err, "failed to send maintenance notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryResultCache;
    use crate::clock::FixedClock;
    use crate::content::ContentItem;
    use crate::criteria::CriteriaError;
    use crate::notify::OutboxNotifier;
    use crate::store::MemoryStore;
    use crate::types::{ContentStatus, TransitionKind};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_content_types(["post", "page"])
            .with_categories([1, 2])
            .with_items([
                ContentItem::new(10, "post", now() - Duration::days(40)).with_engagement(2, 1),
                ContentItem::new(11, "post", now() - Duration::days(40)).with_engagement(90, 90),
                ContentItem::new(12, "post", now() - Duration::days(5)).with_engagement(0, 0),
                ContentItem::new(13, "page", now() - Duration::days(400)).with_engagement(1, 1),
            ])
    }

    fn orchestrator(
        store: MemoryStore,
    ) -> (ScanOrchestrator<MemoryStore>, OutboxNotifier, MemoryResultCache) {
        let outbox = OutboxNotifier::new();
        let cache = MemoryResultCache::new();
        let orchestrator = ScanOrchestrator::new(store, outbox.clone(), cache.clone())
            .with_clock(FixedClock(now()))
            .with_admin_email("ops@example.com");
        (orchestrator, outbox, cache)
    }

    #[test]
    fn test_stale_post_is_deleted_once() {
        let (mut orch, outbox, cache) = orchestrator(store());
        let run = orch
            .run_scan(&FilterCriteria::new(["post"], 30, 10), TriggeredBy::Manual)
            .unwrap();

        assert_eq!(run.matched_ids, vec![10]);
        assert_eq!(run.result.deleted_ids, vec![10]);
        assert!(run.result.archived_ids.is_empty());
        assert!(orch.store().get(10).is_none());
        assert!(orch.store().get(11).is_some());

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].body, "Maintenance results: 0 posts archived, 1 posts deleted.");

        let cached = cache.latest(now()).unwrap().unwrap();
        assert_eq!(cached.result, run.result);
        assert_eq!(cached.expires_at, now() + Duration::hours(12));
    }

    #[test]
    fn test_validation_failure_never_touches_store() {
        let mut store = store();
        store.set_outage("would fail if queried");
        let (mut orch, outbox, _) = orchestrator(store);

        let err = orch
            .run_scan(&FilterCriteria::new(["nope"], -1, 10), TriggeredBy::Api)
            .unwrap_err();
        let ScanError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.contains(&CriteriaError::UnknownContentType("nope".into())));
        assert!(errors.contains(&CriteriaError::InvalidAgeThreshold("-1".into())));
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn test_no_matches_means_no_side_effects() {
        let (mut orch, outbox, cache) = orchestrator(store());
        let run = orch
            .run_scan(&FilterCriteria::new(["post"], 1000, 10), TriggeredBy::Scheduled)
            .unwrap();
        assert!(run.matched_ids.is_empty());
        assert_eq!(run.result, DispositionResult::default());
        assert!(outbox.sent().is_empty());
        assert!(cache.latest(now()).unwrap().is_none());
    }

    #[test]
    fn test_store_outage_is_unexpected() {
        let mut store = store();
        store.set_outage("connection refused");
        let (mut orch, _, _) = orchestrator(store);
        let err = orch
            .run_scan(&FilterCriteria::new(["post"], 30, 10), TriggeredBy::Api)
            .unwrap_err();
        assert_eq!(
            err,
            ScanError::Unexpected(StoreError::Unavailable("connection refused".into()))
        );
    }

    #[test]
    fn test_unpersisted_changes_are_never_published() {
        let dir = tempfile::tempdir().unwrap();
        let store = store().persist_to(dir.path().join("missing").join("content.json"));
        let (mut orch, outbox, cache) = orchestrator(store);

        let err = orch
            .run_scan(&FilterCriteria::new(["post"], 30, 10), TriggeredBy::Manual)
            .unwrap_err();
        assert!(matches!(err, ScanError::Unexpected(StoreError::Persist(_))));
        assert!(outbox.sent().is_empty());
        assert!(cache.latest(now()).unwrap().is_none());
    }

    #[test]
    fn test_huge_age_threshold_matches_nothing() {
        let (mut orch, outbox, _) = orchestrator(store());
        let run = orch
            .run_scan(&FilterCriteria::new(["post", "page"], i64::MAX, 10), TriggeredBy::Api)
            .unwrap();
        assert!(run.matched_ids.is_empty());
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn test_evaluator_rechecks_store_prefilter() {
        // Published 30 days and 6 hours ago: before the store cutoff but only
        // 30 whole days old, so not strictly older than the threshold
        let store = MemoryStore::new().with_items([ContentItem::new(
            1,
            "post",
            now() - Duration::days(30) - Duration::hours(6),
        )]);
        let (mut orch, _, _) = orchestrator(store);
        let run = orch
            .run_scan(&FilterCriteria::new(["post"], 30, 10), TriggeredBy::Manual)
            .unwrap();
        assert!(run.matched_ids.is_empty());
        assert!(orch.store().get(1).is_some());
    }

    #[test]
    fn test_dry_run_reports_without_mutation() {
        let (orch, outbox, _) = orchestrator(store());
        let mut orch = orch.with_dry_run(true);
        let run = orch
            .run_scan(&FilterCriteria::new(["post", "page"], 30, 10), TriggeredBy::Manual)
            .unwrap();
        assert!(run.dry_run);
        assert_eq!(run.matched_ids, vec![10, 13]);
        assert_eq!(run.result, DispositionResult::default());
        assert_eq!(orch.store().len(), 4);
        assert!(outbox.sent().is_empty());
    }

    #[test]
    fn test_archive_rule_and_rejections() {
        let mut store = store();
        store.reject(13, TransitionKind::Archive);
        let (orch, _, _) = orchestrator(store);
        let mut orch = orch.with_rule(DispositionRule::Archive);
        let run = orch
            .run_scan(&FilterCriteria::new(["post", "page"], 30, 10), TriggeredBy::Manual)
            .unwrap();
        assert_eq!(run.result.archived_ids, vec![10]);
        assert_eq!(run.result.failed_ids, vec![13]);
        assert_eq!(orch.store().get(10).unwrap().status, ContentStatus::Archived);
    }

    #[test]
    fn test_scan_request_parses_raw_body() {
        let (mut orch, _, _) = orchestrator(store());
        let body = serde_json::json!({
            "post_types": ["page"],
            "categories": [],
            "age_threshold": "365",
            "engagement_threshold": 10
        });
        let run = orch
            .scan_request(&RawScanRequest::from_body(&body), TriggeredBy::Api)
            .unwrap();
        assert_eq!(run.triggered_by, TriggeredBy::Api);
        assert_eq!(run.result.deleted_ids, vec![13]);
    }
}
