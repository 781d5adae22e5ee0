//! Content store abstraction and the in-memory reference store.
//!
//! The engine only talks to content through `ContentStore`. `MemoryStore`
//! backs the CLI (persisted as a JSON file) and the test suite.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::{CategoryId, ContentId, ContentItem};
use crate::filter::below;
use crate::types::{ContentStatus, TransitionKind};

/// Errors reported by a content store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store refused a status transition for one item
    #[error("{kind} of item {id} rejected: {reason}")]
    Transition {
        kind: TransitionKind,
        id: ContentId,
        reason: String,
    },

    #[error("item {0} not found")]
    NotFound(ContentId),

    /// A query could not be executed
    #[error("query failed: {0}")]
    Query(String),

    /// The store could not be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Applied transitions could not be made durable
    #[error("failed to persist store: {0}")]
    Persist(String),
}

impl StoreError {
    pub fn transition(kind: TransitionKind, id: ContentId, reason: impl Into<String>) -> Self {
        Self::Transition {
            kind,
            id,
            reason: reason.into(),
        }
    }
}

/// Store-level pre-filter for a maintenance scan.
///
/// Stores may apply these looser than the evaluator does; the orchestrator
/// rechecks every returned item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub content_types: Vec<String>,
    /// Empty means any category
    pub category_ids: Vec<CategoryId>,
    pub published_before: DateTime<Utc>,
    /// Items with views OR comments below this value
    pub engagement_below: i64,
}

/// Listing query used by scan stamping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub content_types: Vec<String>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    /// Restrict to these ids when set
    pub ids: Option<Vec<ContentId>>,
}

/// Access to the external content store.
///
/// Query results come back in the store's natural order; the engine
/// preserves that order in every report.
pub trait ContentStore {
    fn content_type_exists(&self, content_type: &str) -> bool;

    fn category_exists(&self, id: CategoryId) -> bool;

    /// Published items matching the pre-filter
    fn query(&self, query: &StoreQuery) -> Result<Vec<ContentItem>, StoreError>;

    /// Published items matching a listing query
    fn list(&self, query: &ListQuery) -> Result<Vec<ContentItem>, StoreError>;

    /// Move an item to the archived status
    fn archive(&mut self, id: ContentId) -> Result<(), StoreError>;

    /// Permanently remove an item
    fn delete(&mut self, id: ContentId) -> Result<(), StoreError>;

    /// Record when an item was last scanned
    fn mark_scanned(&mut self, id: ContentId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Make every transition applied so far durable.
    ///
    /// Called once per batch that changed something, before the outcome is
    /// reported anywhere. Stores that write through on every call keep the
    /// default no-op.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory content store with JSON file persistence.
///
/// Item order is insertion order, which is the store's query order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    content_types: BTreeSet<String>,
    #[serde(default)]
    categories: BTreeSet<CategoryId>,
    #[serde(default)]
    items: Vec<ContentItem>,

    /// Transitions the store refuses per item (e.g. locked or protected content)
    #[serde(skip)]
    rejections: HashMap<ContentId, HashSet<TransitionKind>>,

    /// Set when every query should fail as if the backend were unreachable
    #[serde(skip)]
    outage: Option<String>,

    /// File that `flush` writes to
    #[serde(skip)]
    backing_file: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.content_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.categories.extend(ids);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = ContentItem>) -> Self {
        for item in items {
            self.insert(item);
        }
        self
    }

    /// Insert or replace an item, registering its type and categories
    pub fn insert(&mut self, item: ContentItem) {
        self.content_types.insert(item.content_type.clone());
        self.categories.extend(item.category_ids.iter().copied());
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Write the store to `path` on every `flush`
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.backing_file = Some(path.into());
        self
    }

    /// Make the store refuse a transition for one item
    pub fn reject(&mut self, id: ContentId, kind: TransitionKind) {
        self.rejections.entry(id).or_default().insert(kind);
    }

    /// Make every query fail until `restore` is called
    pub fn set_outage(&mut self, reason: impl Into<String>) {
        self.outage = Some(reason.into());
    }

    pub fn restore(&mut self) {
        self.outage = None;
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Load a store from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read content store from {:?}", path.as_ref()))?;

        let mut store: Self =
            serde_json::from_str(&content).context("Failed to parse content store JSON")?;

        // Types and categories referenced by items are always known
        let items = std::mem::take(&mut store.items);
        for item in items {
            store.insert(item);
        }

        Ok(store)
    }

    /// Save the store to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize content store to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write content store to {:?}", path.as_ref()))?;

        Ok(())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match &self.outage {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn check_allowed(&self, id: ContentId, kind: TransitionKind) -> Result<(), StoreError> {
        let rejected = self
            .rejections
            .get(&id)
            .is_some_and(|kinds| kinds.contains(&kind));
        if rejected {
            return Err(StoreError::transition(kind, id, "refused by store"));
        }
        Ok(())
    }

    fn published(&self) -> impl Iterator<Item = &ContentItem> {
        self.items
            .iter()
            .filter(|item| item.status == ContentStatus::Published)
    }
}

impl ContentStore for MemoryStore {
    fn content_type_exists(&self, content_type: &str) -> bool {
        self.content_types.contains(content_type)
    }

    fn category_exists(&self, id: CategoryId) -> bool {
        self.categories.contains(&id)
    }

    fn query(&self, query: &StoreQuery) -> Result<Vec<ContentItem>, StoreError> {
        self.check_available()?;
        Ok(self
            .published()
            .filter(|item| query.content_types.contains(&item.content_type))
            .filter(|item| {
                query.category_ids.is_empty() || item.in_any_category(&query.category_ids)
            })
            .filter(|item| item.published_at < query.published_before)
            .filter(|item| {
                below(item.view_count, query.engagement_below)
                    || below(item.comment_count, query.engagement_below)
            })
            .cloned()
            .collect())
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<ContentItem>, StoreError> {
        self.check_available()?;
        Ok(self
            .published()
            .filter(|item| query.content_types.contains(&item.content_type))
            .filter(|item| query.published_after.is_none_or(|after| item.published_at > after))
            .filter(|item| query.published_before.is_none_or(|before| item.published_at < before))
            .filter(|item| query.ids.as_ref().is_none_or(|ids| ids.contains(&item.id)))
            .cloned()
            .collect())
    }

    fn archive(&mut self, id: ContentId) -> Result<(), StoreError> {
        self.check_available()?;
        self.check_allowed(id, TransitionKind::Archive)?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.status = ContentStatus::Archived;
        Ok(())
    }

    fn delete(&mut self, id: ContentId) -> Result<(), StoreError> {
        self.check_available()?;
        self.check_allowed(id, TransitionKind::Delete)?;
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.items.remove(index);
        Ok(())
    }

    fn mark_scanned(&mut self, id: ContentId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_available()?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        item.last_scanned_at = Some(at);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let Some(path) = &self.backing_file else {
            return Ok(());
        };
        self.save_to_file(path)
            .map_err(|e| StoreError::Persist(format!("{e:#}")))
    }
}
