//! Content items as read from the external store.
//!
//! The engine never owns these records. It reads their attributes to decide
//! whether they are stale and asks the store to transition them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ContentStatus;

/// Store-assigned identifier of a content item
pub type ContentId = u64;

/// Store-assigned identifier of a category term
pub type CategoryId = u64;

/// A post, page or custom content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    /// Type identifier such as `post` or `page`
    pub content_type: String,
    #[serde(default)]
    pub title: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    #[serde(default)]
    pub status: ContentStatus,
    /// Written by the scan stamping command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// Create a published item with zero engagement and no categories
    pub fn new(id: ContentId, content_type: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            title: String::new(),
            published_at,
            view_count: 0,
            comment_count: 0,
            category_ids: Vec::new(),
            status: ContentStatus::Published,
            last_scanned_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_engagement(mut self, view_count: u64, comment_count: u64) -> Self {
        self.view_count = view_count;
        self.comment_count = comment_count;
        self
    }

    pub fn with_categories(mut self, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids = category_ids.into_iter().collect();
        self
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    /// Whole days elapsed since publication, negative for future-dated items
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.published_at).num_days()
    }

    pub fn in_any_category(&self, categories: &[CategoryId]) -> bool {
        self.category_ids.iter().any(|id| categories.contains(id))
    }
}
