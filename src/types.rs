//! Type-safe enums shared across the maintenance engine
//!
//! String identifiers that cross the store, config and CLI boundaries are
//! modeled as enums so that typos are caught at parse time instead of
//! silently matching nothing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of a content item as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    #[default]
    Published,
    Archived,
    /// Removed from the store; only seen on tombstoned records
    Deleted,
}

/// What started a scan run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggeredBy {
    /// External cron-equivalent invoking the configured schedule
    Scheduled,
    /// Operator running the CLI directly
    #[default]
    Manual,
    /// Invocation contract request (HTTP or equivalent)
    Api,
}

/// Action applied to every item that matches the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DispositionRule {
    /// Move matched items to the archived status and stop there
    Archive,
    /// Archive first, then remove the item from the store
    #[default]
    Delete,
}

impl DispositionRule {
    /// Returns true if the rule removes items after archiving them
    pub fn removes_items(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

/// A single status transition requested from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransitionKind {
    Archive,
    Delete,
}
