//! postsweep library
//!
//! Finds published content that is both old and rarely engaged with, then
//! archives or deletes it. The binary wraps this in a CLI; embedders can
//! drive [`ScanOrchestrator`] or [`handle_scan_request`] directly against
//! their own [`ContentStore`].

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config_file;
pub mod content;
pub mod criteria;
pub mod disposition;
pub mod error;
pub mod filter;
pub mod notify;
pub mod scan;
pub mod stamp;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use api::{ApiResponse, handle_scan_request};
pub use auth::{AllowAll, AuthorizationError, AuthorizationPolicy, CapabilityPolicy, Principal};
pub use cache::{CachedResult, FileResultCache, MemoryResultCache, ResultCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config_file::{MaintenanceConfig, ScheduleConfig};
pub use content::{CategoryId, ContentId, ContentItem};
pub use criteria::{CriteriaError, FilterCriteria, RawScanRequest, ValidationErrors};
pub use disposition::DispositionResult;
pub use error::PostsweepError;
pub use notify::{LogNotifier, Notification, Notifier, OutboxNotifier, SpoolNotifier};
pub use scan::{ScanError, ScanOrchestrator, ScanRun};
pub use stamp::{StampQuery, StampReport, stamp_last_scan};
pub use store::{ContentStore, ListQuery, MemoryStore, StoreError, StoreQuery};
pub use types::{ContentStatus, DispositionRule, TransitionKind, TriggeredBy};
