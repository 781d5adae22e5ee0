//! Notification channel for maintenance summaries.
//!
//! The engine only builds the message; delivery is up to the `Notifier`.
//! Shipped implementations log the summary, append it to a mail spool
//! file for an external mailer, or keep it in memory.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::disposition::DispositionResult;
use crate::error::{PostsweepError, Result};

pub const REPORT_SUBJECT: &str = "Maintenance Report";

/// A message addressed to the site administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Summary of a disposition result, counts only
    pub fn maintenance_report(to: impl Into<String>, result: &DispositionResult) -> Self {
        Self {
            to: to.into(),
            subject: REPORT_SUBJECT.to_string(),
            body: format!(
                "Maintenance results: {} posts archived, {} posts deleted.",
                result.archived_ids.len(),
                result.deleted_ids.len()
            ),
        }
    }
}

/// Delivery channel for notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, notification: &Notification) -> Result<()> {
        (**self).notify(notification)
    }
}

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "{}",
            notification.body
        );
        Ok(())
    }
}

/// Appends notifications as JSON lines to a spool file
#[derive(Debug, Clone)]
pub struct SpoolNotifier {
    path: PathBuf,
}

impl SpoolNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Notifier for SpoolNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        let line = serde_json::to_string(notification)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Keeps notifications in memory.
///
/// Clones share the same outbox, so a caller can keep a handle after
/// passing one to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OutboxNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .map_err(|e| PostsweepError::notify(format!("outbox lock poisoned: {e}")))?
            .push(notification.clone());
        Ok(())
    }
}
