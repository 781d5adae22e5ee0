//! Caller authorization for triggering scans.
//!
//! The policy is supplied by whoever embeds the engine and is checked before
//! a scan runs.

use std::collections::BTreeSet;
use thiserror::Error;

/// Capability required by the default policy
pub const EDIT_POSTS: &str = "edit_posts";

/// The caller attempting to trigger a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub logged_in: bool,
    pub capabilities: BTreeSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(capabilities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            logged_in: true,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("missing capability: {0}")]
    MissingCapability(String),
}

/// Decides whether a principal may trigger a scan
pub trait AuthorizationPolicy: Send + Sync {
    fn authorize(&self, principal: &Principal) -> Result<(), AuthorizationError>;
}

/// Requires a logged-in principal holding one capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPolicy {
    capability: String,
}

impl CapabilityPolicy {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
        }
    }
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self::new(EDIT_POSTS)
    }
}

impl AuthorizationPolicy for CapabilityPolicy {
    fn authorize(&self, principal: &Principal) -> Result<(), AuthorizationError> {
        if !principal.logged_in {
            return Err(AuthorizationError::NotLoggedIn);
        }
        if !principal.can(&self.capability) {
            return Err(AuthorizationError::MissingCapability(self.capability.clone()));
        }
        Ok(())
    }
}

/// Trusted local callers: scheduled runs and the CLI
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationPolicy for AllowAll {
    fn authorize(&self, _principal: &Principal) -> Result<(), AuthorizationError> {
        Ok(())
    }
}
