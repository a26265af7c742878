//! Debounced autosave scheduling
//!
//! Writes are armed by the first change of a session, so opening a document
//! and closing it untouched never creates a storage entry. Every change pushes
//! the deadline back by the debounce period; the caller polls with the current
//! time and writes once the deadline has passed.

use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Configuration for autosave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before writing
    pub debounce: Duration,

    /// When false, writes only happen through an explicit flush
    pub enabled: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            enabled: true,
        }
    }
}

impl AutosaveConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    config: AutosaveConfig,
    armed: bool,
    deadline: Option<Instant>,
}

impl AutosaveScheduler {
    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            config,
            armed: false,
            deadline: None,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Whether a change has been made in this session
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Record a change at `now`, rescheduling any pending write
    pub fn note_change(&mut self, now: Instant) {
        self.armed = true;
        if self.config.enabled {
            let deadline = now + self.config.debounce;
            tracing::debug!(?deadline, "autosave scheduled");
            self.deadline = Some(deadline);
        }
    }

    /// Pending write time, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the pending write is due
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending write
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Forget session changes, e.g. when a new document is opened
    pub fn disarm(&mut self) {
        self.armed = false;
        self.deadline = None;
    }
}
