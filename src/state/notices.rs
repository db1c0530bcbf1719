//! Transient user-facing notices (toasts) posted by state operations.

#[cfg(test)]
#[path = "notices_test.rs"]
mod notices_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Severity of a transient notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-visible transient message (a toast).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Queue of notices waiting to be shown. Cloning shares the queue.
#[derive(Clone, Debug, Default)]
pub struct Notices {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    /// Remove and return every pending notice, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock())
    }

    /// Pending notices without consuming them.
    #[must_use]
    pub fn pending(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    fn push(&self, level: NoticeLevel, message: String) {
        tracing::debug!(?level, %message, "notice");
        self.lock().push(Notice { level, message });
    }

    // A notice list stays usable even if a holder panicked mid-push.
    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
