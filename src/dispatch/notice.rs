//! Short-lived, non-modal notices shown by the host

use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Connection,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn connection(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Connection,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Notification surface; must not block
pub trait Notifier: Send {
    fn notify(&self, notice: Notice);
}

/// Logs notices; the default surface for the command-line runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Connection => info!("🔔 {}", notice.text),
            NoticeKind::Error => warn!("🔔 {}", notice.text),
        }
    }
}

/// Keeps every notice; shared so a test can inspect what the engine sent
#[derive(Debug, Default, Clone)]
pub struct CollectingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.text.clone()).collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Which notice kinds reach the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeFilter {
    pub connection: bool,
    pub errors: bool,
}

impl Default for NoticeFilter {
    fn default() -> Self {
        Self {
            connection: true,
            errors: true,
        }
    }
}

impl NoticeFilter {
    pub fn allows(&self, kind: NoticeKind) -> bool {
        match kind {
            NoticeKind::Connection => self.connection,
            NoticeKind::Error => self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_notifier_shares_log() {
        let notifier = CollectingNotifier::new();
        let clone = notifier.clone();
        clone.notify(Notice::connection("DualSense Connected"));
        assert_eq!(notifier.texts(), vec!["DualSense Connected"]);
    }

    #[test]
    fn test_filter() {
        let filter = NoticeFilter {
            connection: false,
            errors: true,
        };
        assert!(!filter.allows(NoticeKind::Connection));
        assert!(filter.allows(NoticeKind::Error));
    }
}
