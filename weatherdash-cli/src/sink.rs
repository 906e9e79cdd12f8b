use std::{
    io::{self, Write},
    sync::atomic::{AtomicU64, Ordering},
};

use weatherdash_core::{Notification, NotificationId, NotificationSink, Severity};

/// Prints notifications to stderr as they are shown. Terminal lines cannot
/// be taken back, so dismissing is a no-op.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    next_id: AtomicU64,
}

impl NotificationSink for ConsoleSink {
    fn show(&self, notification: &Notification) -> anyhow::Result<NotificationId> {
        let tag = match notification.severity {
            Severity::Error => "✗",
            Severity::Success => "✓",
            Severity::Info => "i",
            Severity::Warning => "!",
        };
        writeln!(io::stderr(), "[{tag}] {}", notification.content)?;
        Ok(NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn dismiss(&self, _id: NotificationId) -> anyhow::Result<()> {
        Ok(())
    }

    fn dismiss_all(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
