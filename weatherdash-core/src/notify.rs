//! Transient user-facing notifications ("toasts").
//!
//! A [`Notifier`] keeps at most one visible notification per [`Severity`].
//! Issuing a new one dismisses the previous one of the same severity and
//! delivers the new one after a short debounce, so a dismiss followed by a
//! show does not flicker. Delivery goes through a [`NotificationSink`];
//! sink failures are logged and never reach the caller.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Success,
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }

    fn auto_close(&self) -> Duration {
        match self {
            Severity::Error | Severity::Warning => Duration::from_secs(5),
            Severity::Success | Severity::Info => Duration::from_secs(3),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationContent {
    Text(String),
    /// A message followed by cities the user may have meant.
    Suggestions { message: String, cities: Vec<String> },
}

impl fmt::Display for NotificationContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationContent::Text(text) => f.write_str(text),
            NotificationContent::Suggestions { message, cities } if cities.is_empty() => {
                f.write_str(message)
            }
            NotificationContent::Suggestions { message, cities } => {
                write!(f, "{message}. Did you mean: {}?", cities.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub content: NotificationContent,
    pub auto_close: Duration,
    pub close_on_click: bool,
}

/// Handle a sink assigns to a displayed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(pub u64);

/// Display surface for notifications.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: &Notification) -> anyhow::Result<NotificationId>;
    fn dismiss(&self, id: NotificationId) -> anyhow::Result<()>;
    fn dismiss_all(&self) -> anyhow::Result<()>;
}

#[derive(Default)]
struct Slots {
    active: HashMap<Severity, NotificationId>,
    /// Bumped on every request for a severity; a pending delivery only goes
    /// out if its generation is still current.
    generation: HashMap<Severity, u64>,
}

struct Inner {
    sink: Arc<dyn NotificationSink>,
    debounce: Duration,
    slots: Mutex<Slots>,
}

/// Per-instance notification dispatcher. Clones share state.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").field("debounce", &self.inner.debounce).finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_debounce(sink, DEFAULT_DEBOUNCE)
    }

    /// A zero debounce delivers synchronously; anything else requires a
    /// running tokio runtime.
    pub fn with_debounce(sink: Arc<dyn NotificationSink>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner { sink, debounce, slots: Mutex::new(Slots::default()) }),
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.text(Severity::Error, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.text(Severity::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.text(Severity::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.text(Severity::Warning, message.into());
    }

    /// Rich content in the slot of `severity`. Stays open longer and is not
    /// closed by a click.
    pub fn custom(&self, content: NotificationContent, severity: Severity) {
        self.dispatch(Notification {
            severity,
            content,
            auto_close: Duration::from_secs(5),
            close_on_click: false,
        });
    }

    /// Dismiss everything and forget all tracked and pending notifications.
    pub fn clear_all(&self) {
        let mut slots = self.slots();
        if let Err(err) = self.inner.sink.dismiss_all() {
            tracing::warn!(error = %err, "failed to dismiss notifications");
        }
        slots.active.clear();
        for generation in slots.generation.values_mut() {
            *generation += 1;
        }
    }

    /// Called by the sink when the user (or a timer) closed a notification.
    pub fn closed(&self, severity: Severity, id: NotificationId) {
        let mut slots = self.slots();
        if slots.active.get(&severity) == Some(&id) {
            slots.active.remove(&severity);
        }
    }

    /// Id currently shown for `severity`, if any.
    pub fn active(&self, severity: Severity) -> Option<NotificationId> {
        self.slots().active.get(&severity).copied()
    }

    fn text(&self, severity: Severity, message: String) {
        self.dispatch(Notification {
            severity,
            content: NotificationContent::Text(message),
            auto_close: severity.auto_close(),
            close_on_click: true,
        });
    }

    fn dispatch(&self, notification: Notification) {
        let severity = notification.severity;
        let generation = {
            let mut slots = self.slots();
            let dismissed = slots.active.remove(&severity).map(|id| self.inner.sink.dismiss(id));
            if let Some(Err(err)) = dismissed {
                tracing::warn!(error = %err, %severity, "failed to dismiss notification");
            }
            let generation = slots.generation.entry(severity).or_insert(0);
            *generation += 1;
            *generation
        };

        if self.inner.debounce.is_zero() {
            self.deliver(notification, generation);
            return;
        }

        let this = self.clone();
        let delay = self.inner.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.deliver(notification, generation);
        });
    }

    fn deliver(&self, notification: Notification, generation: u64) {
        let severity = notification.severity;
        let mut slots = self.slots();
        if slots.generation.get(&severity).copied() != Some(generation) {
            tracing::debug!(%severity, "notification superseded before display");
            return;
        }

        match self.inner.sink.show(&notification) {
            Ok(id) => {
                slots.active.insert(severity, id);
            }
            Err(err) => {
                tracing::warn!(error = %err, %severity, "failed to show notification");
            }
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory sink. Keeps the currently visible notifications and everything
/// ever shown.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemorySinkState>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    next_id: u64,
    visible: Vec<(NotificationId, Notification)>,
    history: Vec<Notification>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> Vec<Notification> {
        self.lock().visible.iter().map(|(_, n)| n.clone()).collect()
    }

    pub fn history(&self) -> Vec<Notification> {
        self.lock().history.clone()
    }

    /// Last shown notification of `severity`, visible or not.
    pub fn last(&self, severity: Severity) -> Option<Notification> {
        self.lock().history.iter().rev().find(|n| n.severity == severity).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemorySinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for MemorySink {
    fn show(&self, notification: &Notification) -> anyhow::Result<NotificationId> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = NotificationId(state.next_id);
        state.visible.push((id, notification.clone()));
        state.history.push(notification.clone());
        Ok(id)
    }

    fn dismiss(&self, id: NotificationId) -> anyhow::Result<()> {
        self.lock().visible.retain(|(shown, _)| *shown != id);
        Ok(())
    }

    fn dismiss_all(&self) -> anyhow::Result<()> {
        self.lock().visible.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn immediate() -> (Arc<MemorySink>, Notifier) {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::with_debounce(sink.clone(), Duration::ZERO);
        (sink, notifier)
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn show(&self, _: &Notification) -> anyhow::Result<NotificationId> {
            anyhow::bail!("display unavailable")
        }
        fn dismiss(&self, _: NotificationId) -> anyhow::Result<()> {
            anyhow::bail!("display unavailable")
        }
        fn dismiss_all(&self) -> anyhow::Result<()> {
            anyhow::bail!("display unavailable")
        }
    }

    #[test]
    fn one_visible_per_severity() {
        let (sink, notifier) = immediate();
        notifier.error("first");
        notifier.error("second");
        notifier.info("note");

        let visible = sink.visible();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().any(|n| n.content == NotificationContent::Text("second".into())));
        assert!(visible.iter().all(|n| n.content != NotificationContent::Text("first".into())));
        assert_eq!(sink.history().len(), 3);
    }

    #[test]
    fn clear_all_dismisses_everything() {
        let (sink, notifier) = immediate();
        notifier.error("boom");
        notifier.success("yay");
        notifier.clear_all();

        assert!(sink.visible().is_empty());
        assert_eq!(notifier.active(Severity::Error), None);
        assert_eq!(notifier.active(Severity::Success), None);
    }

    #[test]
    fn closed_frees_the_slot_only_for_matching_id() {
        let (_sink, notifier) = immediate();
        notifier.info("a");
        let id = notifier.active(Severity::Info).unwrap();

        notifier.closed(Severity::Info, NotificationId(id.0 + 100));
        assert_eq!(notifier.active(Severity::Info), Some(id));

        notifier.closed(Severity::Info, id);
        assert_eq!(notifier.active(Severity::Info), None);
    }

    #[test]
    fn custom_content_uses_its_severity_slot() {
        let (sink, notifier) = immediate();
        notifier.error("plain");
        notifier.custom(
            NotificationContent::Suggestions {
                message: "City \"Pariss\" not found".into(),
                cities: vec!["Paris".into()],
            },
            Severity::Error,
        );

        let visible = sink.visible();
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].close_on_click);
        assert_eq!(visible[0].auto_close, Duration::from_secs(5));
        assert_eq!(
            visible[0].content.to_string(),
            "City \"Pariss\" not found. Did you mean: Paris?"
        );
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let notifier = Notifier::with_debounce(Arc::new(FailingSink), Duration::ZERO);
        notifier.error("nobody will see this");
        notifier.clear_all();
        assert_eq!(notifier.active(Severity::Error), None);
    }

    #[test]
    fn instances_do_not_share_slots() {
        let (sink_a, a) = immediate();
        let (sink_b, b) = immediate();
        a.error("a");
        b.error("b");
        assert_eq!(sink_a.visible().len(), 1);
        assert_eq!(sink_b.visible().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_waits_for_debounce() {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(sink.clone());

        notifier.success("loaded");
        tokio::task::yield_now().await;
        assert!(sink.visible().is_empty());

        tokio::time::sleep(DEFAULT_DEBOUNCE + Duration::from_millis(10)).await;
        assert_eq!(sink.visible().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_pending_one() {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(sink.clone());

        notifier.error("stale");
        notifier.error("fresh");
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        let history = sink.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, NotificationContent::Text("fresh".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_all_cancels_pending_delivery() {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(sink.clone());

        notifier.info("soon");
        notifier.clear_all();
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert!(sink.history().is_empty());
    }
}
