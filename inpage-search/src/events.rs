//! Public lifecycle events of a search session.
use std::fmt;

/// Lifecycle notification emitted by [`crate::InPageSearch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Open,
    Stop,
    Start { query: String },
    Next { query: String, forward: bool },
    Found { query: String, nth: u32, all: u32 },
    FocusInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Stop,
    Start,
    Next,
    Found,
    FocusInput,
}

impl SearchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SearchEvent::Open => EventKind::Open,
            SearchEvent::Stop => EventKind::Stop,
            SearchEvent::Start { .. } => EventKind::Start,
            SearchEvent::Next { .. } => EventKind::Next,
            SearchEvent::Found { .. } => EventKind::Found,
            SearchEvent::FocusInput => EventKind::FocusInput,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Open => "open",
            EventKind::Stop => "stop",
            EventKind::Start => "start",
            EventKind::Next => "next",
            EventKind::Found => "found",
            EventKind::FocusInput => "focus-input",
        };
        f.write_str(name)
    }
}

pub type EventListener = Box<dyn Fn(&SearchEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    listener: EventListener,
}

/// Synchronous publish/subscribe over [`SearchEvent`]s.
///
/// Listeners run inside [`EventEmitter::emit`], in registration order, and
/// cannot observe or alter session state.
///
/// ```
/// use inpage_search::events::{EventEmitter, EventKind, SearchEvent};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let mut emitter = EventEmitter::default();
/// let opens = Arc::new(AtomicUsize::new(0));
/// let counter = opens.clone();
/// let id = emitter.on(EventKind::Open, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// emitter.emit(&SearchEvent::Open);
/// emitter.emit(&SearchEvent::Stop);
/// assert!(emitter.off(id));
/// emitter.emit(&SearchEvent::Open);
/// assert_eq!(opens.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct EventEmitter {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventEmitter {
    /// Listen for one kind of event.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&SearchEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Box::new(listener))
    }

    /// Listen for every event.
    pub fn on_any<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&SearchEvent) + Send + Sync + 'static,
    {
        self.register(None, Box::new(listener))
    }

    pub fn register(&mut self, kind: Option<EventKind>, listener: EventListener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }

    /// Remove a listener. Returns `false` when the id is unknown.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn emit(&self, event: &SearchEvent) {
        let kind = event.kind();
        for sub in &self.subscriptions {
            if sub.kind.is_none_or(|k| k == kind) {
                (sub.listener)(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn delivers_in_registration_order() {
        let mut emitter = EventEmitter::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = log.clone();
            emitter.on_any(move |e| log.lock().push(format!("{tag}:{}", e.kind())));
        }

        emitter.emit(&SearchEvent::Start { query: "foo".into() });
        assert_eq!(*log.lock(), vec!["first:start", "second:start"]);
    }

    #[test]
    fn kind_filter_skips_other_events() {
        let mut emitter = EventEmitter::default();
        let found = Arc::new(Mutex::new(Vec::new()));
        let sink = found.clone();
        emitter.on(EventKind::Found, move |e| sink.lock().push(e.clone()));

        emitter.emit(&SearchEvent::Open);
        emitter.emit(&SearchEvent::Found {
            query: "foo".into(),
            nth: 1,
            all: 2,
        });
        emitter.emit(&SearchEvent::FocusInput);

        assert_eq!(
            *found.lock(),
            vec![SearchEvent::Found {
                query: "foo".into(),
                nth: 1,
                all: 2
            }]
        );
    }

    #[test]
    fn off_unknown_id_is_false() {
        let mut emitter = EventEmitter::default();
        let id = emitter.on_any(|_| {});
        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn focus_input_displays_hyphenated() {
        assert_eq!(EventKind::FocusInput.to_string(), "focus-input");
    }
}
