//! In-memory host: searchable text surfaces, an overlay element and a document.
//!
//! Used by the demo binary and by tests. Searching is case-insensitive over
//! non-overlapping occurrences; a new find activates the first match and
//! continuations step forward or backward with wrap-around. Every find
//! delivers a partial update (match count) followed by a final one.
use crate::host::{
    Document, ElementContainer, ElementEvent, ElementId, ElementListener, FoundListener,
    OverlayElement, SearchTarget,
};
use anyhow::anyhow;
use inpage_common::protocol::{
    AgentMessage, ControllerMessage, FindOptions, FoundInPageResult, RequestId, StopFindAction,
};
use inpage_common::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type SharedFoundListener = Arc<dyn Fn(FoundInPageResult) + Send + Sync>;
type SharedElementListener = Arc<dyn Fn(&ElementEvent) + Send + Sync>;
type MessageLink = Arc<dyn Fn(ControllerMessage) + Send + Sync>;

#[derive(Default)]
struct FindState {
    next_request: u64,
    query: Option<String>,
    active: u32,
    finds: Vec<(String, FindOptions)>,
    stops: Vec<StopFindAction>,
}

/// Shared search logic behind both memory surfaces.
struct TextFinder {
    text: String,
    state: Mutex<FindState>,
}

impl TextFinder {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            state: Mutex::new(FindState::default()),
        }
    }

    fn count(&self, query: &str) -> u32 {
        if query.is_empty() {
            return 0;
        }
        let haystack = self.text.to_lowercase();
        let needle = query.to_lowercase();
        u32::try_from(haystack.matches(needle.as_str()).count()).unwrap_or(u32::MAX)
    }

    fn find(&self, query: &str, options: FindOptions) -> (RequestId, [FoundInPageResult; 2]) {
        let total = self.count(query);
        let mut state = self.state.lock();
        state.next_request += 1;
        let request_id = RequestId(state.next_request);
        state.finds.push((query.to_string(), options));

        let same_query = state.query.as_deref() == Some(query);
        state.active = if total == 0 {
            0
        } else if !options.find_next || !same_query || state.active == 0 {
            1
        } else if options.forward.unwrap_or(true) {
            state.active % total + 1
        } else if state.active <= 1 {
            total
        } else {
            state.active - 1
        };
        state.query = Some(query.to_string());

        let partial = FoundInPageResult {
            request_id,
            active_match_ordinal: None,
            matches: Some(total),
            final_update: false,
        };
        let last = FoundInPageResult {
            request_id,
            active_match_ordinal: Some(state.active),
            matches: Some(total),
            final_update: true,
        };
        (request_id, [partial, last])
    }

    fn stop(&self, action: StopFindAction) {
        let mut state = self.state.lock();
        state.stops.push(action);
        if action == StopFindAction::ClearSelection {
            state.query = None;
            state.active = 0;
        }
    }
}

/// Window contents over a fixed text. Results go to direct listeners.
pub struct MemoryContents {
    finder: TextFinder,
    listeners: Mutex<Vec<SharedFoundListener>>,
}

impl MemoryContents {
    pub fn new(text: &str) -> Self {
        Self {
            finder: TextFinder::new(text),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Every find call so far, with its options.
    pub fn find_calls(&self) -> Vec<(String, FindOptions)> {
        self.finder.state.lock().finds.clone()
    }

    pub fn stop_calls(&self) -> Vec<StopFindAction> {
        self.finder.state.lock().stops.clone()
    }
}

impl SearchTarget for MemoryContents {
    fn tag_name(&self) -> Option<&str> {
        None
    }

    fn find_in_page(&self, query: &str, options: FindOptions) -> RequestId {
        let (id, results) = self.finder.find(query, options);
        let listeners = self.listeners.lock().clone();
        for result in results {
            for listener in &listeners {
                listener(result.clone());
            }
        }
        id
    }

    fn stop_find_in_page(&self, action: StopFindAction) {
        self.finder.stop(action);
    }

    fn on_found_in_page(&self, listener: FoundListener) -> Result<()> {
        self.listeners.lock().push(Arc::from(listener));
        Ok(())
    }
}

/// An embedded frame over a fixed text. Results go out as element events.
pub struct MemoryWebview {
    finder: TextFinder,
    listeners: Mutex<Vec<SharedElementListener>>,
}

impl MemoryWebview {
    pub const TAG: &'static str = "WEBVIEW";

    pub fn new(text: &str) -> Self {
        Self {
            finder: TextFinder::new(text),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn find_calls(&self) -> Vec<(String, FindOptions)> {
        self.finder.state.lock().finds.clone()
    }
}

impl SearchTarget for MemoryWebview {
    fn tag_name(&self) -> Option<&str> {
        Some(Self::TAG)
    }

    fn find_in_page(&self, query: &str, options: FindOptions) -> RequestId {
        let (id, results) = self.finder.find(query, options);
        let listeners = self.listeners.lock().clone();
        for result in results {
            let event = ElementEvent::FoundInPage(result);
            for listener in &listeners {
                listener(&event);
            }
        }
        id
    }

    fn stop_find_in_page(&self, action: StopFindAction) {
        self.finder.stop(action);
    }

    fn add_event_listener(&self, listener: ElementListener) -> Result<()> {
        self.listeners.lock().push(Arc::from(listener));
        Ok(())
    }
}

#[derive(Default)]
struct OverlayState {
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    src: Option<String>,
    ready: bool,
    sent: Vec<ControllerMessage>,
    focus_count: usize,
    scripts: Vec<String>,
    devtools: bool,
}

/// Overlay element recording everything done to it.
pub struct MemoryOverlay {
    id: ElementId,
    attached: Arc<Mutex<HashSet<ElementId>>>,
    state: Mutex<OverlayState>,
    listeners: Mutex<Vec<SharedElementListener>>,
    link: Mutex<Option<MessageLink>>,
}

impl MemoryOverlay {
    fn new(id: ElementId, attached: Arc<Mutex<HashSet<ElementId>>>) -> Self {
        Self {
            id,
            attached,
            state: Mutex::new(OverlayState::default()),
            listeners: Mutex::new(Vec::new()),
            link: Mutex::new(None),
        }
    }

    /// Fire `event` on every registered listener.
    pub fn dispatch(&self, event: &ElementEvent) {
        let listeners = self.listeners.lock().clone();
        for listener in &listeners {
            listener(event);
        }
    }

    /// A message sent by the agent inside the overlay to its host.
    pub fn post_from_agent(&self, msg: AgentMessage) {
        self.dispatch(&ElementEvent::IpcMessage(msg));
    }

    /// Mark the overlay contents as loaded and fire `DomReady`.
    pub fn set_ready(&self) {
        self.state.lock().ready = true;
        self.dispatch(&ElementEvent::DomReady);
    }

    /// Forward controller messages to the agent running in the overlay.
    pub fn connect<F>(&self, link: F)
    where
        F: Fn(ControllerMessage) + Send + Sync + 'static,
    {
        *self.link.lock() = Some(Arc::new(link));
    }

    pub fn sent_messages(&self) -> Vec<ControllerMessage> {
        self.state.lock().sent.clone()
    }

    pub fn focus_count(&self) -> usize {
        self.state.lock().focus_count
    }

    pub fn executed_scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    pub fn devtools_opened(&self) -> bool {
        self.state.lock().devtools
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        lookup(&self.state.lock().attributes, name)
    }

    pub fn style(&self, property: &str) -> Option<String> {
        lookup(&self.state.lock().styles, property)
    }
}

fn lookup(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

fn upsert(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some(pair) => pair.1 = value.to_string(),
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

impl OverlayElement for MemoryOverlay {
    fn id(&self) -> ElementId {
        self.id
    }

    fn add_class(&self, class: &str) {
        let mut state = self.state.lock();
        if !state.classes.iter().any(|c| c == class) {
            state.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.state.lock().classes.retain(|c| c != class);
    }

    fn class_name(&self) -> String {
        self.state.lock().classes.join(" ")
    }

    fn set_attribute(&self, name: &str, value: &str) {
        upsert(&mut self.state.lock().attributes, name, value);
    }

    fn set_style(&self, property: &str, value: &str) {
        upsert(&mut self.state.lock().styles, property, value);
    }

    fn src(&self) -> Option<String> {
        self.state.lock().src.clone()
    }

    fn set_src(&self, src: &str) {
        self.state.lock().src = Some(src.to_string());
    }

    fn is_attached(&self) -> bool {
        self.attached.lock().contains(&self.id)
    }

    fn send(&self, msg: ControllerMessage) {
        self.state.lock().sent.push(msg.clone());
        let link = self.link.lock().clone();
        if let Some(link) = link {
            link(msg);
        }
    }

    fn focus(&self) {
        self.state.lock().focus_count += 1;
    }

    fn add_event_listener(&self, listener: ElementListener) {
        self.listeners.lock().push(Arc::from(listener));
    }

    fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    fn execute_script(&self, script: &str) {
        self.state.lock().scripts.push(script.to_string());
    }

    fn open_devtools(&self) {
        self.state.lock().devtools = true;
    }
}

/// A container node; attachment is tracked document-wide.
pub struct MemoryContainer {
    attached: Arc<Mutex<HashSet<ElementId>>>,
    children: Mutex<Vec<Arc<dyn OverlayElement>>>,
}

impl MemoryContainer {
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }
}

impl ElementContainer for MemoryContainer {
    fn append_child(&self, child: Arc<dyn OverlayElement>) {
        self.attached.lock().insert(child.id());
        self.children.lock().push(child);
    }

    fn remove_child(&self, child: &dyn OverlayElement) -> Result<()> {
        let id = child.id();
        let mut children = self.children.lock();
        let Some(pos) = children.iter().position(|c| c.id() == id) else {
            return Err(anyhow!("element {} is not a child of this container", id.0).into());
        };
        children.remove(pos);
        self.attached.lock().remove(&id);
        Ok(())
    }
}

/// Document owning a body container and handing out overlays.
pub struct MemoryDocument {
    next_id: AtomicU64,
    attached: Arc<Mutex<HashSet<ElementId>>>,
    body: Arc<MemoryContainer>,
    created: Mutex<Vec<Arc<MemoryOverlay>>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let attached = Arc::new(Mutex::new(HashSet::new()));
        Self {
            next_id: AtomicU64::new(1),
            body: Arc::new(MemoryContainer {
                attached: attached.clone(),
                children: Mutex::new(Vec::new()),
            }),
            attached,
            created: Mutex::new(Vec::new()),
        }
    }

    /// A detached overlay belonging to this document.
    pub fn new_overlay(&self) -> Arc<MemoryOverlay> {
        let id = ElementId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let overlay = Arc::new(MemoryOverlay::new(id, self.attached.clone()));
        self.created.lock().push(overlay.clone());
        overlay
    }

    /// A further container node, e.g. a custom overlay parent.
    pub fn new_container(&self) -> Arc<MemoryContainer> {
        Arc::new(MemoryContainer {
            attached: self.attached.clone(),
            children: Mutex::new(Vec::new()),
        })
    }

    pub fn body_children(&self) -> usize {
        self.body.child_count()
    }

    /// The most recent overlay created by this document.
    pub fn last_overlay(&self) -> Option<Arc<MemoryOverlay>> {
        self.created.lock().last().cloned()
    }
}

impl Document for MemoryDocument {
    fn create_overlay(&self) -> Arc<dyn OverlayElement> {
        self.new_overlay()
    }

    fn body(&self) -> Arc<dyn ElementContainer> {
        self.body.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_case_insensitively() {
        let contents = MemoryContents::new("Foo bar FOO foo");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        contents
            .on_found_in_page(Box::new(move |r| sink.lock().push(r)))
            .unwrap();

        contents.find_in_page("foo", FindOptions::default());
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(!seen[0].final_update);
        assert_eq!(seen[1].matches, Some(3));
        assert_eq!(seen[1].active_match_ordinal, Some(1));
    }

    #[test]
    fn continuation_wraps_both_ways() {
        let finder = TextFinder::new("a a a");
        finder.find("a", FindOptions::default());
        let (_, [_, r]) = finder.find("a", FindOptions::continuation(true));
        assert_eq!(r.active_match_ordinal, Some(2));
        finder.find("a", FindOptions::continuation(true));
        let (_, [_, r]) = finder.find("a", FindOptions::continuation(true));
        assert_eq!(r.active_match_ordinal, Some(1));
        let (_, [_, r]) = finder.find("a", FindOptions::continuation(false));
        assert_eq!(r.active_match_ordinal, Some(3));
    }

    #[test]
    fn no_match_reports_zero_of_zero() {
        let finder = TextFinder::new("foo");
        let (_, [_, r]) = finder.find("zzz", FindOptions::default());
        assert_eq!(r.active_match_ordinal, Some(0));
        assert_eq!(r.matches, Some(0));
        assert!(r.final_update);
    }

    #[test]
    fn request_ids_increase() {
        let finder = TextFinder::new("foo");
        let (a, _) = finder.find("foo", FindOptions::default());
        let (b, _) = finder.find("foo", FindOptions::continuation(true));
        assert!(b.0 > a.0);
    }

    #[test]
    fn removing_a_stranger_fails() {
        let doc = MemoryDocument::new();
        let overlay = doc.new_overlay();
        assert!(doc.body().remove_child(overlay.as_ref()).is_err());

        doc.body().append_child(overlay.clone());
        assert!(overlay.is_attached());
        doc.body().remove_child(overlay.as_ref()).unwrap();
        assert!(!overlay.is_attached());
    }

    #[test]
    fn sends_reach_the_link() {
        let doc = MemoryDocument::new();
        let overlay = doc.new_overlay();
        let got = Arc::new(Mutex::new(Vec::new()));
        let sink = got.clone();
        overlay.connect(move |m| sink.lock().push(m));
        overlay.send(ControllerMessage::Focus);
        assert_eq!(*got.lock(), vec![ControllerMessage::Focus]);
        assert_eq!(overlay.sent_messages(), vec![ControllerMessage::Focus]);
    }
}
