//! The search session controller.
//!
//! [`InPageSearch`] owns the session state for one search target and one
//! overlay element. Everything asynchronous (result notifications, overlay
//! messages, deferred refocus) reaches it as a [`SessionInput`] through the
//! [`SessionMailbox`] it was built with, so all state changes happen on
//! whichever loop drains that mailbox.
use crate::capability::{TargetCapability, TargetKind};
use crate::events::{EventEmitter, SearchEvent};
use crate::focus::{refocus_delay, FocusDelay};
use crate::host::{ElementContainer, ElementEvent, OverlayElement, SearchTarget};
use inpage_common::protocol::{
    AgentMessage, ControllerMessage, FindOptions, FoundInPageResult, RequestId, StopFindAction,
};
use inpage_common::{InPageError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const CLASS_ACTIVE: &str = "search-active";
pub const CLASS_INACTIVE: &str = "search-inactive";
pub const CLASS_FIRSTPAINT: &str = "search-firstpaint";

/// Asynchronous input processed by [`InPageSearch::handle_input`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Found(FoundInPageResult),
    Agent(AgentMessage),
    /// A scheduled refocus of the overlay is due.
    FocusDue,
    Console {
        line: u32,
        message: String,
        source_id: String,
    },
}

/// Inbound queue and deferred-task scheduler of a session.
///
/// `post` must not run the input synchronously: it is called from inside
/// session operations and host callbacks.
pub trait SessionMailbox: Send + Sync + 'static {
    fn post(&self, input: SessionInput);
    /// Deliver `input` no earlier than `delay` from now. Not cancellable.
    fn post_after(&self, input: SessionInput, delay: Duration);
}

/// Point-in-time view of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_open: bool,
    pub is_searching: bool,
    pub request_id: Option<RequestId>,
    pub previous_query: String,
    pub active_match: u32,
    pub total_matches: u32,
    pub initialized: bool,
    pub target_kind: TargetKind,
}

pub struct InPageSearch {
    overlay: Arc<dyn OverlayElement>,
    parent: Arc<dyn ElementContainer>,
    capability: TargetCapability,
    mailbox: Arc<dyn SessionMailbox>,
    events: EventEmitter,
    verbose: bool,

    opened: bool,
    request_id: Option<RequestId>,
    prev_query: String,
    active_idx: u32,
    max_idx: u32,
    initialized: bool,
    finalized: bool,
}

impl InPageSearch {
    /// Bind a session to `target`. The target kind is resolved here, once.
    ///
    /// Nothing is wired until [`InPageSearch::initialize`] runs, either
    /// explicitly or on the first [`InPageSearch::open_search_window`].
    pub fn new(
        overlay: Arc<dyn OverlayElement>,
        parent: Arc<dyn ElementContainer>,
        target: Arc<dyn SearchTarget>,
        mailbox: Arc<dyn SessionMailbox>,
        verbose: bool,
    ) -> Self {
        Self {
            overlay,
            parent,
            capability: TargetCapability::classify(target),
            mailbox,
            events: EventEmitter::default(),
            verbose,
            opened: false,
            request_id: None,
            prev_query: String::new(),
            active_idx: 0,
            max_idx: 0,
            initialized: false,
            finalized: false,
        }
    }

    pub fn events_mut(&mut self) -> &mut EventEmitter {
        &mut self.events
    }

    pub fn overlay(&self) -> &Arc<dyn OverlayElement> {
        &self.overlay
    }

    pub fn target_kind(&self) -> TargetKind {
        self.capability.kind()
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn is_searching(&self) -> bool {
        self.request_id.is_some()
    }

    pub fn previous_query(&self) -> &str {
        &self.prev_query
    }

    /// `(active, total)` from the most recent accepted result.
    pub fn active_match(&self) -> (u32, u32) {
        (self.active_idx, self.max_idx)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_open: self.opened,
            is_searching: self.is_searching(),
            request_id: self.request_id,
            previous_query: self.prev_query.clone(),
            active_match: self.active_idx,
            total_matches: self.max_idx,
            initialized: self.initialized,
            target_kind: self.capability.kind(),
        }
    }

    pub fn open_search_window(&mut self) -> Result<()> {
        if self.opened {
            debug!(target: "inpage.session", "search window already open");
            return Ok(());
        }

        self.initialize()?;

        self.overlay.remove_class(CLASS_INACTIVE);
        self.overlay.remove_class(CLASS_FIRSTPAINT);
        self.overlay.add_class(CLASS_ACTIVE);
        self.opened = true;
        self.events.emit(&SearchEvent::Open);
        self.schedule_focus(FocusDelay::Immediate);
        Ok(())
    }

    pub fn close_search_window(&mut self) {
        if !self.opened {
            debug!(target: "inpage.session", "search window already closed");
            return;
        }
        self.stop_find();
        self.overlay.send(ControllerMessage::Close);
        self.overlay.remove_class(CLASS_ACTIVE);
        self.overlay.add_class(CLASS_INACTIVE);
        self.events.emit(&SearchEvent::Stop);
        self.request_id = None;
        self.prev_query.clear();
        self.opened = false;
    }

    /// Start a fresh search for `query`, superseding any in-flight request.
    pub fn start_to_find(&mut self, query: &str) {
        let id = self.capability.find(query, FindOptions::default());
        debug!(target: "inpage.session", request = %id, %query, "find started");
        self.request_id = Some(id);
        self.active_idx = 0;
        self.max_idx = 0;
        self.prev_query = query.to_string();
        self.events.emit(&SearchEvent::Start {
            query: query.to_string(),
        });
        self.refocus_after_find();
    }

    /// Advance the current search. Fails when no search has been started.
    pub fn find_next(&mut self, forward: bool) -> Result<()> {
        if !self.is_searching() {
            return Err(InPageError::InvalidState(
                "search did not start yet; call start_to_find() first".into(),
            ));
        }
        let id = self
            .capability
            .find(&self.prev_query, FindOptions::continuation(forward));
        debug!(target: "inpage.session", request = %id, forward, "find next");
        self.request_id = Some(id);
        self.events.emit(&SearchEvent::Next {
            query: self.prev_query.clone(),
            forward,
        });
        self.refocus_after_find();
        Ok(())
    }

    /// Clear the highlighted selection on the target. Open/closed state is kept.
    pub fn stop_find(&self) {
        self.capability.stop_find(StopFindAction::ClearSelection);
    }

    /// Detach the overlay from its container. Call exactly once, when the
    /// session is discarded, or the overlay stays in the document.
    ///
    /// An overlay that was never attached (the window was never opened and
    /// not preloaded) is left alone.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(InPageError::InvalidState("session already finalized".into()));
        }
        if self.overlay.is_attached() {
            self.parent.remove_child(self.overlay.as_ref())?;
        }
        self.finalized = true;
        Ok(())
    }

    /// One-time wiring: result subscription, overlay classes and attachment,
    /// overlay message listener. Later calls are no-ops.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let mailbox = self.mailbox.clone();
        self.capability
            .subscribe(Box::new(move |result| mailbox.post(SessionInput::Found(result))))?;

        self.overlay.add_class(CLASS_INACTIVE);
        self.overlay.add_class(CLASS_FIRSTPAINT);
        if !self.overlay.is_attached() {
            self.parent.append_child(self.overlay.clone());
        }

        let mailbox = self.mailbox.clone();
        let verbose = self.verbose;
        self.overlay.add_event_listener(Box::new(move |event| match event {
            ElementEvent::IpcMessage(msg) => mailbox.post(SessionInput::Agent(msg.clone())),
            ElementEvent::ConsoleMessage {
                line,
                message,
                source_id,
            } if verbose => mailbox.post(SessionInput::Console {
                line: *line,
                message: message.clone(),
                source_id: source_id.clone(),
            }),
            _ => {}
        }));

        self.initialized = true;
        Ok(())
    }

    /// Process one input drained from the mailbox.
    pub fn handle_input(&mut self, input: SessionInput) -> Result<()> {
        match input {
            SessionInput::Found(result) => self.on_found_in_page(result),
            SessionInput::Agent(msg) => self.on_agent_message(msg)?,
            SessionInput::FocusDue => self.focus_input(),
            SessionInput::Console {
                line,
                message,
                source_id,
            } => {
                debug!(target: "inpage.session", line, %source_id, %message, "search window console");
            }
        }
        Ok(())
    }

    /// Move input focus into the overlay's text field.
    pub fn focus_input(&mut self) {
        if self.finalized {
            return;
        }
        debug!(target: "inpage.session", "focus on search window");
        self.overlay.focus();
        self.overlay.send(ControllerMessage::Focus);
        self.events.emit(&SearchEvent::FocusInput);
    }

    fn on_agent_message(&mut self, msg: AgentMessage) -> Result<()> {
        match msg {
            AgentMessage::Query(text) => self.on_search_query(&text),
            AgentMessage::Close => self.close_search_window(),
            AgentMessage::Back(text) => self.navigate(false, text)?,
            AgentMessage::Forward(text) => self.navigate(true, text)?,
        }
        Ok(())
    }

    // Back/forward advance an active search. While idle they only start one
    // when the overlay supplied non-empty text.
    fn navigate(&mut self, forward: bool, text: Option<String>) -> Result<()> {
        if self.is_searching() {
            return self.find_next(forward);
        }
        match text {
            Some(text) if !text.is_empty() => self.on_search_query(&text),
            _ => debug!(target: "inpage.session", forward, "navigation ignored while idle"),
        }
        Ok(())
    }

    fn on_search_query(&mut self, text: &str) {
        debug!(target: "inpage.session", %text, "query from search window");

        if text.is_empty() {
            self.close_search_window();
            return;
        }

        if !self.is_searching() || self.prev_query != text {
            self.start_to_find(text);
        } else if let Err(e) = self.find_next(true) {
            debug!(target: "inpage.session", error = %e, "repeat query dropped");
        }
    }

    fn on_found_in_page(&mut self, result: FoundInPageResult) {
        if self.request_id != Some(result.request_id) {
            debug!(target: "inpage.session", request = %result.request_id, "stale result dropped");
            return;
        }

        if let Some(active) = result.active_match_ordinal {
            self.active_idx = active;
        }
        if let Some(matches) = result.matches {
            self.max_idx = matches;
        }
        if result.final_update {
            self.send_result();
        }
    }

    fn send_result(&self) {
        let (nth, all) = (self.active_idx, self.max_idx);
        info!(target: "inpage.session", query = %self.prev_query, nth, all, "search result");
        self.overlay.send(ControllerMessage::Result { nth, all });
        self.events.emit(&SearchEvent::Found {
            query: self.prev_query.clone(),
            nth,
            all,
        });
    }

    fn refocus_after_find(&self) {
        if let Some(delay) = refocus_delay(self.capability.kind(), self.active_idx, self.max_idx) {
            self.schedule_focus(delay);
        }
    }

    fn schedule_focus(&self, delay: FocusDelay) {
        match delay {
            FocusDelay::Immediate => self.mailbox.post(SessionInput::FocusDue),
            FocusDelay::After(d) => self.mailbox.post_after(SessionInput::FocusDue, d),
        }
    }
}
