//! Host-provided primitives the session is layered on.
//!
//! A host (an embedded-browser shell, a test double, the in-memory host in
//! [`crate::memory`]) implements these traits. The session never reaches past
//! them: text search, rendering and element lifecycles stay on the host side.
use inpage_common::protocol::{
    AgentMessage, ControllerMessage, FindOptions, FoundInPageResult, RequestId, StopFindAction,
};
use inpage_common::{InPageError, Result};
use std::sync::Arc;

/// Listener receiving result notifications straight from a content surface.
pub type FoundListener = Box<dyn Fn(FoundInPageResult) + Send + Sync>;

/// Listener receiving every event dispatched on a document element.
pub type ElementListener = Box<dyn Fn(&ElementEvent) + Send + Sync>;

/// Events dispatched on document elements (embedded frames, the overlay).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    FoundInPage(FoundInPageResult),
    IpcMessage(AgentMessage),
    DomReady,
    ConsoleMessage {
        line: u32,
        message: String,
        source_id: String,
    },
}

/// A searchable surface: a window's contents or an embedded content frame.
pub trait SearchTarget: Send + Sync {
    /// Element tag when the surface lives in the document (`"WEBVIEW"` for
    /// embedded frames); window contents have none.
    fn tag_name(&self) -> Option<&str>;

    fn find_in_page(&self, query: &str, options: FindOptions) -> RequestId;

    fn stop_find_in_page(&self, action: StopFindAction);

    /// Direct result subscription offered by window contents.
    fn on_found_in_page(&self, _listener: FoundListener) -> Result<()> {
        Err(InPageError::Unsupported("found-in-page listener"))
    }

    /// Element event registration offered by embedded frames.
    fn add_event_listener(&self, _listener: ElementListener) -> Result<()> {
        Err(InPageError::Unsupported("element event listener"))
    }
}

/// Identity of an element inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// The element hosting the overlay UI agent.
pub trait OverlayElement: Send + Sync {
    fn id(&self) -> ElementId;

    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    /// Space separated class list, in insertion order.
    fn class_name(&self) -> String;

    fn set_attribute(&self, name: &str, value: &str);
    fn set_style(&self, property: &str, value: &str);

    fn src(&self) -> Option<String>;
    fn set_src(&self, src: &str);

    /// Whether the element currently has a parent container.
    fn is_attached(&self) -> bool;

    /// Deliver a message to the agent running inside the overlay.
    fn send(&self, msg: ControllerMessage);
    /// Move host-level input focus onto the element.
    fn focus(&self);

    fn add_event_listener(&self, listener: ElementListener);

    /// Whether the overlay's own contents exist yet, i.e. scripts can run.
    fn is_ready(&self) -> bool;
    fn execute_script(&self, script: &str);
    fn open_devtools(&self);
}

/// A document node the overlay is attached to.
pub trait ElementContainer: Send + Sync {
    fn append_child(&self, child: Arc<dyn OverlayElement>);
    fn remove_child(&self, child: &dyn OverlayElement) -> Result<()>;
}

/// The document the session runs in.
pub trait Document: Send + Sync {
    fn create_overlay(&self) -> Arc<dyn OverlayElement>;
    fn body(&self) -> Arc<dyn ElementContainer>;
}
