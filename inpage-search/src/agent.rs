//! Overlay UI agent: the input box, navigation buttons and match counter
//! living inside the overlay.
//!
//! The agent keeps only display state. User interaction becomes at most one
//! [`AgentMessage`] for the controller; controller messages update the
//! display.
use inpage_common::protocol::{AgentMessage, ControllerMessage};
use tracing::trace;

const EMPTY_COUNTER: &str = "0/0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub code: KeyCode,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(code: KeyCode) -> Self {
        Self { code, ctrl: false }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self { code, ctrl: true }
    }
}

/// User interaction inside the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The input box now holds this text.
    Input(String),
    SubmitClick,
    BackClick,
    ForwardClick,
    CloseClick,
    KeyDown(KeyPress),
    CompositionStart,
    CompositionEnd,
}

/// What the overlay currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDisplay {
    pub input: String,
    pub counter: String,
    pub focused: bool,
}

#[derive(Debug, Clone)]
pub struct OverlayAgent {
    input: String,
    counter: String,
    composing: bool,
    focused: bool,
}

impl Default for OverlayAgent {
    fn default() -> Self {
        Self {
            input: String::new(),
            counter: EMPTY_COUNTER.to_string(),
            composing: false,
            focused: false,
        }
    }
}

impl OverlayAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> AgentDisplay {
        AgentDisplay {
            input: self.input.clone(),
            counter: self.counter.clone(),
            focused: self.focused,
        }
    }

    /// Apply a user interaction; returns the message to send to the host, if any.
    ///
    /// ```
    /// use inpage_search::agent::{KeyCode, KeyPress, OverlayAgent, UiEvent};
    /// use inpage_common::protocol::AgentMessage;
    ///
    /// let mut agent = OverlayAgent::new();
    /// assert_eq!(agent.handle_ui(UiEvent::SubmitClick), None);
    /// agent.handle_ui(UiEvent::Input("foo".into()));
    /// assert_eq!(
    ///     agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter))),
    ///     Some(AgentMessage::Query("foo".into()))
    /// );
    /// ```
    pub fn handle_ui(&mut self, event: UiEvent) -> Option<AgentMessage> {
        let out = match event {
            UiEvent::Input(text) => {
                self.input = text;
                None
            }
            UiEvent::SubmitClick if self.input.is_empty() => None,
            UiEvent::SubmitClick => Some(AgentMessage::Query(self.input.clone())),
            UiEvent::BackClick => Some(AgentMessage::Back(self.carried_input())),
            UiEvent::ForwardClick => Some(AgentMessage::Forward(self.carried_input())),
            UiEvent::CloseClick => Some(AgentMessage::Close),
            UiEvent::KeyDown(_) if self.composing => None,
            UiEvent::KeyDown(key) => self.on_key(key),
            UiEvent::CompositionStart => {
                self.composing = true;
                None
            }
            UiEvent::CompositionEnd => {
                self.composing = false;
                None
            }
        };
        if let Some(msg) = &out {
            trace!(target: "inpage.agent", channel = msg.channel(), "to host");
        }
        out
    }

    pub fn handle_host(&mut self, msg: ControllerMessage) {
        trace!(target: "inpage.agent", channel = msg.channel(), "from host");
        match msg {
            ControllerMessage::Focus => self.focused = true,
            ControllerMessage::Result { nth, all } => self.counter = format!("{nth}/{all}"),
            ControllerMessage::Close => {
                self.input.clear();
                self.counter = EMPTY_COUNTER.to_string();
                self.focused = false;
            }
        }
    }

    fn on_key(&self, key: KeyPress) -> Option<AgentMessage> {
        match key.code {
            // empty input still goes out; the controller closes on it
            KeyCode::Enter => Some(AgentMessage::Query(self.input.clone())),
            KeyCode::Escape => Some(AgentMessage::Close),
            KeyCode::Char('g' | 'G') if key.ctrl => Some(AgentMessage::Close),
            KeyCode::Char(_) => None,
        }
    }

    fn carried_input(&self) -> Option<String> {
        (!self.input.is_empty()).then(|| self.input.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> OverlayAgent {
        let mut agent = OverlayAgent::new();
        agent.handle_ui(UiEvent::Input(text.into()));
        agent
    }

    #[test]
    fn counter_starts_empty() {
        assert_eq!(OverlayAgent::new().display().counter, "0/0");
    }

    #[test]
    fn enter_with_empty_input_still_queries() {
        let mut agent = OverlayAgent::new();
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter))),
            Some(AgentMessage::Query(String::new()))
        );
    }

    #[test]
    fn navigation_carries_input_when_present() {
        let mut agent = OverlayAgent::new();
        assert_eq!(agent.handle_ui(UiEvent::BackClick), Some(AgentMessage::Back(None)));

        let mut agent = typed("foo");
        assert_eq!(
            agent.handle_ui(UiEvent::ForwardClick),
            Some(AgentMessage::Forward(Some("foo".into())))
        );
    }

    #[test]
    fn escape_and_ctrl_g_close() {
        let mut agent = typed("foo");
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Escape))),
            Some(AgentMessage::Close)
        );
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::ctrl(KeyCode::Char('g')))),
            Some(AgentMessage::Close)
        );
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Char('g')))),
            None
        );
        assert_eq!(agent.handle_ui(UiEvent::CloseClick), Some(AgentMessage::Close));
    }

    #[test]
    fn keys_are_swallowed_while_composing() {
        let mut agent = typed("ほげ");
        agent.handle_ui(UiEvent::CompositionStart);
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter))),
            None
        );
        agent.handle_ui(UiEvent::CompositionEnd);
        assert_eq!(
            agent.handle_ui(UiEvent::KeyDown(KeyPress::plain(KeyCode::Enter))),
            Some(AgentMessage::Query("ほげ".into()))
        );
    }

    #[test]
    fn host_messages_update_display() {
        let mut agent = typed("foo");
        agent.handle_host(ControllerMessage::Focus);
        agent.handle_host(ControllerMessage::Result { nth: 2, all: 5 });
        assert_eq!(
            agent.display(),
            AgentDisplay {
                input: "foo".into(),
                counter: "2/5".into(),
                focused: true
            }
        );

        agent.handle_host(ControllerMessage::Close);
        let shown = agent.display();
        assert_eq!(shown.input, "");
        assert_eq!(shown.counter, "0/0");
    }
}
