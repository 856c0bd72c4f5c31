//! Wire types shared by the session controller, the overlay agent and hosts.
//!
//! Messages crossing the overlay boundary are tagged with a namespaced
//! channel name so they can travel as JSON over any IPC transport:
//!
//! ```
//! use inpage_common::protocol::ControllerMessage;
//!
//! let json = serde_json::to_value(ControllerMessage::Result { nth: 1, all: 2 }).unwrap();
//! assert_eq!(json["channel"], "inpage-search:result");
//! assert_eq!(json["args"]["all"], 2);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CHANNEL_QUERY: &str = "inpage-search:query";
pub const CHANNEL_CLOSE: &str = "inpage-search:close";
pub const CHANNEL_BACK: &str = "inpage-search:back";
pub const CHANNEL_FORWARD: &str = "inpage-search:forward";
pub const CHANNEL_FOCUS: &str = "inpage-search:focus";
pub const CHANNEL_RESULT: &str = "inpage-search:result";

/// Correlation token returned by a find call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Options passed along with a find call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    /// Search direction; `None` leaves the host default (forward).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<bool>,
    /// Continuation flag: advance within the current query instead of restarting.
    #[serde(default)]
    pub find_next: bool,
}

impl FindOptions {
    /// Options for advancing an existing query in the given direction.
    pub fn continuation(forward: bool) -> Self {
        Self {
            forward: Some(forward),
            find_next: true,
        }
    }
}

/// What to do with the current selection when a search is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopFindAction {
    ClearSelection,
    KeepSelection,
    ActivateSelection,
}

/// One result notification delivered by the host for a find request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundInPageResult {
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_match_ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<u32>,
    #[serde(default)]
    pub final_update: bool,
}

/// Messages sent by the overlay agent to the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args")]
pub enum AgentMessage {
    #[serde(rename = "inpage-search:query")]
    Query(String),
    #[serde(rename = "inpage-search:close")]
    Close,
    #[serde(rename = "inpage-search:back")]
    Back(Option<String>),
    #[serde(rename = "inpage-search:forward")]
    Forward(Option<String>),
}

impl AgentMessage {
    pub fn channel(&self) -> &'static str {
        match self {
            AgentMessage::Query(_) => CHANNEL_QUERY,
            AgentMessage::Close => CHANNEL_CLOSE,
            AgentMessage::Back(_) => CHANNEL_BACK,
            AgentMessage::Forward(_) => CHANNEL_FORWARD,
        }
    }
}

/// Messages sent by the session controller to the overlay agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args")]
pub enum ControllerMessage {
    #[serde(rename = "inpage-search:focus")]
    Focus,
    #[serde(rename = "inpage-search:result")]
    Result { nth: u32, all: u32 },
    #[serde(rename = "inpage-search:close")]
    Close,
}

impl ControllerMessage {
    pub fn channel(&self) -> &'static str {
        match self {
            ControllerMessage::Focus => CHANNEL_FOCUS,
            ControllerMessage::Result { .. } => CHANNEL_RESULT,
            ControllerMessage::Close => CHANNEL_CLOSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_messages_use_namespaced_channels() {
        let v = serde_json::to_value(AgentMessage::Forward(Some("foo".into()))).unwrap();
        assert_eq!(v, json!({ "channel": "inpage-search:forward", "args": "foo" }));

        let back: AgentMessage =
            serde_json::from_value(json!({ "channel": "inpage-search:back", "args": null }))
                .unwrap();
        assert_eq!(back, AgentMessage::Back(None));
        assert_eq!(back.channel(), CHANNEL_BACK);
    }

    #[test]
    fn close_shares_a_channel_in_both_directions() {
        assert_eq!(AgentMessage::Close.channel(), ControllerMessage::Close.channel());
        let v = serde_json::to_value(ControllerMessage::Close).unwrap();
        assert_eq!(v["channel"], CHANNEL_CLOSE);
    }

    #[test]
    fn found_result_accepts_partial_payloads() {
        let r: FoundInPageResult =
            serde_json::from_value(json!({ "requestId": 3, "matches": 2 })).unwrap();
        assert_eq!(r.request_id, RequestId(3));
        assert_eq!(r.matches, Some(2));
        assert_eq!(r.active_match_ordinal, None);
        assert!(!r.final_update);
    }

    #[test]
    fn continuation_options_serialize_camel_case() {
        let v = serde_json::to_value(FindOptions::continuation(false)).unwrap();
        assert_eq!(v, json!({ "forward": false, "findNext": true }));
        assert_eq!(
            serde_json::to_value(FindOptions::default()).unwrap(),
            json!({ "findNext": false })
        );
    }
}
