//! Tokio actors hosting search sessions and overlay agents.
//!
//! A session runs inside a [`session::SessionActor`]; its mailbox doubles as
//! the session's [`inpage_search::SessionMailbox`], so host callbacks,
//! deferred refocus and client requests are processed one at a time in
//! arrival order. Clients talk to it through [`session::SearchHandle`].
pub mod actor;
pub mod agent;
pub mod session;
pub mod system;

pub use agent::{spawn_memory_agent, spawn_overlay_agent, AgentHandle, AgentLink};
pub use session::{spawn_search_session, SearchHandle};
pub use system::ActorSystem;
