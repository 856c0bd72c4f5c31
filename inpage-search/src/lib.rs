//! In-page text search sessions.
//!
//! An [`InPageSearch`] drives find-in-page on one search target (window
//! contents or an embedded content frame) on behalf of an overlay UI agent
//! hosted in a separate element. The host supplies the primitives through the
//! traits in [`host`]; [`memory`] is a complete in-memory host.
//!
//! # Overview
//!
//! - [`session`]: the session controller and its mailbox contract
//! - [`bootstrap`]: [`search_in_page`], building a session from settings
//! - [`agent`]: display state and key handling of the overlay
//! - [`capability`]: per-kind find capability, resolved once per target
//! - [`focus`]: the refocus policy applied after find calls
//! - [`events`]: public lifecycle events
//!
//! # Examples
//!
//! ```rust
//! use inpage_search::memory::{MemoryContents, MemoryDocument};
//! use inpage_search::{search_in_page, InPageSearchOptions, SessionInput, SessionMailbox};
//! use inpage_common::protocol::AgentMessage;
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Queue(Mutex<Vec<SessionInput>>);
//! impl SessionMailbox for Queue {
//!     fn post(&self, input: SessionInput) {
//!         self.0.lock().unwrap().push(input);
//!     }
//!     fn post_after(&self, input: SessionInput, _: Duration) {
//!         self.post(input);
//!     }
//! }
//!
//! let document = MemoryDocument::new();
//! let queue = Arc::new(Queue::default());
//! let mut search = search_in_page(
//!     Arc::new(MemoryContents::new("foo bar foo")),
//!     InPageSearchOptions::default(),
//!     &document,
//!     queue.clone(),
//! )?;
//!
//! search.open_search_window()?;
//! search.handle_input(SessionInput::Agent(AgentMessage::Query("foo".into())))?;
//! loop {
//!     let pending = std::mem::take(&mut *queue.0.lock().unwrap());
//!     if pending.is_empty() {
//!         break;
//!     }
//!     for input in pending {
//!         search.handle_input(input)?;
//!     }
//! }
//! assert_eq!(search.active_match(), (1, 2));
//! # Ok::<(), inpage_common::InPageError>(())
//! ```

pub mod agent;
pub mod bootstrap;
pub mod capability;
pub mod events;
pub mod focus;
pub mod host;
pub mod memory;
pub mod session;

pub use agent::{OverlayAgent, UiEvent};
pub use bootstrap::{search_in_page, InPageSearchOptions};
pub use capability::TargetKind;
pub use events::{EventEmitter, EventKind, SearchEvent};
pub use session::{InPageSearch, SessionInput, SessionMailbox, SessionSnapshot};
