//! Common types and utilities shared across the in-page search crates.
//!
//! This crate defines the wire protocol spoken between the search session and
//! its overlay window, observability helpers, and the shared error type used
//! throughout the workspace. It is intentionally lightweight so that every
//! crate can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`protocol`]: request ids, find options, found-in-page results and the
//!   channel-tagged messages exchanged with the overlay
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`InPageError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use inpage_common::protocol::{AgentMessage, FindOptions};
//!
//! let msg = AgentMessage::Query("foo".into());
//! assert_eq!(msg.channel(), "inpage-search:query");
//! assert!(FindOptions::continuation(true).find_next);
//! ```

pub mod observability;
pub mod protocol;

/// Error types used across the in-page search system.
#[derive(thiserror::Error, Debug)]
pub enum InPageError {
    /// An operation was invoked in a session state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A host primitive (surface, element, container) reported an error.
    #[error("Host error: {0}")]
    Host(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host surface does not offer the requested registration path.
    #[error("Unsupported by host surface: {0}")]
    Unsupported(&'static str),

    /// The mailbox of a running session or agent is gone.
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

/// Convenient alias for results that use [`InPageError`].
pub type Result<T> = std::result::Result<T, InPageError>;
