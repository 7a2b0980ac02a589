//! Runtime shim over a captured web-chat client.
//!
//! The shim attaches to a structural capture of the host's module registry,
//! discovers capabilities by shape rather than by name, assembles a facade
//! over them, and exposes contact/chat/group/message access plus two
//! sanctioned mutations (sending, consuming seen flags).

pub mod cursor;
pub mod domain;
pub mod error;
pub mod facade;
pub mod flatten;
pub mod host;
pub mod output;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use error::{Result, ShimError};
pub use service::{Gateway, UnreadBatch};
