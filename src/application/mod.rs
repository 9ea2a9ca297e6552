//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).
//! Handlers that write a text or its amendments serialize on [`TextLocks`].

pub mod handlers;
mod text_locks;

pub use handlers::*;
pub use text_locks::{TextGuard, TextLocks};
