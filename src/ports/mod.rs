//! Ports - Interfaces between the domain and the outside world.
//!
//! # Storage
//!
//! - `TextRepository` - Text aggregate persistence
//! - `AmendRepository` - Amend aggregate persistence
//! - `ResolutionStore` - Atomic write of one resolution
//!
//! # Events
//!
//! - `EventPublisher` - Publishing domain events
//! - `EventSubscriber` / `EventHandler` - Reacting to domain events

mod amend_repository;
mod event_bus;
mod resolution_store;
mod text_repository;

pub use amend_repository::AmendRepository;
pub use event_bus::{EventHandler, EventPublisher, EventSubscriber};
pub use resolution_store::{stale_changeset, ResolutionChangeset, ResolutionStore};
pub use text_repository::TextRepository;
