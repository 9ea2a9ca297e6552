//! Event bus adapters.
//!
//! - `InMemoryEventBus` - In-process bus; handlers run inline on publish

mod in_memory;

pub use in_memory::InMemoryEventBus;
