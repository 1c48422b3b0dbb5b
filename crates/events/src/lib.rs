//! Domain events and their in-process distribution.
//!
//! Aggregates record facts as [`Event`]s; the application layer wraps them in
//! an [`EventEnvelope`] and publishes them on an [`EventBus`] once the write
//! that produced them has been persisted.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
