//! Append-only, tag-addressable event log contract.
//!
//! The durable log itself is an external collaborator. This crate defines the
//! interface the rest of beltline consumes (`EventLog`) plus an in-memory
//! implementation used by the demo programs and tests. Consumers provide
//! their own event types that serialize to `serde_json::Value`.

pub mod log;
pub mod memory;
pub mod types;

pub use log::{EventLog, EventStream, LogError};
pub use memory::MemoryEventLog;
pub use types::{Ack, AppendEvent, StoredEvent, TagFilter};
