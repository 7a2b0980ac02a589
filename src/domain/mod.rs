//! Acyclic domain records over the live host graph.
//!
//! The live graph is cyclic (message -> chat -> message list -> message).
//! Records here keep relationships as canonical identifier references
//! instead of embedded objects, so they serialize without any stripping
//! beyond the flattener's.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial module layout

pub mod arena;
pub mod id;
pub mod records;

pub use arena::DomainArena;
pub use id::{canonical_id, EntityId};
pub use records::{
    ChatRecord, ContactRecord, GroupMetadataRecord, LiveMessage, MessageRecord, ParticipantRecord,
};
