//! Host registry discovery: structural probes over the captured module table.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial module layout

pub mod probe;
pub mod scanner;

pub use probe::{default_probes, CapabilityProbe};
pub use scanner::{scan, ResolvedCapability};
