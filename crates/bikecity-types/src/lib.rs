//! Shared types for the bikecity crates: the status sink used by the HUD readouts.

pub mod status;

pub use status::{MemoryStatusSink, StatusColor, StatusElement, StatusEntry, StatusSink};
