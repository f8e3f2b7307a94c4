//! Contact and location tracking state.

pub mod domain;
pub mod memory;
pub mod store;

pub use memory::MemoryTrackingStore;
pub use store::TrackingStore;
