//! Service layer for the location-sharing server.
//! - Domain records and request validation live in `tracking::domain`.
//! - `tracking::TrackingStore` is the seam the HTTP layer depends on.
//! - `tracking::MemoryTrackingStore` keeps everything in process memory.

pub mod errors;
pub mod runtime;
pub mod tracking;
