//! Data models for the PinCo core engine.
//!
//! These models match the backend JSON wire shapes, with client-side
//! enrichment fields that never round-trip to the server.

mod bookmark;
mod geo;
mod mode;
mod pin;
mod tag;

pub use bookmark::*;
pub use geo::*;
pub use mode::*;
pub use pin::*;
pub use tag::*;
