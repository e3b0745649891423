//! Domain layer types and invariants.

pub mod announcements;
pub mod editing;
pub mod error;
pub mod lightbox;
pub mod staging;
