//! Fencetrack Library
//!
//! Battery-efficient background location tracking. After each fix the
//! tracker monitors a single exit-only region around it instead of keeping
//! GPS running, and resumes updates only when the device leaves.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod location;
pub mod tracker;

pub use tracker::{LocationTracker, TrackerConfiguration, TrackerDelegate};
