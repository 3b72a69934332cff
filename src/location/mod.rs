//! Location primitives for the tracker.
//!
//! Provides the value types exchanged with the positioning provider:
//! - [`Coordinates`]: a validated latitude/longitude pair
//! - [`LocationFix`]: a provider fix with accuracy and timestamp
//! - Great-circle distance between fixes
//! - Deterministic region identifiers built from a coordinate
//!
//! # Example Usage
//!
//! ```
//! use fencetrack::location::{region_identifier, LocationFix};
//!
//! let here = LocationFix::new(37.7749, -122.4194);
//! let there = LocationFix::new(37.7776, -122.4194);
//!
//! // About 300 m north
//! let moved = here.distance_from(&there);
//! assert!(moved > 250.0 && moved < 350.0);
//!
//! let id = region_identifier("fencetrack", here.coordinates);
//! assert!(id.starts_with("fencetrack:"));
//! ```

pub mod geometry;
pub mod types;

pub use geometry::{distance_meters, region_identifier};
pub use types::{Coordinates, LocationFix};
