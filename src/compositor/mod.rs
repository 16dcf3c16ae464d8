//! Deterministic fixed-window temporal compositing
//!
//! The only local algorithmic core of the operator:
//! - `window.rs`: pure partitioning of a date range into fixed windows
//! - `composite.rs`: per-window mean reduction and the range driver
//!
//! Everything here is unit-testable without network access; the remote
//! service only enters through the [`crate::earthdata::ImageryProvider`]
//! seam.

pub mod composite;
pub mod window;

// Re-exports for convenience
pub use composite::{composite, composite_range, Composite, CompositeRun, FailurePolicy};
pub use window::{partition, TimeRange, Window};
