//! ImageryProvider trait and implementations
//!
//! The provider is the seam between the compositor and the remote imagery
//! service: a pull-only query returning zero or more time-stamped rasters.
//! Keeping the network behind this trait makes the partitioner and
//! compositor fully unit-testable without network access.
//!
//! Implementations:
//! - [`RemoteCollection`]: one collection of the imagery service (production)
//! - [`MemoryCollection`]: in-memory fixture (dev/test mode)

use async_trait::async_trait;

use crate::compositor::window::TimeRange;
use crate::earthdata::error::Result;
use crate::earthdata::raster::{RasterImage, Region};

mod memory;
mod remote;

pub use memory::MemoryCollection;
pub use remote::RemoteCollection;

/// Pull-only query interface over a collection of source images.
#[async_trait]
pub trait ImageryProvider: Send + Sync {
    /// Fetch all source images intersecting `region` whose timestamp falls
    /// in `[range.start, range.end)`, restricted to the named bands.
    ///
    /// Read-only; the provider owns timeout and retry policy.
    async fn query(
        &self,
        region: &Region,
        range: &TimeRange,
        bands: &[String],
    ) -> Result<Vec<RasterImage>>;
}
