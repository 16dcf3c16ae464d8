//! MemoryCollection - ImageryProvider over in-memory fixtures
//!
//! Dev/test counterpart of [`super::RemoteCollection`]: serves a fixed set
//! of rasters with the same filtering semantics the remote service applies
//! (half-open date range, band selection). The region is not evaluated;
//! fixtures are assumed to cover the region of interest.

use async_trait::async_trait;

use crate::compositor::window::TimeRange;
use crate::earthdata::error::Result;
use crate::earthdata::raster::{RasterImage, Region};

use super::ImageryProvider;

/// In-memory image collection for development and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    images: Vec<RasterImage>,
}

impl MemoryCollection {
    pub fn new(images: Vec<RasterImage>) -> Self {
        MemoryCollection { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[async_trait]
impl ImageryProvider for MemoryCollection {
    async fn query(
        &self,
        _region: &Region,
        range: &TimeRange,
        bands: &[String],
    ) -> Result<Vec<RasterImage>> {
        let selected = self
            .images
            .iter()
            .filter(|img| {
                img.timestamp_date()
                    .map(|d| d >= range.start && d < range.end)
                    .unwrap_or(false)
            })
            .map(|img| {
                let kept = img
                    .bands
                    .iter()
                    .filter(|b| bands.is_empty() || bands.iter().any(|n| n == &b.name))
                    .cloned()
                    .collect();
                RasterImage::new(img.id.clone(), img.time_start_ms, kept)
            })
            .collect();
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earthdata::raster::Band;
    use chrono::NaiveDate;

    fn image(id: &str, date: NaiveDate) -> RasterImage {
        let ms = date
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp_millis();
        let band = Band::new("co", 1, 1, vec![1.0]).unwrap();
        let other = Band::new("h2o", 1, 1, vec![2.0]).unwrap();
        RasterImage::new(id, ms, vec![band, other])
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn filters_by_half_open_range_and_band() {
        let provider = MemoryCollection::new(vec![
            image("a", date(2024, 6, 1)),
            image("b", date(2024, 6, 4)),
            image("c", date(2024, 6, 5)),
        ]);
        let range = TimeRange::new(date(2024, 6, 1), date(2024, 6, 5)).unwrap();
        let region = Region::bbox(-92.0, -56.0, -30.0, 13.0);
        let images = provider
            .query(&region, &range, &["co".to_string()])
            .await
            .unwrap();

        // "c" sits on the exclusive end and is left out
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.band("co").is_some()));
        assert!(images.iter().all(|i| i.band("h2o").is_none()));
    }
}
