//! Mean composites over fixed windows
//!
//! [`composite`] reduces the source images of one window to a per-pixel,
//! per-band mean. [`composite_range`] drives a whole date range: one
//! provider query per window, optionally concurrent with a bounded limit,
//! with the output always ordered by window index.
//!
//! Masked pixels (NaN) do not contribute to a pixel's mean; a pixel masked
//! in every contributing image stays masked in the composite.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::earthdata::error::{EarthdataError, Result};
use crate::earthdata::provider::ImageryProvider;
use crate::earthdata::raster::{Band, RasterImage, Region};

use super::window::{partition, TimeRange, Window};

/// One aggregate raster per window.
///
/// `image` is `None` when no source image fell inside the window (the
/// empty-subset case). The pipeline drops empty composites before
/// rendering; callers that need one composite per window can inspect the
/// sequence before that filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub window: Window,
    pub label: String,
    pub image: Option<RasterImage>,
}

impl Composite {
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }
}

/// What to do when a window's remote query fails. The caller always
/// chooses; there is no hidden default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the remaining windows on the first error.
    #[default]
    FailFast,
    /// Keep going; report per-window failures alongside the composites.
    Partial,
}

/// Outcome of [`composite_range`]: composites sorted by window index, plus
/// the failed window indices when running under `FailurePolicy::Partial`.
#[derive(Debug)]
pub struct CompositeRun {
    pub composites: Vec<Composite>,
    pub failures: Vec<(usize, EarthdataError)>,
}

/// Reduce the images whose timestamp falls in `[window.start, window.end)`
/// to one mean composite over the named bands.
///
/// All contributing grids of a band must agree in shape; the composite is
/// stamped with the window's start timestamp.
pub fn composite(images: &[RasterImage], window: &Window, bands: &[String]) -> Result<Composite> {
    let selected: Vec<&RasterImage> = images
        .iter()
        .filter(|img| img.timestamp_date().map(|d| window.contains(d)).unwrap_or(false))
        .collect();

    let label = window.label();
    if selected.is_empty() {
        return Ok(Composite {
            window: window.clone(),
            label,
            image: None,
        });
    }

    let mut mean_bands = Vec::with_capacity(bands.len());
    for band_name in bands {
        mean_bands.push(mean_band(&selected, band_name)?);
    }

    let image = RasterImage::new(
        format!("composite/{}", window.start.format("%Y-%m-%d")),
        window.start_millis(),
        mean_bands,
    );
    Ok(Composite {
        window: window.clone(),
        label,
        image: Some(image),
    })
}

/// Per-pixel mean of one band across the selected images.
fn mean_band(images: &[&RasterImage], band_name: &str) -> Result<Band> {
    let mut shape: Option<(u32, u32)> = None;
    let mut sums: Vec<f64> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();

    for img in images {
        let band = img.band(band_name).ok_or_else(|| {
            EarthdataError::ShapeMismatch(format!(
                "image '{}' is missing band '{}'",
                img.id, band_name
            ))
        })?;

        match shape {
            None => {
                shape = Some((band.width, band.height));
                sums = vec![0.0; band.values.len()];
                counts = vec![0; band.values.len()];
            }
            Some((w, h)) if w != band.width || h != band.height => {
                return Err(EarthdataError::ShapeMismatch(format!(
                    "band '{}' is {}x{} in image '{}' but {}x{} in earlier images",
                    band_name, band.width, band.height, img.id, w, h
                )));
            }
            Some(_) => {}
        }

        for (i, v) in band.values.iter().enumerate() {
            if !v.is_nan() {
                sums[i] += v;
                counts[i] += 1;
            }
        }
    }

    let (width, height) = shape.unwrap_or((0, 0));
    let values = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c == 0 { f64::NAN } else { s / f64::from(c) })
        .collect();
    Band::new(band_name, width, height, values)
}

/// Composite an entire date range: partition into windows of
/// `length_days`, issue one provider query per window (clamped to the
/// range end), and mean-reduce each window's images.
///
/// Up to `concurrency` window queries run at a time; results are emitted
/// in window-index order regardless of completion order. Under
/// `FailurePolicy::FailFast` the first failure aborts the remaining
/// windows; under `Partial`, failures are collected per window index and
/// the surviving composites are still returned in order.
pub async fn composite_range<P>(
    provider: &P,
    region: &Region,
    range: &TimeRange,
    length_days: u32,
    bands: &[String],
    concurrency: usize,
    policy: FailurePolicy,
) -> Result<CompositeRun>
where
    P: ImageryProvider + ?Sized,
{
    // Validation errors abort before any remote call.
    let windows = partition(range, length_days)?;
    let global_end = range.end;

    let queries = windows.into_iter().map(|window| {
        // Images are only requested inside [window.start, range.end).
        let query_range = TimeRange {
            start: window.start,
            end: window.end.min(global_end),
        };
        async move {
            let index = window.index;
            let run = async {
                let images = provider.query(region, &query_range, bands).await?;
                composite(&images, &window, bands)
            };
            run.await.map_err(|e| e.for_window(index))
        }
    });

    // `buffered` preserves input order, which is window-index order.
    let results = stream::iter(queries).buffered(concurrency.max(1));

    match policy {
        FailurePolicy::FailFast => {
            let composites = results.try_collect().await?;
            Ok(CompositeRun {
                composites,
                failures: Vec::new(),
            })
        }
        FailurePolicy::Partial => {
            let outcomes: Vec<Result<Composite>> = results.collect().await;
            let mut composites = Vec::with_capacity(outcomes.len());
            let mut failures = Vec::new();
            for (index, outcome) in outcomes.into_iter().enumerate() {
                match outcome {
                    Ok(c) => composites.push(c),
                    Err(e) => failures.push((e.window().unwrap_or(index), e)),
                }
            }
            Ok(CompositeRun {
                composites,
                failures,
            })
        }
    }
}
