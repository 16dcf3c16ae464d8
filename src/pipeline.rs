//! Shared compositing pipeline
//!
//! The run logic shared between the operator binary and tests. The
//! pipeline:
//! 1. Validates the configuration and partitions the date range
//! 2. Builds one mean composite per window via the provider
//! 3. Renders the surviving composites to labeled frames
//! 4. Exports the ordered frame sequence
//!
//! Empty composites (windows without any source image) are dropped before
//! rendering; failed windows are handled per the configured
//! [`crate::compositor::FailurePolicy`].

use crate::compositor::{composite_range, CompositeRun};
use crate::config::{OperatorConfig, RunMode};
use crate::earthdata::error::Result;
use crate::earthdata::provider::ImageryProvider;
use crate::render::{FrameRenderer, RenderedFrame, SequenceExporter};

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunSummary {
    /// Windows the range was partitioned into.
    pub windows: usize,
    /// Frames actually rendered and exported.
    pub frames: usize,
    /// Windows dropped because no source image fell inside them.
    pub dropped_empty: usize,
    /// Window indices whose queries failed (Partial policy only).
    pub failed_windows: Vec<usize>,
    pub output: std::path::PathBuf,
}

/// Run the operator: composite, render, export.
///
/// `Still` mode composites the whole range into a single frame; `Animate`
/// mode produces one frame per window. The renderer and exporter are
/// caller-supplied collaborators; the pipeline hands them composites and
/// frames in window order and never inspects visualization parameters.
pub async fn run<P>(
    provider: &P,
    config: &OperatorConfig,
    renderer: &dyn FrameRenderer,
    exporter: &dyn SequenceExporter,
) -> Result<RunSummary>
where
    P: ImageryProvider + ?Sized,
{
    println!("\n[1/4] Validating configuration...");
    config.validate()?;
    let range = config.time_range()?;
    let bands = config.effective_bands();
    let vis = config.effective_vis();

    // Still mode is the one-window special case of the same driver.
    let length_days = match config.mode {
        RunMode::Animate => config.composite_days,
        RunMode::Still => range.num_days().max(1) as u32,
    };

    println!(
        "  Product: {} ({})",
        config.product,
        config.product.collection()
    );
    println!("  Range: {} to {}", range.start, range.end);
    println!("  Window length: {} day(s)", length_days);
    println!("  Bands: {:?}", bands);
    println!("  Palette: {} [{}, {}]", vis.palette, vis.min, vis.max);

    println!("\n[2/4] Building composites...");
    let CompositeRun {
        composites,
        failures,
    } = composite_range(
        provider,
        &config.region,
        &range,
        length_days,
        &bands,
        config.concurrency,
        config.failure_policy,
    )
    .await?;

    let windows = composites.len() + failures.len();
    println!(
        "  {} window(s), {} composite(s), {} failure(s)",
        windows,
        composites.len(),
        failures.len()
    );
    for (index, error) in &failures {
        eprintln!("⚠ window {} failed: {}", index, error);
    }

    println!("\n[3/4] Rendering frames...");
    let mut frames: Vec<RenderedFrame> = Vec::with_capacity(composites.len());
    let mut dropped_empty = 0;
    for composite in &composites {
        match &composite.image {
            Some(image) => {
                frames.push(renderer.render(image, &vis, &composite.label)?);
            }
            None => {
                // Reference behavior: empty composites are filtered out,
                // not rendered as blank frames.
                dropped_empty += 1;
                println!(
                    "  Window {} ({}) is empty, dropped",
                    composite.window.index, composite.label
                );
            }
        }
    }
    println!(
        "  {} frame(s) rendered, {} empty window(s) dropped",
        frames.len(),
        dropped_empty
    );

    println!("\n[4/4] Exporting to {}...", config.output.display());
    if frames.is_empty() {
        println!("⚠ No frames to export, skipping");
    } else {
        exporter.export(&frames, config.fps, &config.output)?;
        println!("✓ Exported {} frame(s)", frames.len());
    }

    Ok(RunSummary {
        windows,
        frames: frames.len(),
        dropped_empty,
        failed_windows: failures.into_iter().map(|(index, _)| index).collect(),
        output: config.output.clone(),
    })
}

/// Build the server-side video export request matching an animation run.
pub fn video_export_request(
    config: &OperatorConfig,
) -> crate::earthdata::export::VideoExportRequest {
    let vis = config.effective_vis();
    let palette = crate::render::PALETTE_REGISTRY
        .get(&vis.palette)
        .map(|p| p.colors.clone())
        .unwrap_or_default();
    crate::earthdata::export::VideoExportRequest {
        description: config.effective_video_description(),
        collection: config.product.collection().to_string(),
        region: config.region.clone(),
        start_date: config.start_date.format("%Y-%m-%d").to_string(),
        end_date: config.end_date.format("%Y-%m-%d").to_string(),
        composite_days: config.composite_days,
        band: vis.band.clone(),
        min: vis.min,
        max: vis.max,
        palette,
        frames_per_second: config.fps,
        dimensions: config.dimensions,
    }
}
