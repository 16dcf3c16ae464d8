//! Operator configuration
//!
//! Configuration is loaded from a JSON file; credentials never live there
//! and always come from the environment (see
//! [`crate::earthdata::EarthdataClient::from_env`]). Every product carries
//! the reference defaults for its collection, band, date range, and
//! visualization, so a config file only has to say what differs.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compositor::window::TimeRange;
use crate::compositor::FailurePolicy;
use crate::earthdata::error::{EarthdataError, Result};
use crate::earthdata::raster::Region;
use crate::render::VisParams;

/// Sentinel-5P trace-gas product handled by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Co,
    No2,
    Hcho,
}

impl Product {
    /// Image collection id on the imagery service.
    pub fn collection(&self) -> &'static str {
        match self {
            Product::Co => "COPERNICUS/S5P/NRTI/L3_CO",
            Product::No2 => "COPERNICUS/S5P/NRTI/L3_NO2",
            Product::Hcho => "COPERNICUS/S5P/NRTI/L3_HCHO",
        }
    }

    /// Default band selection.
    pub fn band(&self) -> &'static str {
        match self {
            Product::Co => "CO_column_number_density",
            Product::No2 => "NO2_column_number_density",
            Product::Hcho => "tropospheric_HCHO_column_number_density",
        }
    }

    /// Default visualization for a run mode. The CO animation uses a
    /// tighter value range and a different ramp than the CO still map;
    /// the other products share one visualization for both modes.
    pub fn default_vis(&self, mode: RunMode) -> VisParams {
        match (self, mode) {
            (Product::Co, RunMode::Animate) => VisParams {
                band: self.band().to_string(),
                min: 0.0,
                max: 0.05,
                palette: "co-animation".to_string(),
            },
            (Product::Co, RunMode::Still) => VisParams {
                band: self.band().to_string(),
                min: 0.0,
                max: 0.15,
                palette: "co-detailed".to_string(),
            },
            (Product::No2, _) => VisParams {
                band: self.band().to_string(),
                min: 0.0,
                max: 0.0002,
                palette: "trace-gas".to_string(),
            },
            (Product::Hcho, _) => VisParams {
                band: self.band().to_string(),
                min: 0.0,
                max: 0.0003,
                palette: "trace-gas".to_string(),
            },
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "co" => Some(Product::Co),
            "no2" => Some(Product::No2),
            "hcho" => Some(Product::Hcho),
            _ => None,
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Product::Co => "co",
            Product::No2 => "no2",
            Product::Hcho => "hcho",
        };
        write!(f, "{}", name)
    }
}

/// Output mode of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One whole-range mean composite, exported as a PNG still.
    Still,
    /// Windowed composites, exported as an animated GIF.
    Animate,
}

impl RunMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "still" => Some(RunMode::Still),
            "animate" | "animation" => Some(RunMode::Animate),
            _ => None,
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_fps() -> u32 {
    1
}

fn default_dimensions() -> u32 {
    800
}

/// Full configuration of one operator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub product: Product,
    pub mode: RunMode,
    /// Region of interest polygon.
    pub region: Region,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days per composite window (animate mode).
    pub composite_days: u32,
    /// Bands to composite; empty means the product default band.
    pub bands: Vec<String>,
    /// Visualization override; None means the product default.
    pub vis: Option<VisParams>,
    /// What to do when a window's query fails.
    pub failure_policy: FailurePolicy,
    /// Concurrent window queries (1 = sequential call-and-wait).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Longest dimension of a server-side video export, in pixels.
    #[serde(default = "default_dimensions")]
    pub dimensions: u32,
    /// Boundary dataset drawn over animation frames; None disables the
    /// overlay.
    pub borders: Option<String>,
    /// Output file for the local export (GIF or PNG).
    pub output: PathBuf,
    /// Also request a server-side video export after an animation run.
    pub export_video: bool,
    /// Description of the server-side export task; None derives one from
    /// the product.
    pub video_description: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        OperatorConfig::for_product(Product::Co, RunMode::Animate)
    }
}

impl OperatorConfig {
    /// Reference defaults for a product and mode: the Latin America
    /// region, the date ranges of the reference runs, 4-day windows.
    pub fn for_product(product: Product, mode: RunMode) -> Self {
        let (start, end) = match (product, mode) {
            (_, RunMode::Animate) => ("2024-06-01", "2024-10-04"),
            (Product::Co, RunMode::Still) => ("2024-09-20", "2024-10-01"),
            (Product::No2, RunMode::Still) => ("2024-09-20", "2024-10-03"),
            (Product::Hcho, RunMode::Still) => ("2024-09-15", "2024-10-03"),
        };
        let extension = match mode {
            RunMode::Still => "png",
            RunMode::Animate => "gif",
        };
        OperatorConfig {
            product,
            mode,
            region: Region::bbox(-92.0, -56.0, -30.0, 13.0),
            // The literals above are valid ISO dates; parse cannot fail.
            start_date: start.parse().unwrap_or_default(),
            end_date: end.parse().unwrap_or_default(),
            composite_days: 4,
            bands: Vec::new(),
            vis: None,
            failure_policy: FailurePolicy::FailFast,
            concurrency: default_concurrency(),
            fps: default_fps(),
            dimensions: default_dimensions(),
            // Animations carry country borders like the reference GIF;
            // still maps do not.
            borders: match mode {
                RunMode::Animate => Some("USDOS/LSIB_SIMPLE/2017".to_string()),
                RunMode::Still => None,
            },
            output: PathBuf::from(format!("{}_composite.{}", product, extension)),
            export_video: false,
            video_description: None,
        }
    }

    /// Load a configuration from a JSON file. Missing fields fall back to
    /// the CO animation defaults, so partial files are fine.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EarthdataError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: OperatorConfig = serde_json::from_str(&text).map_err(|e| {
            EarthdataError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the parts that would otherwise only fail mid-run.
    pub fn validate(&self) -> Result<()> {
        self.time_range()?;
        if self.mode == RunMode::Animate && self.composite_days == 0 {
            return Err(EarthdataError::InvalidWindow(
                "composite_days must be positive".to_string(),
            ));
        }
        if self.region.vertices.len() < 3 {
            return Err(EarthdataError::Config(
                "region polygon needs at least 3 vertices".to_string(),
            ));
        }
        if self.fps == 0 {
            return Err(EarthdataError::Config("fps must be positive".to_string()));
        }
        Ok(())
    }

    /// The validated time range of the run.
    pub fn time_range(&self) -> Result<TimeRange> {
        TimeRange::new(self.start_date, self.end_date)
    }

    /// Band selection with the product default applied.
    pub fn effective_bands(&self) -> Vec<String> {
        if self.bands.is_empty() {
            vec![self.product.band().to_string()]
        } else {
            self.bands.clone()
        }
    }

    /// Visualization with the product default applied.
    pub fn effective_vis(&self) -> VisParams {
        self.vis
            .clone()
            .unwrap_or_else(|| self.product.default_vis(self.mode))
    }

    /// Description for a server-side video export task.
    pub fn effective_video_description(&self) -> String {
        self.video_description
            .clone()
            .unwrap_or_else(|| format!("{}_composite_animation", self.product))
    }
}
