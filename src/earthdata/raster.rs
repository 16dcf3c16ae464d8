//! Raster types returned by the imagery service
//!
//! A [`RasterImage`] is one time-stamped observation over the region of
//! interest, carrying one or more named [`Band`] grids. Pixel values are
//! `f64`; masked (no-data) pixels are NaN, which the compositor skips
//! when averaging.

use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{EarthdataError, Result};

/// Region of interest: an ordered polygon of (lon, lat) vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub vertices: Vec<[f64; 2]>,
}

impl Region {
    pub fn new(vertices: Vec<[f64; 2]>) -> Self {
        Region { vertices }
    }

    /// Rectangular region from bounding coordinates, vertices ordered
    /// NW, SW, SE, NE (the order the reference regions use).
    pub fn bbox(west: f64, south: f64, east: f64, north: f64) -> Self {
        Region {
            vertices: vec![
                [west, north],
                [west, south],
                [east, south],
                [east, north],
            ],
        }
    }

    /// Bounding box as (west, south, east, north).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut west = f64::INFINITY;
        let mut south = f64::INFINITY;
        let mut east = f64::NEG_INFINITY;
        let mut north = f64::NEG_INFINITY;
        for v in &self.vertices {
            west = west.min(v[0]);
            east = east.max(v[0]);
            south = south.min(v[1]);
            north = north.max(v[1]);
        }
        Some((west, south, east, north))
    }
}

/// One named band grid of a source image.
///
/// `values` is row-major, `width * height` long. NaN marks masked pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub values: Vec<f64>,
}

impl Band {
    /// Create a band, validating that the grid shape matches the values.
    pub fn new(name: impl Into<String>, width: u32, height: u32, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(EarthdataError::ShapeMismatch(format!(
                "band '{}' has {} values for a {}x{} grid (expected {})",
                name,
                values.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Band {
            name,
            width,
            height,
            values,
        })
    }

    /// Decode a band from the wire representation: base64-encoded
    /// little-endian f64 pixels.
    pub fn from_base64(name: impl Into<String>, width: u32, height: u32, data: &str) -> Result<Self> {
        let name = name.into();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| EarthdataError::Decode(format!("band '{}': {}", name, e)))?;
        if bytes.len() % 8 != 0 {
            return Err(EarthdataError::Decode(format!(
                "band '{}': payload length {} is not a multiple of 8",
                name,
                bytes.len()
            )));
        }
        let values: Vec<f64> = bytes
            .chunks_exact(8)
            .map(|c| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(c);
                f64::from_le_bytes(buf)
            })
            .collect();
        Band::new(name, width, height, values)
    }

    /// Value at (x, y), or None outside the grid.
    pub fn value_at(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.values[(y * self.width + x) as usize])
    }

    /// True when every pixel is masked.
    pub fn is_fully_masked(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }
}

/// One time-stamped, multi-band raster held by the imagery service.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub id: String,
    /// Acquisition timestamp, epoch milliseconds UTC.
    pub time_start_ms: i64,
    pub bands: Vec<Band>,
}

impl RasterImage {
    pub fn new(id: impl Into<String>, time_start_ms: i64, bands: Vec<Band>) -> Self {
        RasterImage {
            id: id.into(),
            time_start_ms,
            bands,
        }
    }

    /// Look up a band by name.
    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    /// UTC calendar date of the acquisition timestamp. None for
    /// timestamps outside the representable range.
    pub fn timestamp_date(&self) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp_millis(self.time_start_ms).map(|dt| dt.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_f64s(values: &[f64]) -> String {
        let mut bytes = Vec::with_capacity(values.len() * 8);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn bbox_vertex_order() {
        let region = Region::bbox(-92.0, -56.0, -30.0, 13.0);
        assert_eq!(
            region.vertices,
            vec![[-92.0, 13.0], [-92.0, -56.0], [-30.0, -56.0], [-30.0, 13.0]]
        );
        assert_eq!(region.bounds(), Some((-92.0, -56.0, -30.0, 13.0)));
    }

    #[test]
    fn band_shape_validated() {
        let err = Band::new("co", 2, 2, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, EarthdataError::ShapeMismatch(_)));
    }

    #[test]
    fn band_base64_roundtrip() {
        let values = [0.0, 1.5, f64::NAN, -2.25];
        let band = Band::from_base64("co", 2, 2, &encode_f64s(&values)).unwrap();
        assert_eq!(band.value_at(0, 0), Some(0.0));
        assert_eq!(band.value_at(1, 0), Some(1.5));
        assert!(band.value_at(0, 1).unwrap().is_nan());
        assert_eq!(band.value_at(1, 1), Some(-2.25));
        assert_eq!(band.value_at(2, 0), None);
    }

    #[test]
    fn band_base64_rejects_truncated_payload() {
        let mut encoded = encode_f64s(&[1.0, 2.0, 3.0, 4.0]);
        encoded.truncate(10);
        assert!(Band::from_base64("co", 2, 2, &encoded).is_err());
    }

    #[test]
    fn timestamp_date_is_utc() {
        // 2024-06-01T00:00:00Z
        let image = RasterImage::new("a", 1_717_200_000_000, vec![]);
        assert_eq!(
            image.timestamp_date(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }
}
