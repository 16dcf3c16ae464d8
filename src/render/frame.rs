//! Palette-based frame rendering
//!
//! [`PaletteRenderer`] maps one band of a composite through a value range
//! onto a palette ramp, producing an RGBA frame. Masked pixels render
//! transparent. An optional [`BorderOverlay`] is composited on top of
//! every frame; annotation like this lives here, never in the compositor.

use crate::earthdata::error::{EarthdataError, Result};
use crate::earthdata::raster::{RasterImage, Region};

use super::palette::PALETTE_REGISTRY;
use super::{FrameRenderer, RenderedFrame, VisParams};

/// Border polylines drawn over every frame: boundary geometry fetched
/// from the service, rasterized at each frame's own resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSpec {
    pub polylines: Vec<Vec<[f64; 2]>>,
    pub region: Region,
    pub color: [u8; 3],
}

/// Maps band values onto a registry palette.
#[derive(Debug, Clone, Default)]
pub struct PaletteRenderer {
    borders: Option<BorderSpec>,
}

impl PaletteRenderer {
    pub fn new() -> Self {
        PaletteRenderer { borders: None }
    }

    /// Draw border polylines over every rendered frame, in white unless
    /// overridden via [`BorderSpec`].
    pub fn with_borders(polylines: Vec<Vec<[f64; 2]>>, region: Region) -> Self {
        PaletteRenderer {
            borders: Some(BorderSpec {
                polylines,
                region,
                color: [255, 255, 255],
            }),
        }
    }

    pub fn with_border_spec(spec: BorderSpec) -> Self {
        PaletteRenderer {
            borders: Some(spec),
        }
    }
}

impl FrameRenderer for PaletteRenderer {
    fn render(&self, image: &RasterImage, vis: &VisParams, label: &str) -> Result<RenderedFrame> {
        let band = image.band(&vis.band).ok_or_else(|| {
            EarthdataError::Export(format!(
                "image '{}' has no band '{}' to render",
                image.id, vis.band
            ))
        })?;
        let palette = PALETTE_REGISTRY.get(&vis.palette).ok_or_else(|| {
            EarthdataError::Config(format!("unknown palette '{}'", vis.palette))
        })?;
        let span = vis.max - vis.min;
        if !(span > 0.0) {
            return Err(EarthdataError::Config(format!(
                "empty visualization range [{}, {}]",
                vis.min, vis.max
            )));
        }

        let mut pixels = Vec::with_capacity(band.values.len() * 4);
        for v in &band.values {
            if v.is_nan() {
                pixels.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                let t = ((v - vis.min) / span).clamp(0.0, 1.0);
                let [r, g, b] = palette.interpolate(t);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }

        let mut frame = RenderedFrame {
            label: label.to_string(),
            width: band.width,
            height: band.height,
            pixels,
        };
        if let Some(spec) = &self.borders {
            let overlay = BorderOverlay::from_polylines(
                band.width,
                band.height,
                &spec.region,
                &spec.polylines,
                spec.color,
            )?;
            overlay.apply(&mut frame)?;
        }
        Ok(frame)
    }
}

/// A prerendered border raster composited over each frame: every opaque
/// overlay pixel replaces the frame pixel underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderOverlay {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA; alpha 0 pixels are transparent.
    pub pixels: Vec<u8>,
}

impl BorderOverlay {
    /// Rasterize polylines of (lon, lat) vertices into a `width`x`height`
    /// overlay covering `region`'s bounding box, drawn in `color`.
    ///
    /// This is how the country borders of the reference animation are
    /// reproduced: downloaded boundary polylines drawn client-side on the
    /// already-rendered frames.
    pub fn from_polylines(
        width: u32,
        height: u32,
        region: &Region,
        polylines: &[Vec<[f64; 2]>],
        color: [u8; 3],
    ) -> Result<Self> {
        let (west, south, east, north) = region.bounds().ok_or_else(|| {
            EarthdataError::Config("cannot build an overlay for an empty region".to_string())
        })?;
        let lon_span = east - west;
        let lat_span = north - south;
        if !(lon_span > 0.0) || !(lat_span > 0.0) {
            return Err(EarthdataError::Config(
                "region bounding box is degenerate".to_string(),
            ));
        }

        let mut overlay = BorderOverlay {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };

        let project = |lon: f64, lat: f64| -> (i64, i64) {
            // North at the top, matching rendered frames.
            let x = (lon - west) / lon_span * f64::from(width.saturating_sub(1));
            let y = (north - lat) / lat_span * f64::from(height.saturating_sub(1));
            (x.round() as i64, y.round() as i64)
        };

        for line in polylines {
            for pair in line.windows(2) {
                let (x0, y0) = project(pair[0][0], pair[0][1]);
                let (x1, y1) = project(pair[1][0], pair[1][1]);
                overlay.draw_segment(x0, y0, x1, y1, color);
            }
        }
        Ok(overlay)
    }

    /// Bresenham line between two grid points.
    fn draw_segment(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 3]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn set_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx] = color[0];
        self.pixels[idx + 1] = color[1];
        self.pixels[idx + 2] = color[2];
        self.pixels[idx + 3] = 255;
    }

    /// Composite this overlay over a rendered frame.
    pub fn apply(&self, frame: &mut RenderedFrame) -> Result<()> {
        if self.width != frame.width || self.height != frame.height {
            return Err(EarthdataError::Export(format!(
                "overlay is {}x{} but frame '{}' is {}x{}",
                self.width, self.height, frame.label, frame.width, frame.height
            )));
        }
        for (dst, src) in frame.pixels.chunks_exact_mut(4).zip(self.pixels.chunks_exact(4)) {
            if src[3] > 0 {
                dst.copy_from_slice(src);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earthdata::raster::Band;

    fn image_with(values: Vec<f64>, width: u32, height: u32) -> RasterImage {
        let band = Band::new("co", width, height, values).unwrap();
        RasterImage::new("composite/2024-06-01", 0, vec![band])
    }

    fn vis() -> VisParams {
        VisParams {
            band: "co".to_string(),
            min: 0.0,
            max: 0.05,
            palette: "co-animation".to_string(),
        }
    }

    #[test]
    fn min_max_map_to_palette_endpoints() {
        let image = image_with(vec![0.0, 0.05, 0.1, -1.0], 2, 2);
        let frame = PaletteRenderer::new()
            .render(&image, &vis(), "2024-06-01 to 2024-06-04")
            .unwrap();

        assert_eq!(frame.label, "2024-06-01 to 2024-06-04");
        // min -> first ramp color (black)
        assert_eq!(&frame.pixels[0..4], &[0, 0, 0, 255]);
        // max -> last ramp color (darkred)
        assert_eq!(&frame.pixels[4..8], &[0x8B, 0, 0, 255]);
        // above max clamps to last color
        assert_eq!(&frame.pixels[8..12], &[0x8B, 0, 0, 255]);
        // below min clamps to first color
        assert_eq!(&frame.pixels[12..16], &[0, 0, 0, 255]);
    }

    #[test]
    fn masked_pixels_render_transparent() {
        let image = image_with(vec![f64::NAN, 0.025], 2, 1);
        let frame = PaletteRenderer::new().render(&image, &vis(), "x").unwrap();
        assert_eq!(frame.pixels[3], 0);
        assert_eq!(frame.pixels[7], 255);
    }

    #[test]
    fn missing_band_and_palette_are_errors() {
        let image = image_with(vec![0.0], 1, 1);
        let mut bad_band = vis();
        bad_band.band = "no2".to_string();
        assert!(matches!(
            PaletteRenderer::new().render(&image, &bad_band, "x"),
            Err(EarthdataError::Export(_))
        ));

        let mut bad_palette = vis();
        bad_palette.palette = "missing".to_string();
        assert!(matches!(
            PaletteRenderer::new().render(&image, &bad_palette, "x"),
            Err(EarthdataError::Config(_))
        ));

        let mut bad_range = vis();
        bad_range.max = bad_range.min;
        assert!(matches!(
            PaletteRenderer::new().render(&image, &bad_range, "x"),
            Err(EarthdataError::Config(_))
        ));
    }

    #[test]
    fn borders_replace_only_their_own_pixels() {
        let region = Region::bbox(0.0, 0.0, 3.0, 3.0);
        // A horizontal border along the top edge (lat = north).
        let line = vec![vec![[0.0, 3.0], [3.0, 3.0]]];

        let image = image_with(vec![0.0; 16], 4, 4);
        let renderer = PaletteRenderer::with_borders(line, region);
        let frame = renderer.render(&image, &vis(), "x").unwrap();

        // Top row is the white border...
        for x in 0..4 {
            assert_eq!(&frame.pixels[x * 4..x * 4 + 4], &[255, 255, 255, 255]);
        }
        // ...while the row below is untouched ramp output.
        assert_eq!(&frame.pixels[16..20], &[0, 0, 0, 255]);
    }

    #[test]
    fn borders_rasterize_at_each_frame_resolution() {
        let region = Region::bbox(0.0, 0.0, 3.0, 3.0);
        let line = vec![vec![[0.0, 3.0], [3.0, 3.0]]];
        let renderer = PaletteRenderer::with_borders(line, region);

        for size in [2u32, 8] {
            let image = image_with(vec![0.0; (size * size) as usize], size, size);
            let frame = renderer.render(&image, &vis(), "x").unwrap();
            assert_eq!(frame.width, size);
            assert_eq!(&frame.pixels[0..4], &[255, 255, 255, 255]);
        }
    }

    #[test]
    fn overlay_apply_rejects_mismatched_frame() {
        let region = Region::bbox(0.0, 0.0, 1.0, 1.0);
        let overlay = BorderOverlay::from_polylines(2, 2, &region, &[], [255, 255, 255]).unwrap();
        let mut frame = RenderedFrame {
            label: "x".to_string(),
            width: 1,
            height: 1,
            pixels: vec![0; 4],
        };
        assert!(matches!(
            overlay.apply(&mut frame),
            Err(EarthdataError::Export(_))
        ));
    }

    #[test]
    fn diagonal_border_is_continuous() {
        let region = Region::bbox(0.0, 0.0, 7.0, 7.0);
        let line = vec![vec![[0.0, 7.0], [7.0, 0.0]]];
        let overlay = BorderOverlay::from_polylines(8, 8, &region, &line, [255, 255, 255]).unwrap();
        // Both endpoints land where projected: (0,0) and (7,7).
        assert_eq!(&overlay.pixels[0..4], &[255, 255, 255, 255]);
        let last = (7 * 8 + 7) * 4;
        assert_eq!(&overlay.pixels[last..last + 4], &[255, 255, 255, 255]);
        // Every row of the grid is touched exactly along the diagonal.
        for y in 0..8usize {
            let row = &overlay.pixels[y * 8 * 4..(y + 1) * 8 * 4];
            assert!(row.chunks_exact(4).any(|p| p[3] == 255));
        }
    }
}
