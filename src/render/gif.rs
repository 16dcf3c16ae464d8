//! Frame sequence exporters
//!
//! [`GifExporter`] writes an animated GIF (one frame per composite,
//! looping forever), [`PngExporter`] writes still PNGs. Both consume the
//! ordered frame sequence the pipeline produced; neither reorders it.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::earthdata::error::{EarthdataError, Result};

use super::{RenderedFrame, SequenceExporter};

fn to_rgba(frame: &RenderedFrame) -> Result<RgbaImage> {
    RgbaImage::from_raw(frame.width, frame.height, frame.pixels.clone()).ok_or_else(|| {
        EarthdataError::Export(format!(
            "frame '{}' pixel buffer does not match {}x{}",
            frame.label, frame.width, frame.height
        ))
    })
}

/// Animated GIF export. Frame delay derives from `fps`; the animation
/// repeats indefinitely, as the reference GIFs do.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifExporter;

impl SequenceExporter for GifExporter {
    fn export(&self, frames: &[RenderedFrame], fps: u32, target: &Path) -> Result<()> {
        if frames.is_empty() {
            return Err(EarthdataError::Export(
                "no frames to export".to_string(),
            ));
        }

        let file = File::create(target)
            .map_err(|e| EarthdataError::Export(format!("cannot create {}: {}", target.display(), e)))?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| EarthdataError::Export(e.to_string()))?;

        for frame in frames {
            let buffer = to_rgba(frame)?;
            let delay = Delay::from_numer_denom_ms(1000, fps.max(1));
            encoder
                .encode_frame(Frame::from_parts(buffer, 0, 0, delay))
                .map_err(|e| {
                    EarthdataError::Export(format!("encoding frame '{}': {}", frame.label, e))
                })?;
        }
        Ok(())
    }
}

/// Still PNG export. A single frame goes to `target` verbatim; longer
/// sequences are numbered `stem_000.png`, `stem_001.png`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct PngExporter;

impl PngExporter {
    fn frame_path(target: &Path, index: usize, total: usize) -> std::path::PathBuf {
        if total == 1 {
            return target.to_path_buf();
        }
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        let name = format!("{}_{:03}.png", stem, index);
        target.with_file_name(name)
    }
}

impl SequenceExporter for PngExporter {
    fn export(&self, frames: &[RenderedFrame], _fps: u32, target: &Path) -> Result<()> {
        if frames.is_empty() {
            return Err(EarthdataError::Export(
                "no frames to export".to_string(),
            ));
        }
        for (index, frame) in frames.iter().enumerate() {
            let path = Self::frame_path(target, index, frames.len());
            let buffer = to_rgba(frame)?;
            buffer
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| {
                    EarthdataError::Export(format!("writing {}: {}", path.display(), e))
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(label: &str, shade: u8) -> RenderedFrame {
        RenderedFrame {
            label: label.to_string(),
            width: 4,
            height: 4,
            pixels: vec![shade; 4 * 4 * 4],
        }
    }

    #[test]
    fn gif_export_writes_animation() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("co.gif");
        let frames = vec![frame("a", 10), frame("b", 200)];
        GifExporter.export(&frames, 1, &target).unwrap();

        let bytes = std::fs::read(&target).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn gif_export_rejects_empty_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("co.gif");
        assert!(matches!(
            GifExporter.export(&[], 1, &target),
            Err(EarthdataError::Export(_))
        ));
    }

    #[test]
    fn png_export_single_frame_uses_target_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mean.png");
        PngExporter.export(&[frame("a", 42)], 1, &target).unwrap();
        assert!(target.exists());
    }

    #[test]
    fn png_export_numbers_longer_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mean.png");
        PngExporter
            .export(&[frame("a", 1), frame("b", 2)], 1, &target)
            .unwrap();
        assert!(dir.path().join("mean_000.png").exists());
        assert!(dir.path().join("mean_001.png").exists());
        assert!(!target.exists());
    }

    #[test]
    fn mismatched_pixel_buffer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("co.gif");
        let bad = RenderedFrame {
            label: "bad".to_string(),
            width: 4,
            height: 4,
            pixels: vec![0; 7],
        };
        assert!(matches!(
            GifExporter.export(&[bad], 1, &target),
            Err(EarthdataError::Export(_))
        ));
    }
}
