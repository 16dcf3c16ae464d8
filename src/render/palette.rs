//! Palette registry for loading and accessing color ramps
//!
//! Loads palettes from palettes.json (embedded at compile time) and
//! provides access by name. The ramps are the ones the reference
//! visualizations use for each trace gas: low concentrations at the start
//! of the list, high at the end.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Global palette registry, initialized lazily on first access
pub static PALETTE_REGISTRY: Lazy<PaletteRegistry> = Lazy::new(|| {
    PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to load palettes.json: {}", e);
        PaletteRegistry::default()
    })
});

/// A single palette definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Get a color by index, clamped to the last color.
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128]; // Gray fallback
        }
        let idx = index.min(self.colors.len() - 1);
        parse_hex_color(&self.colors[idx]).unwrap_or([128, 128, 128])
    }

    /// Get all colors as RGB arrays
    pub fn get_colors_rgb(&self) -> Vec<[u8; 3]> {
        self.colors
            .iter()
            .filter_map(|hex| parse_hex_color(hex))
            .collect()
    }

    /// Get the number of colors in this palette
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the palette is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolate a color from the palette at position t ∈ [0, 1]
    ///
    /// t=0 returns the first color, t=1 returns the last color.
    /// Values in between are linearly interpolated.
    pub fn interpolate(&self, t: f64) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128]; // Gray fallback
        }

        let t = t.clamp(0.0, 1.0);
        let n = self.colors.len();

        if n == 1 {
            return self.get_color(0);
        }

        // Map t to position in the color array
        let pos = t * (n - 1) as f64;
        let idx_low = pos.floor() as usize;
        let idx_high = (idx_low + 1).min(n - 1);
        let frac = pos - idx_low as f64;

        let color_low = self.get_color(idx_low);
        let color_high = self.get_color(idx_high);

        // Linear interpolation between the two colors
        [
            (color_low[0] as f64 * (1.0 - frac) + color_high[0] as f64 * frac) as u8,
            (color_low[1] as f64 * (1.0 - frac) + color_high[1] as f64 * frac) as u8,
            (color_low[2] as f64 * (1.0 - frac) + color_high[2] as f64 * frac) as u8,
        ]
    }
}

/// Registry of all available palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// All palettes by name (lowercase keys for case-insensitive lookup)
    palettes: HashMap<String, PaletteDefinition>,
    /// Palette names in definition order (for listing)
    names: Vec<String>,
}

impl PaletteRegistry {
    /// Load palettes from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        let definitions: Vec<PaletteDefinition> = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse palettes JSON: {}", e))?;

        let mut registry = Self::default();
        for def in definitions {
            registry.names.push(def.name.clone());
            // Store with lowercase key for case-insensitive lookup
            registry.palettes.insert(def.name.to_lowercase(), def);
        }
        Ok(registry)
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }

    /// List all palette names
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Parse a hex color string to RGB array
///
/// Supports formats:
/// - `#RRGGBB` (6 hex digits)
/// - `#RRGGBBAA` (8 hex digits, alpha ignored)
/// - `RRGGBB` (without #)
/// - `RRGGBBAA` (without #)
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');

    if hex.len() != 6 && hex.len() != 8 {
        eprintln!("WARN: Invalid hex color length '{}': {}", hex, hex.len());
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_variants() {
        assert_eq!(parse_hex_color("#1E90FF"), Some([0x1E, 0x90, 0xFF]));
        assert_eq!(parse_hex_color("8B0000"), Some([0x8B, 0x00, 0x00]));
        assert_eq!(parse_hex_color("#8B0000FF"), Some([0x8B, 0x00, 0x00]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn embedded_registry_has_the_reference_ramps() {
        for name in ["co-animation", "co-detailed", "trace-gas", "h2o"] {
            let palette = PALETTE_REGISTRY.get(name).unwrap();
            assert!(!palette.is_empty(), "palette '{}' is empty", name);
        }
        assert_eq!(PALETTE_REGISTRY.get("co-detailed").unwrap().len(), 16);
        // Case-insensitive lookup
        assert!(PALETTE_REGISTRY.get("CO-Animation").is_some());
        assert!(PALETTE_REGISTRY.get("unknown").is_none());
    }

    #[test]
    fn interpolate_endpoints_and_midpoint() {
        let palette = PaletteDefinition {
            name: "test".to_string(),
            colors: vec!["#000000".to_string(), "#FFFFFF".to_string()],
        };
        assert_eq!(palette.interpolate(0.0), [0, 0, 0]);
        assert_eq!(palette.interpolate(1.0), [255, 255, 255]);
        assert_eq!(palette.interpolate(0.5), [127, 127, 127]);
        // Out-of-range t clamps
        assert_eq!(palette.interpolate(-1.0), [0, 0, 0]);
        assert_eq!(palette.interpolate(2.0), [255, 255, 255]);
    }

    #[test]
    fn interpolate_single_color() {
        let palette = PaletteDefinition {
            name: "test".to_string(),
            colors: vec!["#FF0000".to_string()],
        };
        assert_eq!(palette.interpolate(0.7), [255, 0, 0]);
    }
}
