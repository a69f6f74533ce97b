//! Angular color palette for the particle field.
//!
//! Bodies are colored by their angular position around the planet. To avoid
//! doing hue interpolation per body per rebuild, a lookup table mapping
//! normalized position -> RGB is precomputed for each (brightness level,
//! step count) pair and cached. The cache is an explicit object owned by the
//! worker, not module state, so multiple hero instances never share mutable
//! data; a built table is read-only.

use std::collections::HashMap;

/// Ordered hue anchors, in degrees, that the palette cycles through.
///
/// Interpolation is cyclic: positions past the last anchor blend back toward
/// the first, so the ring of bodies has no visible seam.
const HUE_ANCHORS: [f32; 8] = [0.0, 30.0, 60.0, 120.0, 180.0, 240.0, 280.0, 320.0];

/// Brightness levels. `color_level` indexes this table (clamped); lower
/// levels are lighter, matching the design-system scale the site uses.
const LEVEL_LIGHTNESS: [f32; 10] = [0.95, 0.88, 0.80, 0.72, 0.64, 0.56, 0.48, 0.40, 0.32, 0.24];

const LEVEL_SATURATION: f32 = 0.75;

/// A built lookup table: `steps` RGB triples.
pub type PaletteLut = Vec<[f32; 3]>;

/// Cache of palette tables keyed by (level, steps).
///
/// Building is deterministic from the key alone, so a cache hit is
/// bit-identical to a rebuild.
pub struct PaletteCache {
    tables: HashMap<(u8, usize), PaletteLut>,
}

impl PaletteCache {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Get (building if needed) the table for a (level, steps) pair.
    pub fn table(&mut self, level: u8, steps: usize) -> &PaletteLut {
        let steps = steps.max(1);
        self.tables
            .entry((level, steps))
            .or_insert_with(|| build_palette(level, steps))
    }

    /// Color for a normalized angular position in [0, 1).
    ///
    /// Positions at or past 1.0 clamp to the last entry; they never index
    /// out of bounds.
    pub fn color(&mut self, level: u8, position: f32, steps: usize) -> [f32; 3] {
        let steps = steps.max(1);
        let table = self.table(level, steps);
        let idx = ((position * steps as f32) as usize).min(steps - 1);
        table[idx]
    }
}

impl Default for PaletteCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a palette table by cyclically interpolating between the hue anchors
/// at the lightness of the requested level.
pub fn build_palette(level: u8, steps: usize) -> PaletteLut {
    let steps = steps.max(1);
    let lightness = LEVEL_LIGHTNESS[(level as usize).min(LEVEL_LIGHTNESS.len() - 1)];
    let anchors = HUE_ANCHORS.len();

    let mut table = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = i as f32 / steps as f32 * anchors as f32;
        let lo = (t as usize) % anchors;
        let hi = (lo + 1) % anchors;
        let frac = t - t.floor();

        let h_lo = HUE_ANCHORS[lo];
        let mut h_hi = HUE_ANCHORS[hi];
        // Take the short way around the hue circle at the wrap point.
        if h_hi < h_lo {
            h_hi += 360.0;
        }
        let hue = (h_lo + (h_hi - h_lo) * frac) % 360.0;
        table.push(hsl_to_rgb(hue, LEVEL_SATURATION, lightness));
    }
    table
}

/// Pack an RGB triple plus alpha into an RGBA8 word (R in the low byte),
/// matching the `unpack4x8unorm` convention in the shader.
pub fn pack_rgba(rgb: [f32; 3], alpha: f32) -> u32 {
    let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    to_byte(rgb[0]) | (to_byte(rgb[1]) << 8) | (to_byte(rgb[2]) << 16) | (to_byte(alpha) << 24)
}

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [r + m, g + m, b + m]
}
