use eframe::egui::Color32;
use ndarray::Array2;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Colour maps
// ---------------------------------------------------------------------------

/// Continuous colour maps for surface values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMapKind {
    #[default]
    Plasma,
    Jet,
    Bone,
    Viridis,
    /// Diverging map used by the load/smooth/convert previews.
    Coolwarm,
}

/// `(position, sRGB)` anchor of a gradient; positions ascend from 0 to 1.
type Stop = (f32, [u8; 3]);

const PLASMA: &[Stop] = &[
    (0.0, [0x0d, 0x08, 0x87]),
    (1.0 / 9.0, [0x46, 0x03, 0x9f]),
    (2.0 / 9.0, [0x72, 0x01, 0xa8]),
    (3.0 / 9.0, [0x9c, 0x17, 0x9e]),
    (4.0 / 9.0, [0xbd, 0x37, 0x86]),
    (5.0 / 9.0, [0xd8, 0x57, 0x6b]),
    (6.0 / 9.0, [0xed, 0x79, 0x53]),
    (7.0 / 9.0, [0xfb, 0x9f, 0x3a]),
    (8.0 / 9.0, [0xfd, 0xca, 0x26]),
    (1.0, [0xf0, 0xf9, 0x21]),
];

const VIRIDIS: &[Stop] = &[
    (0.0, [0x44, 0x01, 0x54]),
    (1.0 / 9.0, [0x48, 0x28, 0x78]),
    (2.0 / 9.0, [0x3e, 0x49, 0x89]),
    (3.0 / 9.0, [0x31, 0x68, 0x8e]),
    (4.0 / 9.0, [0x26, 0x82, 0x8e]),
    (5.0 / 9.0, [0x1f, 0x9e, 0x89]),
    (6.0 / 9.0, [0x35, 0xb7, 0x79]),
    (7.0 / 9.0, [0x6e, 0xce, 0x58]),
    (8.0 / 9.0, [0xb5, 0xde, 0x2b]),
    (1.0, [0xfd, 0xe7, 0x25]),
];

const JET: &[Stop] = &[
    (0.0, [0x00, 0x00, 0x7f]),
    (0.11, [0x00, 0x00, 0xff]),
    (0.125, [0x00, 0x00, 0xff]),
    (0.34, [0x00, 0xdb, 0xff]),
    (0.35, [0x00, 0xe5, 0xf7]),
    (0.375, [0x0c, 0xff, 0xeb]),
    (0.64, [0xe4, 0xff, 0x13]),
    (0.66, [0xff, 0xe9, 0x00]),
    (0.89, [0xff, 0x1c, 0x00]),
    (0.91, [0xe8, 0x00, 0x00]),
    (1.0, [0x7f, 0x00, 0x00]),
];

const BONE: &[Stop] = &[
    (0.0, [0x00, 0x00, 0x00]),
    (0.365, [0x51, 0x51, 0x71]),
    (0.746, [0xa6, 0xc6, 0xc6]),
    (1.0, [0xff, 0xff, 0xff]),
];

const COOLWARM: &[Stop] = &[
    (0.0, [0x3b, 0x4c, 0xc0]),
    (0.25, [0x8d, 0xb0, 0xfe]),
    (0.5, [0xdd, 0xdc, 0xdc]),
    (0.75, [0xf4, 0x9a, 0x7b]),
    (1.0, [0xb4, 0x04, 0x26]),
];

impl ColorMapKind {
    /// Maps the user can pick for the final plot.
    pub const SELECTABLE: [ColorMapKind; 4] = [
        ColorMapKind::Plasma,
        ColorMapKind::Jet,
        ColorMapKind::Bone,
        ColorMapKind::Viridis,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorMapKind::Plasma => "plasma",
            ColorMapKind::Jet => "jet",
            ColorMapKind::Bone => "bone",
            ColorMapKind::Viridis => "viridis",
            ColorMapKind::Coolwarm => "coolwarm",
        }
    }

    fn stops(self) -> &'static [Stop] {
        match self {
            ColorMapKind::Plasma => PLASMA,
            ColorMapKind::Jet => JET,
            ColorMapKind::Bone => BONE,
            ColorMapKind::Viridis => VIRIDIS,
            ColorMapKind::Coolwarm => COOLWARM,
        }
    }

    /// Colour at `t` in [0, 1]; values outside are clamped, NaN maps to 0.
    pub fn sample(self, t: f64) -> Color32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f32 };
        let stops = self.stops();

        let upper = stops
            .iter()
            .position(|&(pos, _)| pos >= t)
            .unwrap_or(stops.len() - 1);
        if upper == 0 {
            return to_color32(stops[0].1);
        }
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let local = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };

        // Blend in linear light, then back to sRGB for display.
        let lo: LinSrgb = Srgb::new(c0[0], c0[1], c0[2]).into_format::<f32>().into_linear();
        let hi: LinSrgb = Srgb::new(c1[0], c1[1], c1[2]).into_format::<f32>().into_linear();
        let mixed: Srgb<u8> = Srgb::<f32>::from_linear(lo.mix(hi, local)).into_format();
        Color32::from_rgb(mixed.red, mixed.green, mixed.blue)
    }
}

impl std::fmt::Display for ColorMapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn to_color32(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

// ---------------------------------------------------------------------------
// Array → RGBA
// ---------------------------------------------------------------------------

/// Colour an (H, W) array with min/max scaling.
///
/// Returns `[width, height]` and unmultiplied RGBA bytes with the last array
/// row first, so the image reads with Y growing upwards. Non-finite cells are
/// transparent; a flat array maps to the middle of the map.
pub fn heatmap_rgba(values: &Array2<f64>, map: ColorMapKind) -> ([usize; 2], Vec<u8>) {
    let (rows, cols) = values.dim();
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;

    let mut rgba = Vec::with_capacity(rows * cols * 4);
    for r in (0..rows).rev() {
        for &v in values.row(r) {
            if !v.is_finite() {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let t = if span > 0.0 { (v - lo) / span } else { 0.5 };
            let c = map.sample(t);
            rgba.extend_from_slice(&[c.r(), c.g(), c.b(), 255]);
        }
    }
    ([cols, rows], rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn endpoints_hit_the_anchor_colours() {
        assert_eq!(ColorMapKind::Viridis.sample(0.0), Color32::from_rgb(0x44, 0x01, 0x54));
        assert_eq!(ColorMapKind::Viridis.sample(1.0), Color32::from_rgb(0xfd, 0xe7, 0x25));
        assert_eq!(ColorMapKind::Bone.sample(0.0), Color32::BLACK);
        assert_eq!(ColorMapKind::Bone.sample(1.0), Color32::WHITE);
        assert_eq!(ColorMapKind::Jet.sample(1.0), Color32::from_rgb(0x7f, 0, 0));
    }

    #[test]
    fn out_of_range_is_clamped() {
        for map in ColorMapKind::SELECTABLE {
            assert_eq!(map.sample(-3.0), map.sample(0.0));
            assert_eq!(map.sample(7.0), map.sample(1.0));
            assert_eq!(map.sample(f64::NAN), map.sample(0.0));
        }
    }

    #[test]
    fn bone_is_monotone_in_brightness() {
        let mut last = 0u32;
        for i in 0..=20 {
            let c = ColorMapKind::Bone.sample(i as f64 / 20.0);
            let sum = c.r() as u32 + c.g() as u32 + c.b() as u32;
            assert!(sum >= last);
            last = sum;
        }
    }

    #[test]
    fn selectable_names() {
        let names: Vec<_> = ColorMapKind::SELECTABLE.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["plasma", "jet", "bone", "viridis"]);
    }

    #[test]
    fn heatmap_flips_rows_and_scales() {
        let values = array![[0.0, 1.0], [2.0, f64::NAN]];
        let (size, rgba) = heatmap_rgba(&values, ColorMapKind::Bone);
        assert_eq!(size, [2, 2]);
        assert_eq!(rgba.len(), 16);
        // first texel is array row 1, col 0 → max → white
        assert_eq!(&rgba[0..4], &[255, 255, 255, 255]);
        // NaN is transparent
        assert_eq!(rgba[7], 0);
        // array row 0, col 0 → min → black
        assert_eq!(&rgba[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn flat_heatmap_uses_the_middle() {
        let values = Array2::from_elem((1, 3), 4.2);
        let (_, rgba) = heatmap_rgba(&values, ColorMapKind::Viridis);
        let mid = ColorMapKind::Viridis.sample(0.5);
        assert_eq!(&rgba[0..3], &[mid.r(), mid.g(), mid.b()]);
    }
}
