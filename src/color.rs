use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_rgb(hsl: Hsl) -> RGBColor {
    let rgb: Srgb = hsl.into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_rgb(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential ramp for heatmaps
// ---------------------------------------------------------------------------

/// Dark purple → red → pale orange as `t` goes 0 → 1 (clamped).
pub fn heat_color(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
    let hue = 280.0 + t * 110.0; // wraps past 360 into orange
    let lightness = 0.12 + t * 0.72;
    hsl_to_rgb(Hsl::new(hue % 360.0, 0.70, lightness))
}

/// Whether text drawn on `color` should be light rather than dark.
pub fn is_dark(color: &RGBColor) -> bool {
    let RGBColor(r, g, b) = *color;
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    luma < 128.0
}
