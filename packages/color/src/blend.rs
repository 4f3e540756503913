//! Mixing, blending and perceptual brightness.

use crate::color::{round_half_up, Color, FULL_INTENSITY};

/// Mix two colors. `weight` is the balance point in [0, 1]; `1` yields `c1`.
///
/// RGB channels are weighted by the alpha-adjusted weights, alpha itself
/// by the raw weight.
pub fn mix(c1: Color, c2: Color, weight: f64) -> Color {
    let w = weight * 2.0 - 1.0;
    let a = (c1.a as f64 - c2.a as f64) / 65535.0;

    let w1 = ((if w * a == -1.0 { w } else { (w + a) / (1.0 + w * a) }) + 1.0) / 2.0;
    let w2 = 1.0 - w1;

    let channel = |x: u16, y: u16| round_half_up(x as f64 * w1 + y as f64 * w2);

    Color::from_channels(
        round_half_up(c1.a as f64 * weight + c2.a as f64 * (1.0 - weight)),
        channel(c1.r, c2.r),
        channel(c1.g, c2.g),
        channel(c1.b, c2.b),
    )
}

fn blend_alpha(a1: u16, a2: u16) -> f64 {
    ((a1 as u64 * a2 as u64 + 0x7FFF) / 0xFFFF) as f64
}

/// Multiply blend. Channel products are truncated, not rounded.
pub fn multiply(c1: Color, c2: Color) -> Color {
    let channel = |x: u16, y: u16| ((x as u64 * y as u64) / 0xFF00) as f64;

    Color::from_channels(
        blend_alpha(c1.a, c2.a),
        channel(c1.r, c2.r),
        channel(c1.g, c2.g),
        channel(c1.b, c2.b),
    )
}

/// Screen blend, the inverse of multiplying the inverted colors
pub fn screen(c1: Color, c2: Color) -> Color {
    let channel = |x: u16, y: u16| {
        let (x, y) = (x as u64, y as u64);
        (x + y - (x * y) / 0xFF00) as f64
    };

    Color::from_channels(
        blend_alpha(c1.a, c2.a),
        channel(c1.r, c2.r),
        channel(c1.g, c2.g),
        channel(c1.b, c2.b),
    )
}

fn linear_channels(color: &Color) -> (f64, f64, f64) {
    (
        color.r as f64 / FULL_INTENSITY,
        color.g as f64 / FULL_INTENSITY,
        color.b as f64 / FULL_INTENSITY,
    )
}

/// Relative luminance without gamma correction, in [0, 1]
pub fn luminance(color: Color) -> f64 {
    let (r, g, b) = linear_channels(&color);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Relative luminance of gamma-corrected channels, in [0, 1]
pub fn luma(color: Color) -> f64 {
    let gamma = |c: f64| {
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = linear_channels(&color);
    0.2126 * gamma(r) + 0.7152 * gamma(g) + 0.0722 * gamma(b)
}

/// Pick whichever of `dark` and `light` contrasts better with `color`.
/// The two options are swapped first if `dark` is actually the lighter one.
pub fn contrast(color: Color, dark: Color, light: Color, threshold: f64) -> Color {
    let (dark, light) = if luma(dark) > luma(light) {
        (light, dark)
    } else {
        (dark, light)
    };
    if luma(color) < threshold {
        light
    } else {
        dark
    }
}
