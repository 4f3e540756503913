//! Hue based color spaces.
//!
//! Hue is kept in degrees and may leave [0, 360) between operations
//! (`spin` just adds to it); it is normalized when converting back.

use crate::color::{clamp_unit, Color};
use serde::{Deserialize, Serialize};

/// Hue / saturation / lightness with alpha
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

/// Hue / saturation / value with alpha
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
    pub a: f64,
}

/// Candidate indices selecting red, green and blue per 60 degree sector
const HSV_PERMUTATION: [[usize; 3]; 6] = [
    [0, 3, 1],
    [2, 0, 1],
    [1, 0, 3],
    [1, 2, 0],
    [3, 1, 0],
    [0, 1, 2],
];

/// Hue in degrees shared by HSL and HSV. Equal channels have no hue.
fn hue(r: f64, g: f64, b: f64, max: f64, min: f64) -> f64 {
    let d = max - min;
    if max == min {
        return 0.0;
    }
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    h / 6.0 * 360.0
}

fn hue_to_channel(h: f64, m1: f64, m2: f64) -> f64 {
    let h = if h < 0.0 {
        h + 1.0
    } else if h > 1.0 {
        h - 1.0
    } else {
        h
    };
    if h * 6.0 < 1.0 {
        m1 + (m2 - m1) * h * 6.0
    } else if h * 2.0 < 1.0 {
        m2
    } else if h * 3.0 < 2.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
    } else {
        m1
    }
}

impl Color {
    pub fn to_hsl(&self) -> Hsl {
        let (r, g, b) = self.unit_channels();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        let s = if max == min {
            0.0
        } else if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };

        Hsl {
            h: hue(r, g, b, max, min),
            s,
            l,
            a: self.alpha(),
        }
    }

    pub fn to_hsv(&self) -> Hsv {
        let (r, g, b) = self.unit_channels();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let s = if max == 0.0 { 0.0 } else { (max - min) / max };

        Hsv {
            h: hue(r, g, b, max, min),
            s,
            v: max,
            a: self.alpha(),
        }
    }
}

impl Hsl {
    pub fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self { h, s, l, a }
    }

    pub fn to_color(&self) -> Color {
        let h = (self.h % 360.0) / 360.0;
        let s = clamp_unit(self.s);
        let l = clamp_unit(self.l);
        let a = clamp_unit(self.a);

        let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
        let m1 = l * 2.0 - m2;

        Color::from_rgba(
            hue_to_channel(h + 1.0 / 3.0, m1, m2) * 255.0,
            hue_to_channel(h, m1, m2) * 255.0,
            hue_to_channel(h - 1.0 / 3.0, m1, m2) * 255.0,
            a,
        )
    }
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64, a: f64) -> Self {
        Self { h, s, v, a }
    }

    pub fn to_color(&self) -> Color {
        let hue = self.h.rem_euclid(360.0);
        let sector = ((hue / 60.0) % 6.0).floor();
        let f = hue / 60.0 - sector;
        let (s, v) = (self.s, self.v);

        let candidates = [
            v,
            v * (1.0 - s),
            v * (1.0 - f * s),
            v * (1.0 - (1.0 - f) * s),
        ];
        let [r, g, b] = HSV_PERMUTATION[sector as usize % 6];

        Color::from_rgba(
            candidates[r] * 255.0,
            candidates[g] * 255.0,
            candidates[b] * 255.0,
            self.a,
        )
    }
}

impl From<Color> for Hsl {
    fn from(color: Color) -> Self {
        color.to_hsl()
    }
}

impl From<Hsl> for Color {
    fn from(hsl: Hsl) -> Self {
        hsl.to_color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(Color::from_rgb8(255, 0, 0).to_hsl().h, 0.0);
        assert_close(Color::from_rgb8(0, 255, 0).to_hsl().h, 120.0, 1e-9);
        assert_close(Color::from_rgb8(0, 0, 255).to_hsl().h, 240.0, 1e-9);
        assert_close(Color::from_rgb8(255, 0, 255).to_hsl().h, 300.0, 1e-9);
    }

    #[test]
    fn test_grey_has_no_hue_or_saturation() {
        let hsl = Color::from_rgb8(0x80, 0x80, 0x80).to_hsl();
        assert_eq!(hsl.h, 0.0);
        assert_eq!(hsl.s, 0.0);
        assert_close(hsl.l, 128.0 / 255.0, 1e-9);
    }

    #[test]
    fn test_hsl_round_trip() {
        let samples = [
            (0.0, 1.0, 0.5),
            (45.0, 0.8, 0.3),
            (120.0, 0.5, 0.5),
            (210.0, 0.5, 0.4),
            (300.0, 0.25, 0.7),
            (359.0, 0.9, 0.6),
        ];
        for (h, s, l) in samples {
            let hsl = Hsl::new(h, s, l, 1.0).to_color().to_hsl();
            assert_close(hsl.h, h, 0.05);
            assert_close(hsl.s, s, 1e-3);
            assert_close(hsl.l, l, 1e-3);
            assert_eq!(hsl.a, 1.0);
        }
    }

    #[test]
    fn test_hsl_hue_wraps() {
        let wrapped = Hsl::new(480.0, 1.0, 0.5, 1.0).to_color();
        let direct = Hsl::new(120.0, 1.0, 0.5, 1.0).to_color();
        assert_eq!(wrapped, direct);
    }

    #[test]
    fn test_zero_saturation_maps_hue_to_zero() {
        let hsl = Hsl::new(200.0, 0.0, 0.5, 1.0).to_color().to_hsl();
        assert_eq!(hsl.h, 0.0);
        assert_eq!(hsl.s, 0.0);
    }

    #[test]
    fn test_hsl_lightness_half_is_mid_grey() {
        let color = Hsl::new(0.0, 0.0, 0.5, 1.0).to_color();
        assert_eq!(color.to_hex(), "#808080");
    }

    #[test]
    fn test_hsv_sectors() {
        assert_eq!(Hsv::new(0.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#ff0000");
        assert_eq!(Hsv::new(60.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#ffff00");
        assert_eq!(Hsv::new(120.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#00ff00");
        assert_eq!(Hsv::new(180.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#00ffff");
        assert_eq!(Hsv::new(240.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#0000ff");
        assert_eq!(Hsv::new(300.0, 1.0, 1.0, 1.0).to_color().to_hex(), "#ff00ff");
    }

    #[test]
    fn test_hsv_round_trip() {
        let color = Color::from_rgb8(0x33, 0x99, 0xcc);
        let hsv = color.to_hsv();
        assert_eq!(hsv.to_color().to_hex(), "#3399cc");
        assert_close(hsv.v, 0.8, 1e-9);
    }
}
