use serde::{Deserialize, Serialize};
use std::fmt;

/// Full intensity of an 8-bit channel scaled to 16 bits (`255 * 256`)
pub(crate) const FULL_INTENSITY: f64 = 0xFF00 as f64;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Round half up, the rounding rule used for every channel quantization.
///
/// `f64::round` rounds half away from zero, which differs for negative
/// inputs; channel math must round `-0.5` to `0`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Clamp to the unit interval
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Collapse an 8-bit scaled value to a displayable channel in [0, 255]
pub fn color_digit(value: f64) -> u8 {
    if value >= 255.0 {
        255
    } else if value <= 0.0 || value.is_nan() {
        0
    } else {
        round_half_up(value) as u8
    }
}

/// Scale an 8-bit scaled value into the 16-bit working precision
pub fn color_large_digit(value: f64) -> u16 {
    let value = value * 256.0;
    if value >= 65535.0 {
        0xFFFF
    } else if value <= 0.0 || value.is_nan() {
        0
    } else {
        round_half_up(value) as u16
    }
}

fn clamp_channel(value: f64) -> u16 {
    if value >= 65535.0 {
        0xFFFF
    } else if value <= 0.0 || value.is_nan() {
        0
    } else {
        round_half_up(value) as u16
    }
}

/// A color with 16-bit alpha, red, green and blue channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub a: u16,
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Color {
    pub const BLACK: Color = Color::new(0xFFFF, 0, 0, 0);
    pub const WHITE: Color = Color::new(0xFFFF, 0xFF00, 0xFF00, 0xFF00);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(a: u16, r: u16, g: u16, b: u16) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque color from 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(0xFFFF, r as u16 * 256, g as u16 * 256, b as u16 * 256)
    }

    /// Color from 8-bit scaled channels (may be fractional) and an alpha in [0, 1]
    pub fn from_rgba(r: f64, g: f64, b: f64, alpha: f64) -> Self {
        Self::new(
            clamp_channel(clamp_unit(alpha) * 65535.0),
            color_large_digit(r),
            color_large_digit(g),
            color_large_digit(b),
        )
    }

    /// Color from raw 16-bit channel values, rounding and clamping each
    pub fn from_channels(a: f64, r: f64, g: f64, b: f64) -> Self {
        Self::new(
            clamp_channel(a),
            clamp_channel(r),
            clamp_channel(g),
            clamp_channel(b),
        )
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            3 => {
                let expand = |v: u32| ((v & 0xF) * 17) as u8;
                Some(Self::from_rgb8(
                    expand(value >> 8),
                    expand(value >> 4),
                    expand(value),
                ))
            }
            6 => Some(Self::from_rgb8(
                (value >> 16) as u8,
                (value >> 8) as u8,
                value as u8,
            )),
            8 => {
                let mut color = Self::from_rgb8((value >> 24) as u8, (value >> 16) as u8, (value >> 8) as u8);
                color.a = (value & 0xFF) as u16 * 257;
                Some(color)
            }
            _ => None,
        }
    }

    pub fn red(&self) -> u8 {
        color_digit(self.r as f64 / 256.0)
    }

    pub fn green(&self) -> u8 {
        color_digit(self.g as f64 / 256.0)
    }

    pub fn blue(&self) -> u8 {
        color_digit(self.b as f64 / 256.0)
    }

    /// Alpha in [0, 1], rounded to four decimal places
    pub fn alpha(&self) -> f64 {
        let value = self.a as f64 / 65535.0;
        round_half_up(value * 10000.0) / 10000.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 0xFFFF
    }

    /// Normalized red, green and blue in [0, 1]
    pub(crate) fn unit_channels(&self) -> (f64, f64, f64) {
        (
            clamp_unit(self.r as f64 / FULL_INTENSITY),
            clamp_unit(self.g as f64 / FULL_INTENSITY),
            clamp_unit(self.b as f64 / FULL_INTENSITY),
        )
    }

    /// Pack as 8-bit `0xAARRGGBB`
    pub fn argb(&self) -> u32 {
        let alpha = color_digit(self.a as f64 / 256.0) as u32;
        alpha << 24 | (self.red() as u32) << 16 | (self.green() as u32) << 8 | self.blue() as u32
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(7);
        out.push('#');
        push_hex(&mut out, self.argb(), 6);
        out
    }

    /// `#aarrggbb`
    pub fn to_argb_hex(&self) -> String {
        let mut out = String::with_capacity(9);
        out.push('#');
        push_hex(&mut out, self.argb(), 8);
        out
    }
}

/// Append the lowest `digits` hex digits of `value`, most significant first
pub fn push_hex(out: &mut String, value: u32, digits: u32) {
    for shift in (0..digits).rev() {
        out.push(HEX_DIGITS[((value >> (shift * 4)) & 0xF) as usize] as char);
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
