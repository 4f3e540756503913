//! # Sheen Color
//!
//! Colors are stored with 16 bits per channel. Stylesheet sources only ever
//! provide 8-bit channels, but every color function computes on the wider
//! representation so that chained operations (`lighten(darken(...))`) do not
//! accumulate rounding errors. Only the final text emission collapses a
//! channel back to 8 bits.
//!
//! An 8-bit value `v` is stored as `v * 256`, which makes full intensity
//! `0xFF00` rather than `0xFFFF`. Normalized channel math therefore divides
//! by `0xFF00`.

pub mod blend;
pub mod color;
pub mod hsl;

pub use blend::{contrast, luma, luminance, mix, multiply, screen};
pub use color::{clamp_unit, color_digit, color_large_digit, push_hex, round_half_up, Color};
pub use hsl::{Hsl, Hsv};
