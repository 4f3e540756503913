//! Conversion between compatible CSS units.

use sheen_common::{LessError, LessResult};
use std::f64::consts::PI;

/// Size of one `unit` in the canonical unit of its group
fn canonical_scale(unit: &str) -> Option<(&'static str, f64)> {
    let scale = match unit.to_ascii_lowercase().as_str() {
        // lengths, canonical px
        "px" => ("length", 1.0),
        "cm" => ("length", 96.0 / 2.54),
        "mm" => ("length", 96.0 / 25.4),
        "q" => ("length", 96.0 / 101.6),
        "in" => ("length", 96.0),
        "pt" => ("length", 4.0 / 3.0),
        "pc" => ("length", 16.0),
        // angles, canonical rad
        "rad" => ("angle", 1.0),
        "deg" => ("angle", PI / 180.0),
        "grad" => ("angle", PI / 200.0),
        "turn" => ("angle", 2.0 * PI),
        "s" => ("time", 1.0),
        "ms" => ("time", 0.001),
        "hz" => ("frequency", 1.0),
        "khz" => ("frequency", 1000.0),
        // resolution, canonical dppx
        "dppx" => ("resolution", 1.0),
        "dpi" => ("resolution", 1.0 / 96.0),
        "dpcm" => ("resolution", 2.54 / 96.0),
        _ => return None,
    };
    Some(scale)
}

/// Factor that converts a value measured in `from` into `to`.
///
/// A missing unit on either side converts 1:1, as does any unit to itself.
pub fn unit_factor(from: &str, to: &str) -> LessResult<f64> {
    if from.is_empty() || to.is_empty() || from.eq_ignore_ascii_case(to) {
        return Ok(1.0);
    }
    match (canonical_scale(from), canonical_scale(to)) {
        (Some((group_from, scale_from)), Some((group_to, scale_to))) if group_from == group_to => {
            Ok(scale_from / scale_to)
        }
        _ => Err(LessError::incompatible_units(from, to)),
    }
}
