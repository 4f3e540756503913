//! `svg-gradient(direction, stop, stop, ...)`
//!
//! Builds a one-unit SVG image holding a linear or radial gradient and
//! writes it as an inline data URI. A stop is a color, optionally followed
//! by its position; stops without a position sit at the start (first stop)
//! or at the end.

use crate::encoding::encode_uri_component;
use crate::function::{CallError, CallResult, FunctionExpression};
use crate::strings::with_inline;
use sheen_common::LessError;
use sheen_formatter::{format_number, CssFormatter};

const RECTANGLE: &str = r#"x="0" y="0" width="1" height="1""#;
const RADIAL_RECTANGLE: &str = r#"x="-50" y="-50" width="101" height="101""#;

/// Element name, gradient attributes and covered rectangle for a direction
fn gradient_shape(direction: &str) -> Option<(&'static str, &'static str, &'static str)> {
    let shape = match direction {
        "to bottom" => ("linearGradient", r#"x1="0%" y1="0%" x2="0%" y2="100%""#, RECTANGLE),
        "to right" => ("linearGradient", r#"x1="0%" y1="0%" x2="100%" y2="0%""#, RECTANGLE),
        "to bottom right" => ("linearGradient", r#"x1="0%" y1="0%" x2="100%" y2="100%""#, RECTANGLE),
        "to top right" => ("linearGradient", r#"x1="0%" y1="100%" x2="100%" y2="0%""#, RECTANGLE),
        "ellipse" | "ellipse at center" => (
            "radialGradient",
            r#"cx="50%" cy="50%" r="75%""#,
            RADIAL_RECTANGLE,
        ),
        _ => return None,
    };
    Some(shape)
}

pub(crate) fn svg_gradient(call: &FunctionExpression, f: &mut CssFormatter) -> CallResult<()> {
    let direction = with_inline(f, |f| call.arg(0)?.string_value(f).map_err(CallError::from))?;
    let direction = direction.split_whitespace().collect::<Vec<_>>().join(" ");

    let Some((element, attributes, rectangle)) = gradient_shape(&direction) else {
        return Err(CallError::Fault(LessError::compile(
            "svg-gradient direction must be 'to bottom', 'to right', 'to bottom right', 'to top right' or 'ellipse at center'",
        )));
    };

    let stops = &call.parameters()[1..];
    if stops.len() < 2 {
        return Err(CallError::Fault(LessError::compile(
            "svg-gradient expects direction, start_color [start_position], [color position,]..., end_color [end_position]",
        )));
    }

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="100%" height="100%" viewBox="0 0 1 1" preserveAspectRatio="none"><{} id="g" {}>"#,
        element, attributes
    );

    let last = stops.len() - 1;
    for (idx, stop) in stops.iter().enumerate() {
        let (color_expr, position) = match stop.list_operands(f)? {
            Some(items) if items.len() == 2 => (items[0].clone(), Some(items[1].clone())),
            Some(_) => {
                return Err(CallError::Fault(LessError::compile(
                    "svg-gradient stop must be a color and an optional position",
                )))
            }
            None => (stop.clone(), None),
        };

        let color = color_expr.value(f)?.as_color().ok_or_else(|| {
            CallError::Fault(
                LessError::compile("svg-gradient stop must start with a color")
                    .with_span(color_expr.span()),
            )
        })?;
        let offset = match position {
            Some(position) => position.string_value(f)?,
            None if idx == 0 => "0%".to_string(),
            None if idx == last => "100%".to_string(),
            None => format!("{}%", format_number(idx as f64 * 100.0 / last as f64)),
        };

        svg.push_str(&format!(
            r#"<stop offset="{}" stop-color="{}""#,
            offset,
            color.to_hex()
        ));
        if !color.is_opaque() {
            svg.push_str(&format!(r#" stop-opacity="{}""#, format_number(color.alpha())));
        }
        svg.push_str("/>");
    }

    svg.push_str(&format!(
        r#"</{}><rect {} fill="url(#g)" /></svg>"#,
        element, rectangle
    ));

    f.append("url('data:image/svg+xml,")
        .append(&encode_uri_component(&svg))
        .append("')");
    Ok(())
}
