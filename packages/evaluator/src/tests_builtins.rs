/// Numeric and color built-ins, arity fallback and scope-sensitive memoization
use crate::*;
use sheen_color::Color;
use sheen_common::LessError;
use sheen_formatter::{Bindings, CssFormatter, DataType, ExprRef, Expression, ValueExpression};

fn num(value: f64, unit: &str) -> ExprRef {
    ValueExpression::number(value, unit).into_ref()
}

fn pct(value: f64) -> ExprRef {
    ValueExpression::percent(value).into_ref()
}

fn color(hex: &str) -> ExprRef {
    ValueExpression::color(Color::from_hex(hex).unwrap()).into_ref()
}

fn kw(text: &str) -> ExprRef {
    ValueExpression::string(text).into_ref()
}

fn call(name: &str, args: Vec<ExprRef>) -> ExprRef {
    FunctionExpression::new(name, args).into_ref()
}

fn render(expr: &ExprRef) -> String {
    let mut f = CssFormatter::new();
    expr.string_value(&mut f).unwrap()
}

fn render_call(name: &str, args: Vec<ExprRef>) -> String {
    render(&call(name, args))
}

#[test]
fn test_rgb() {
    assert_eq!(render_call("rgb", vec![num(255.0, ""), num(0.0, ""), num(0.0, "")]), "#ff0000");
    assert_eq!(render_call("rgb", vec![pct(100.0), pct(0.0), pct(50.0)]), "#ff0080");
}

#[test]
fn test_names_are_case_insensitive() {
    assert_eq!(render_call("RGB", vec![num(255.0, ""), num(0.0, ""), num(0.0, "")]), "#ff0000");
}

#[test]
fn test_rgba_renders_with_alpha() {
    let expr = call("rgba", vec![num(255.0, ""), num(0.0, ""), num(0.0, ""), num(0.5, "")]);
    let mut f = CssFormatter::new();
    assert_eq!(expr.data_type(&mut f).unwrap(), DataType::Rgba);
    assert_eq!(render(&expr), "rgba(255, 0, 0, 0.5)");
}

#[test]
fn test_lighten_and_darken() {
    assert_eq!(render_call("lighten", vec![color("#000000"), pct(50.0)]), "#808080");
    assert_eq!(render_call("darken", vec![color("#ffffff"), pct(100.0)]), "#000000");
}

#[test]
fn test_lighten_keeps_alpha() {
    let translucent = call("rgba", vec![num(0.0, ""), num(0.0, ""), num(0.0, ""), num(0.5, "")]);
    assert_eq!(
        render_call("lighten", vec![translucent, pct(50.0)]),
        "rgba(128, 128, 128, 0.5)"
    );
}

#[test]
fn test_mix() {
    assert_eq!(
        render_call("mix", vec![color("#ff0000"), color("#0000ff"), num(0.5, "")]),
        "#800080"
    );
    assert_eq!(
        render_call("mix", vec![color("#ff0000"), color("#0000ff"), pct(50.0)]),
        "#800080"
    );
    assert_eq!(render_call("mix", vec![color("#ff0000"), color("#0000ff")]), "#800080");
    assert_eq!(
        render_call("mix", vec![color("#ff0000"), color("#0000ff"), pct(25.0)]),
        "#4000bf"
    );
}

#[test]
fn test_contrast() {
    assert_eq!(
        render_call(
            "contrast",
            vec![color("#222222"), color("#000000"), color("#ffffff"), num(0.43, "")]
        ),
        "#ffffff"
    );
    assert_eq!(render_call("contrast", vec![color("#222222")]), "#ffffff");
    assert_eq!(render_call("contrast", vec![color("#eeeeee")]), "#000000");
    // options given in the wrong order are swapped
    assert_eq!(
        render_call("contrast", vec![color("#222222"), color("#ffffff"), color("#000000")]),
        "#ffffff"
    );
}

#[test]
fn test_multiply_and_screen_identities() {
    assert_eq!(render_call("multiply", vec![color("#ffffff"), color("#336699")]), "#336699");
    assert_eq!(render_call("screen", vec![color("#000000"), color("#336699")]), "#336699");
    assert_eq!(render_call("multiply", vec![color("#000000"), color("#336699")]), "#000000");
}

#[test]
fn test_hsl_family() {
    assert_eq!(render_call("hsl", vec![num(120.0, ""), pct(100.0), pct(50.0)]), "#00ff00");
    assert_eq!(
        render_call("hsla", vec![num(0.0, ""), pct(100.0), pct(50.0), num(0.5, "")]),
        "rgba(255, 0, 0, 0.5)"
    );
    assert_eq!(render_call("spin", vec![color("#ff0000"), num(120.0, "")]), "#00ff00");
    assert_eq!(render_call("greyscale", vec![color("#ff0000")]), "#808080");
    assert_eq!(render_call("desaturate", vec![color("#ff0000"), pct(100.0)]), "#808080");
}

#[test]
fn test_hsv_family() {
    assert_eq!(render_call("hsv", vec![num(0.0, ""), pct(100.0), pct(100.0)]), "#ff0000");
    assert_eq!(render_call("hsvhue", vec![color("#00ff00")]), "120");
    assert_eq!(render_call("hsvsaturation", vec![color("#ff0000")]), "100%");
    assert_eq!(render_call("hsvvalue", vec![color("#ff0000")]), "100%");
}

#[test]
fn test_fade_family() {
    assert_eq!(
        render_call("fade", vec![color("#ff0000"), pct(50.0)]),
        "rgba(255, 0, 0, 0.5)"
    );
    assert_eq!(
        render_call("fadeout", vec![color("#ff0000"), pct(50.0)]),
        "rgba(255, 0, 0, 0.5)"
    );
    let half = call("fade", vec![color("#ff0000"), pct(50.0)]);
    assert_eq!(render_call("fadein", vec![half, pct(50.0)]), "#ff0000");
}

#[test]
fn test_channel_accessors() {
    assert_eq!(render_call("red", vec![color("#102030")]), "16");
    assert_eq!(render_call("green", vec![color("#102030")]), "32");
    assert_eq!(render_call("blue", vec![color("#102030")]), "48");
    assert_eq!(render_call("hue", vec![color("#ff0000")]), "0");
    assert_eq!(render_call("saturation", vec![color("#ff0000")]), "100%");
    assert_eq!(render_call("lightness", vec![color("#ffffff")]), "100%");
    assert_eq!(render_call("luma", vec![color("#ffffff")]), "100%");
    assert_eq!(render_call("luminance", vec![color("#000000")]), "0%");
}

#[test]
fn test_alpha() {
    let translucent = call("rgba", vec![num(255.0, ""), num(0.0, ""), num(0.0, ""), pct(50.0)]);
    assert_eq!(render_call("alpha", vec![translucent]), "0.5");
    assert_eq!(render_call("alpha", vec![color("#ff0000")]), "1");
    assert_eq!(render_call("alpha", vec![kw("opacity=50")]), "alpha(opacity=50)");
}

#[test]
fn test_math() {
    assert_eq!(render_call("percentage", vec![num(0.5, "")]), "50%");
    assert_eq!(render_call("round", vec![num(1.67, ""), num(1.0, "")]), "1.7");
    assert_eq!(render_call("round", vec![num(2.5, "px")]), "3px");
    assert_eq!(render_call("floor", vec![num(2.6, "px")]), "2px");
    assert_eq!(render_call("ceil", vec![pct(20.1)]), "21%");
    assert_eq!(render_call("abs", vec![num(-5.0, "px")]), "5px");
    assert_eq!(render_call("mod", vec![num(11.0, "px"), num(3.0, "")]), "2px");
    assert_eq!(render_call("sqrt", vec![num(25.0, "")]), "5");
    assert_eq!(render_call("pow", vec![num(2.0, "px"), num(3.0, "")]), "8px");
    assert_eq!(render_call("pi", vec![]), "3.14159265");
    assert_eq!(render_call("increment", vec![num(1.0, "")]), "2");
    assert_eq!(render_call("add", vec![num(1.0, ""), num(2.0, "")]), "3");
}

#[test]
fn test_trigonometry() {
    assert_eq!(render_call("sin", vec![num(90.0, "deg")]), "1");
    assert_eq!(render_call("cos", vec![num(0.0, "")]), "1");
    assert_eq!(render_call("atan", vec![num(1.0, "")]), "0.78539816rad");
}

#[test]
fn test_unit_conversion() {
    assert_eq!(render_call("convert", vec![num(1.0, "s"), kw("ms")]), "1000ms");
    assert_eq!(render_call("min", vec![num(3.0, "px"), num(1.0, "in")]), "3px");
    assert_eq!(render_call("max", vec![num(3.0, "px"), num(1.0, "in")]), "96px");
    assert_eq!(
        render_call("max", vec![num(1.0, ""), num(2.0, ""), num(3.0, "")]),
        "3"
    );
    assert_eq!(render_call("unit", vec![num(5.0, "px"), kw("em")]), "5em");
    assert_eq!(render_call("unit", vec![num(5.0, "px")]), "5");
}

#[test]
fn test_incompatible_units_write_through() {
    assert_eq!(render_call("convert", vec![num(1.0, "px"), kw("s")]), "convert(1px, s)");
    assert_eq!(render_call("min", vec![num(10.0, "px"), pct(5.0)]), "min(10px, 5%)");
}

#[test]
fn test_lists() {
    let mut f = CssFormatter::new();
    let mut vars = Bindings::new();
    vars.insert(
        "@list".to_string(),
        ListExpression::space(vec![num(1.0, "px"), num(2.0, "px"), num(3.0, "px")]).into_ref(),
    );
    f.push_variables(Some(vars));
    let list = || VariableExpression::new("@list").into_ref();

    let length = call("length", vec![list()]);
    assert_eq!(length.string_value(&mut f).unwrap(), "3");

    let second = call("extract", vec![list(), num(2.0, "")]);
    assert_eq!(second.string_value(&mut f).unwrap(), "2px");
    assert_eq!(second.double_value(&mut f).unwrap(), 2.0);

    let out_of_range = call("extract", vec![list(), num(5.0, "")]);
    assert_eq!(
        out_of_range.string_value(&mut f).unwrap(),
        "extract(1px 2px 3px, 5)"
    );
    f.pop_mixin_scope().unwrap();
}

#[test]
fn test_isnumber() {
    assert_eq!(render_call("isnumber", vec![num(5.0, "")]), "true");
    assert_eq!(render_call("isnumber", vec![color("#ffffff")]), "false");
    assert_eq!(render_call("isnumber", vec![pct(5.0)]), "false");
}

#[test]
fn test_negation_and_parentheses() {
    assert_eq!(render_call("-", vec![num(3.0, "px")]), "-3px");
    assert_eq!(render_call("", vec![num(2.0, "px")]), "2px");
    assert_eq!(render_call("", vec![color("#ff0000")]), "#ff0000");

    let grouped = call("", vec![num(1.0, ""), num(2.0, "")]);
    let mut f = CssFormatter::new();
    match grouped.value(&mut f) {
        Err(LessError::Compile { message, .. }) => assert_eq!(message, "Unrecognised input"),
        other => panic!("Expected compile error, got {:?}", other),
    }
}

#[test]
fn test_arity_fallback_writes_call_through() {
    assert_eq!(render_call("rgb", vec![num(255.0, ""), num(0.0, "")]), "rgb(255, 0)");
    assert_eq!(render_call("lighten", vec![color("#000000")]), "lighten(#000000)");
    assert_eq!(render_call("saturate", vec![pct(150.0)]), "saturate(150%)");
}

#[test]
fn test_unknown_functions_write_through() {
    assert_eq!(
        render_call("translate", vec![num(10.0, "px"), num(5.0, "px")]),
        "translate(10px, 5px)"
    );
    assert_eq!(
        render_call("-webkit-calc", vec![kw("100% - 10px")]),
        "-webkit-calc(100% - 10px)"
    );
    let mut f = CssFormatter::new();
    assert_eq!(
        call("translate", vec![num(1.0, "px")]).data_type(&mut f).unwrap(),
        DataType::String
    );
}

#[test]
fn test_undefined_variable_is_an_error() {
    let expr = call("percentage", vec![VariableExpression::new("@missing").into_ref()]);
    let mut f = CssFormatter::new();
    assert!(matches!(
        expr.value(&mut f),
        Err(LessError::UndefinedVariable { .. })
    ));
}

#[test]
fn test_result_follows_scope_changes() {
    let mut f = CssFormatter::new();
    let mut root = Bindings::new();
    root.insert("@x".to_string(), num(1.0, ""));
    f.push_variables(Some(root));

    let expr = call("percentage", vec![VariableExpression::new("@x").into_ref()]);
    assert_eq!(expr.string_value(&mut f).unwrap(), "100%");
    assert_eq!(expr.string_value(&mut f).unwrap(), "100%");

    let mut inner = Bindings::new();
    inner.insert("@x".to_string(), num(0.5, ""));
    f.push_mixin_scope(None, None, Some(inner));
    assert_eq!(expr.string_value(&mut f).unwrap(), "50%");
    f.pop_mixin_scope().unwrap();

    assert_eq!(expr.string_value(&mut f).unwrap(), "100%");
    f.pop_mixin_scope().unwrap();
}

#[test]
fn test_call_sees_variables_exported_after_first_evaluation() {
    let mut f = CssFormatter::new();
    f.push_variables(Some(Bindings::new()));

    let expr = call("percentage", vec![VariableExpression::new("@y").into_ref()]);
    assert!(expr.string_value(&mut f).is_err());

    let mut inner = Bindings::new();
    inner.insert("@y".to_string(), num(0.25, ""));
    f.push_mixin_scope(None, None, Some(inner));
    f.pop_mixin_scope().unwrap();

    assert_eq!(expr.string_value(&mut f).unwrap(), "25%");
    f.pop_mixin_scope().unwrap();
}
