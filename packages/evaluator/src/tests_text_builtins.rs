/// Built-ins that write text: format, escape, replace, url, data-uri, svg-gradient
use crate::*;
use sheen_color::Color;
use sheen_common::{LessError, MockResourceLoader};
use sheen_formatter::{CssFormatter, ExprRef, Expression, ValueExpression};
use std::rc::Rc;

fn num(value: f64, unit: &str) -> ExprRef {
    ValueExpression::number(value, unit).into_ref()
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

fn render_with(f: &mut CssFormatter, name: &str, args: Vec<ExprRef>) -> String {
    call(name, args).string_value(f).unwrap()
}

fn render_call(name: &str, args: Vec<ExprRef>) -> String {
    render_with(&mut CssFormatter::new(), name, args)
}

fn formatter_with_files(files: &[(&str, &str)]) -> CssFormatter {
    let mut loader = MockResourceLoader::new();
    for (path, content) in files {
        loader.add_file(*path, *content);
    }
    let mut f = CssFormatter::new().with_resources(Rc::new(loader));
    f.begin_pass(Some("styles/main.less"));
    f
}

#[test]
fn test_format() {
    assert_eq!(
        render_call("%", vec![kw("\"%d/%s\""), num(10.0, "px"), kw("\"b\"")]),
        "\"10px/b\""
    );
    assert_eq!(render_call("%", vec![kw("'%A'"), kw("a b")]), "'a%20b'");
    assert_eq!(render_call("%", vec![kw("'100%%'")]), "'100%'");
    assert_eq!(render_call("%", vec![kw("'%x'")]), "'x'");
}

#[test]
fn test_format_missing_argument_writes_through() {
    assert_eq!(render_call("%", vec![kw("'%d'")]), "%('%d')");
}

#[test]
fn test_escape() {
    assert_eq!(render_call("escape", vec![kw("'a=1'")]), "a%3d1");
    assert_eq!(render_call("escape", vec![kw("\"a b\"")]), "a%20b");
}

#[test]
fn test_argb() {
    assert_eq!(render_call("argb", vec![color("#ff0000")]), "#ffff0000");
    assert_eq!(render_call("argb", vec![num(1.0, "")]), "argb(1)");
}

#[test]
fn test_replace() {
    assert_eq!(
        render_call(
            "replace",
            vec![kw("\"Hello, Mars?\""), kw("'Mars\\?'"), kw("'Earth!'")]
        ),
        "\"Hello, Earth!\""
    );
    assert_eq!(
        render_call("replace", vec![kw("'aaa'"), kw("'a'"), kw("'b'")]),
        "'baa'"
    );
    assert_eq!(
        render_call("replace", vec![kw("'aaa'"), kw("'a'"), kw("'b'"), kw("'g'")]),
        "'bbb'"
    );
    assert_eq!(
        render_call("replace", vec![kw("ABC"), kw("'b'"), kw("'x'"), kw("'gi'")]),
        "AxC"
    );
    assert_eq!(
        render_call("replace", vec![kw("'2px'"), kw("'(\\d+)px'"), kw("'${1}em'")]),
        "'2em'"
    );
}

#[test]
fn test_replace_with_invalid_pattern_is_error() {
    let expr = call("replace", vec![kw("'a'"), kw("'('"), kw("'b'")]);
    let mut f = CssFormatter::new();
    assert!(matches!(expr.string_value(&mut f), Err(LessError::Regex(_))));
}

#[test]
fn test_get_unit_and_url() {
    assert_eq!(render_call("get-unit", vec![num(5.0, "px")]), "px");
    assert_eq!(render_call("get-unit", vec![num(5.0, "")]), "");
    assert_eq!(render_call("url", vec![kw("\"a.png\"")]), "url(\"a.png\")");
}

#[test]
fn test_data_uri_base64() {
    let mut f = formatter_with_files(&[("styles/img/a.png", "Man")]);
    assert_eq!(
        render_with(&mut f, "data-uri", vec![kw("'img/a.png'")]),
        "url(\"data:image/png;base64,TWFu\")"
    );
    assert_eq!(
        render_with(&mut f, "data-uri", vec![kw("'image/jpeg;base64'"), kw("'img/a.png'")]),
        "url(\"data:image/jpeg;base64,TWFu\")"
    );
}

#[test]
fn test_data_uri_svg_is_url_encoded() {
    let mut f = formatter_with_files(&[("styles/icon.svg", "<svg/>")]);
    assert_eq!(
        render_with(&mut f, "data-uri", vec![kw("'icon.svg'")]),
        "url(\"data:image/svg+xml,%3csvg/%3e\")"
    );
}

#[test]
fn test_data_uri_missing_resource_keeps_url() {
    let mut f = formatter_with_files(&[]);
    assert_eq!(
        render_with(&mut f, "data-uri", vec![kw("'missing.png'")]),
        "url(\"missing.png\")"
    );
    assert_eq!(
        render_call("data-uri", vec![kw("'missing.png'")]),
        "url(\"missing.png\")"
    );
}

#[test]
fn test_svg_gradient() {
    let stops = vec![
        kw("to right"),
        color("#ffffff"),
        ListExpression::space(vec![color("#000000"), ValueExpression::percent(100.0).into_ref()])
            .into_ref(),
    ];
    let out = render_call("svg-gradient", stops);

    assert!(out.starts_with("url('data:image/svg+xml,"));
    assert!(out.ends_with("')"));
    assert!(out.contains("linearGradient"));
    assert!(out.contains("x2%3d%22100%25%22%20y2%3d%220%25%22"));
    assert!(out.contains("offset%3d%220%25%22%20stop-color%3d%22%23ffffff%22"));
    assert!(out.contains("offset%3d%22100%25%22%20stop-color%3d%22%23000000%22"));
}

#[test]
fn test_svg_gradient_radial_and_opacity() {
    let translucent = call(
        "rgba",
        vec![num(0.0, ""), num(0.0, ""), num(0.0, ""), num(0.5, "")],
    );
    let out = render_call(
        "svg-gradient",
        vec![kw("ellipse at center"), color("#ffffff"), translucent],
    );
    assert!(out.contains("radialGradient"));
    assert!(out.contains("stop-opacity%3d%220.5%22"));
}

#[test]
fn test_svg_gradient_errors() {
    let mut f = CssFormatter::new();
    let bad_direction = call("svg-gradient", vec![kw("to left"), color("#ffffff"), color("#000000")]);
    assert!(bad_direction.string_value(&mut f).is_err());

    let single_stop = call("svg-gradient", vec![kw("to bottom"), color("#ffffff")]);
    assert!(single_stop.string_value(&mut f).is_err());
}

#[test]
fn test_failed_text_builtin_leaves_no_partial_output() {
    let mut f = CssFormatter::new();
    f.push_buffer();
    f.append("a:");
    call("%", vec![kw("'x%d'")]).append_to(&mut f).unwrap();
    assert_eq!(f.capture_and_pop(), "a:%('x%d')");
}
