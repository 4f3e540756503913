//! Built-ins that produce text rather than a typed value.

use crate::encoding::{base64_encode, encode_data_text, encode_uri_path, escape, guess_mime_type};
use crate::function::{CallError, CallResult, FunctionExpression};
use crate::svg::svg_gradient;
use regex::RegexBuilder;
use sheen_common::LessError;
use sheen_formatter::{remove_quote, CssFormatter, Expression};
use tracing::debug;

const TEXT_BUILTINS: &[&str] = &[
    "%",
    "escape",
    "argb",
    "svg-gradient",
    "replace",
    "get-unit",
    "url",
    "data-uri",
];

pub(crate) fn is_text_builtin(key: &str) -> bool {
    TEXT_BUILTINS.contains(&key)
}

/// Run `body` with inline mode switched on, restoring the previous mode
pub(crate) fn with_inline<T>(f: &mut CssFormatter, body: impl FnOnce(&mut CssFormatter) -> T) -> T {
    let previous = f.inline_mode();
    f.set_inline_mode(true);
    let result = body(f);
    f.set_inline_mode(previous);
    result
}

pub(crate) fn append_text_builtin(call: &FunctionExpression, f: &mut CssFormatter) -> CallResult<()> {
    match call.key() {
        "%" => format(call, f),
        "escape" => {
            let text = call.unquoted(0, f)?;
            f.append(&escape(&text));
            Ok(())
        }
        "argb" => {
            let (color, _) = call.color(0, f)?;
            f.append_char('#').append_hex(color.argb(), 8);
            Ok(())
        }
        "svg-gradient" => svg_gradient(call, f),
        "replace" => replace(call, f),
        "get-unit" => {
            call.arg(0)?;
            let unit = call.unit(f)?;
            f.append(&unit);
            Ok(())
        }
        "url" => {
            let idx = if call.arity() >= 2 { 1 } else { 0 };
            let url = call.arg(idx)?.string_value(f)?;
            f.append("url(").append(&url).append(")");
            Ok(())
        }
        "data-uri" => data_uri(call, f),
        _ => Err(CallError::Arity),
    }
}

/// `%(format, args...)`
fn format(call: &FunctionExpression, f: &mut CssFormatter) -> CallResult<()> {
    let pattern = call.arg(0)?.string_value(f)?;
    let mut next = 1;
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            f.append_char(ch);
            continue;
        }
        match chars.next() {
            Some('%') | None => {
                f.append_char('%');
            }
            Some('a' | 'd') => {
                call.arg(next)?.append_to(f)?;
                next += 1;
            }
            Some('A' | 'D') => {
                let text = call.arg(next)?.string_value(f)?;
                next += 1;
                f.append(&encode_uri_path(&text));
            }
            Some('s') => {
                let arg = call.arg(next)?;
                next += 1;
                with_inline(f, |f| arg.append_to(f))?;
            }
            Some('S') => {
                let arg = call.arg(next)?;
                next += 1;
                let text = with_inline(f, |f| arg.string_value(f))?;
                f.append(&encode_uri_path(&text));
            }
            Some(other) => {
                f.append_char(other);
            }
        }
    }
    Ok(())
}

/// `replace(string, pattern, replacement[, flags])`. Quotes around the
/// subject are kept.
fn replace(call: &FunctionExpression, f: &mut CssFormatter) -> CallResult<()> {
    let subject = call.arg(0)?.string_value(f)?;
    let (pattern, replacement, flags) = with_inline(f, |f| -> CallResult<_> {
        let pattern = call.arg(1)?.string_value(f)?;
        let replacement = call.arg(2)?.string_value(f)?;
        let flags = if call.arity() > 3 {
            call.arg(3)?.string_value(f)?
        } else {
            String::new()
        };
        Ok((pattern, replacement, flags))
    })?;

    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(flags.contains('i'))
        .build()
        .map_err(|e| LessError::Regex(e.to_string()))?;

    let unquoted = remove_quote(&subject);
    let quote = (unquoted.len() != subject.len()).then(|| &subject[..1]);
    let replaced = if flags.contains('g') {
        regex.replace_all(unquoted, replacement.as_str())
    } else {
        regex.replace(unquoted, replacement.as_str())
    };

    let mut out = String::with_capacity(replaced.len() + 2);
    if let Some(quote) = quote {
        out.push_str(quote);
        out.push_str(&replaced);
        out.push_str(quote);
    } else {
        out.push_str(&replaced);
    }
    f.append(&out);
    Ok(())
}

/// `data-uri([mime,] url)`
fn data_uri(call: &FunctionExpression, f: &mut CssFormatter) -> CallResult<()> {
    let (mime, url) = if call.arity() >= 2 {
        (Some(call.unquoted(0, f)?), call.unquoted(1, f)?)
    } else {
        (None, call.unquoted(0, f)?)
    };

    let bytes = match f.resources() {
        Some(loader) => match loader.load(f.base_url(), &url) {
            Ok(bytes) => Some(bytes),
            Err(LessError::Resource { path, message }) => {
                debug!(%path, %message, "Resource not inlined, keeping url");
                None
            }
            Err(err) => return Err(err.into()),
        },
        None => None,
    };
    let Some(bytes) = bytes else {
        f.append(&format!("url(\"{}\")", url));
        return Ok(());
    };

    let (mime, base64) = match &mime {
        Some(mime) => match mime.strip_suffix(";base64") {
            Some(stripped) => (stripped.to_string(), true),
            None => (mime.clone(), false),
        },
        None => {
            let guessed = guess_mime_type(&url);
            (guessed.to_string(), guessed != "image/svg+xml")
        }
    };

    let data = if base64 {
        format!("data:{};base64,{}", mime, base64_encode(&bytes))
    } else {
        let text = String::from_utf8_lossy(&bytes);
        format!("data:{},{}", mime, encode_data_text(&text))
    };
    f.append(&format!("url(\"{}\")", data));
    Ok(())
}
