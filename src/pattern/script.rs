//! Inline-script JSON extraction.
//!
//! Player pages rarely ship clean JSON. The payload is usually a slice of
//! a bigger script (`"streams":[ {...}, {...} ]` with the brackets cut
//! off), or a JavaScript object literal with single quotes, bare keys and
//! escaped slashes. These helpers cut the fragment out and repair it far
//! enough for `serde_json`.

use serde::de::DeserializeOwned;
use tracing::debug;

/// Text after the first `start` and before the next `end`.
pub fn slice_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    let to = rest.find(end)?;
    Some(&rest[..to])
}

/// Text after the first `start` and before the last `end`.
pub fn slice_outer<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    let to = rest.rfind(end)?;
    Some(&rest[..to])
}

/// Put back the brackets a [`slice_between`] cut off an array body.
pub fn wrap_array(fragment: &str) -> String {
    format!("[{fragment}]")
}

/// Rewrite a JS object literal into JSON.
///
/// Handles single-quoted strings, bare identifier keys, `\/` escapes and
/// trailing commas. Anything else passes through untouched.
pub fn normalize_js_object(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len() + 16);
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            match c {
                '\\' if i + 1 < chars.len() => {
                    let next = chars[i + 1];
                    match next {
                        '/' => out.push('/'),
                        '\'' => out.push('\''),
                        _ => {
                            out.push('\\');
                            out.push(next);
                        }
                    }
                    i += 2;
                    continue;
                }
                _ if c == q => {
                    out.push('"');
                    quote = None;
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push('"');
                i += 1;
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                let next = chars[i..].iter().find(|ch| !ch.is_whitespace());
                if next == Some(&':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Parse as JSON, falling back to [`normalize_js_object`].
///
/// Unparseable fragments are logged and skipped, never fatal.
pub fn parse_lenient<T: DeserializeOwned>(fragment: &str) -> Option<T> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(fragment) {
        return Some(value);
    }
    match serde_json::from_str(&normalize_js_object(fragment)) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("skipping unparseable script fragment: {e}");
            None
        }
    }
}
