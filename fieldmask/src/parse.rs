//! Path grammar.
//!
//! A path list is a comma-separated list of paths; a path is a dot-separated
//! chain of segments; a segment is a bare identifier, the wildcard `*`, or a
//! backtick-quoted literal.
//!
//! Inside a quoted segment a backslash starts an escape: `` \` ``, `\\`,
//! `\n`, `\r`, `\t`, `\0` or `\u{...}`. The first unescaped backtick closes
//! the segment.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::error::{Error, Result};

/// The wildcard segment.
pub const WILDCARD: &str = "*";

/// Splits the first path off a comma-separated path list.
///
/// Returns the path (segments still quoted) and the remaining list, which is
/// empty when `input` held a single path.
pub fn next_path(input: &str) -> Result<(&str, &str)> {
    if input.is_empty() {
        return Err(Error::syntax(input));
    }
    let mut rest = input;
    loop {
        let (token, after) = next_token(rest).ok_or_else(|| Error::syntax(input))?;
        if token == "." || token == "," {
            return Err(Error::syntax(input));
        }
        if after.is_empty() {
            return Ok((input, ""));
        }

        let (delim, after) = next_token(after).ok_or_else(|| Error::syntax(input))?;
        if after.is_empty() {
            return Err(Error::syntax(input));
        }
        match delim {
            "," => return Ok((&input[..input.len() - after.len() - 1], after)),
            "." => rest = after,
            _ => return Err(Error::syntax(input)),
        }
    }
}

/// Splits the first segment off a single path.
///
/// The segment is returned as written, so a quoted segment keeps its
/// backticks; see [`unquote`].
pub fn next_segment(path: &str) -> Result<(&str, &str)> {
    let (segment, rest) = next_token(path).ok_or_else(|| Error::syntax(path))?;
    if segment == "." || segment == "," {
        return Err(Error::syntax(path));
    }
    if rest.is_empty() {
        return Ok((segment, ""));
    }
    match next_token(rest) {
        Some((".", rest)) if !rest.is_empty() => Ok((segment, rest)),
        _ => Err(Error::syntax(path)),
    }
}

/// Splits a comma-separated path list into its paths.
pub fn split_paths(input: &str) -> Result<Vec<&str>> {
    let mut paths = Vec::new();
    let mut rest = input;
    loop {
        let (path, after) = next_path(rest)?;
        paths.push(path);
        if after.is_empty() {
            return Ok(paths);
        }
        rest = after;
    }
}

/// Checks that `path` is exactly one well-formed path.
pub fn validate_path(path: &str) -> Result<()> {
    match next_path(path)? {
        (_, "") => Ok(()),
        _ => Err(Error::syntax(path)),
    }
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    match s.as_bytes().first()? {
        b'.' | b',' | b'*' => Some(s.split_at(1)),
        b'`' => {
            let (len, _) = scan_quoted(s)?;
            Some(s.split_at(len))
        }
        _ => match s.find(['.', ',']) {
            Some(i) => Some(s.split_at(i)),
            None => Some((s, "")),
        },
    }
}

/// Scans the quoted token at the head of `s`, returning its length in bytes
/// (both backticks included) and its literal text.
fn scan_quoted(s: &str) -> Option<(usize, String)> {
    let mut out = String::new();
    let mut chars = s.char_indices();
    if chars.next()?.1 != '`' {
        return None;
    }
    while let Some((i, c)) = chars.next() {
        match c {
            '`' => return Some((i + 1, out)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                let c = match escaped {
                    '`' => '`',
                    '\\' => '\\',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '0' => '\0',
                    'u' => {
                        if chars.next()?.1 != '{' {
                            return None;
                        }
                        let mut code = 0u32;
                        let mut digits = 0;
                        loop {
                            let (_, d) = chars.next()?;
                            if d == '}' {
                                break;
                            }
                            digits += 1;
                            if digits > 6 {
                                return None;
                            }
                            code = code * 16 + d.to_digit(16)?;
                        }
                        if digits == 0 {
                            return None;
                        }
                        char::from_u32(code)?
                    }
                    _ => return None,
                };
                out.push(c);
            }
            c => out.push(c),
        }
    }
    None
}

/// Returns the literal text of a segment, removing quotes and escapes.
///
/// Bare segments are returned unchanged.
pub fn unquote(segment: &str) -> Result<Cow<'_, str>> {
    if !segment.starts_with('`') {
        return Ok(Cow::Borrowed(segment));
    }
    match scan_quoted(segment) {
        Some((len, text)) if len == segment.len() => Ok(Cow::Owned(text)),
        _ => Err(Error::syntax(segment)),
    }
}

/// Joins a parent segment and a subpath.
pub fn join_path(parent: &str, sub: &str) -> String {
    let mut out = String::with_capacity(parent.len() + 1 + sub.len());
    out.push_str(parent);
    out.push('.');
    out.push_str(sub);
    out
}

/// Quotes `segment` if it could not be parsed back as a bare segment.
pub fn maybe_quote(segment: &str) -> Cow<'_, str> {
    if should_quote(segment) {
        Cow::Owned(quote(segment))
    } else {
        Cow::Borrowed(segment)
    }
}

fn should_quote(s: &str) -> bool {
    // a leading `*` would lex as the wildcard token
    s.is_empty()
        || s.starts_with('*')
        || s.chars()
            .any(|c| matches!(c, '.' | ',' | '`') || needs_escape(c))
}

fn needs_escape(c: char) -> bool {
    if c == ' ' || matches!(c, '\'' | '"') {
        return false;
    }
    c.is_control() || c.is_whitespace() || c.escape_debug().next() != Some(c)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('`');
    for c in s.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('`');
    out
}
