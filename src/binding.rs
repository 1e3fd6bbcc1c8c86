//! Placeholder handling for statement templates.
//!
//! Templates are scanned once into tokens; quoted strings, quoted identifiers
//! and comments are passed through verbatim so a `?` or `:word` inside them is
//! never mistaken for a parameter. On top of the scanner sit the three
//! rewriting operations the store needs:
//!
//! - [`rebind`] turns generic `?` markers into the store's native style.
//! - [`expand_in`] grows one `?` into one marker per list element.
//! - [`NamedQuery`] turns `:name` markers into positional ones and resolves
//!   the names against a [`NamedArgs`] source at bind time.

use crate::error::{Error, Result};
use crate::sqlite::{Params, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Positional marker syntax understood by the target store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindStyle {
    /// `?`
    Question,
    /// `?1`, `?2`, ...
    #[default]
    Numbered,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p1`, `@p2`, ...
    At,
}

impl BindStyle {
    /// Append the marker for the `n`th (1-based) parameter
    fn write_marker(self, out: &mut String, n: usize) {
        match self {
            BindStyle::Question => out.push('?'),
            BindStyle::Numbered => {
                let _ = write!(out, "?{n}");
            }
            BindStyle::Dollar => {
                let _ = write!(out, "${n}");
            }
            BindStyle::At => {
                let _ = write!(out, "@p{n}");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// SQL text copied to the output unchanged
    Text(&'a str),
    /// A bare `?`
    Question,
    /// `?N` or `$N`, kept as written
    Numbered(&'a str),
    /// `:name`, without the colon
    Named(&'a str),
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Index just past the closing `close`, or the end of input when unterminated.
/// A doubled `close` inside the literal is an escape, as in `'it''s'`.
fn skip_quoted(bytes: &[u8], start: usize, close: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == close {
            if close != b']' && bytes.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn flush<'a>(tokens: &mut Vec<Token<'a>>, sql: &'a str, from: usize, to: usize) {
    if from < to {
        tokens.push(Token::Text(&sql[from..to]));
    }
}

fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    // All delimiters are ASCII, so every split below lands on a char boundary.
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i, bytes[i]),
            b'[' => i = skip_quoted(bytes, i, b']'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |n| i + n + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
            }
            b'?' | b'$' => {
                let digits = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits > 0 {
                    flush(&mut tokens, sql, text_start, i);
                    tokens.push(Token::Numbered(&sql[i..i + 1 + digits]));
                    i += 1 + digits;
                    text_start = i;
                } else if bytes[i] == b'?' {
                    flush(&mut tokens, sql, text_start, i);
                    tokens.push(Token::Question);
                    i += 1;
                    text_start = i;
                } else {
                    i += 1;
                }
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                // `::` is an escaped literal colon
                flush(&mut tokens, sql, text_start, i + 1);
                i += 2;
                text_start = i;
            }
            b':' if bytes.get(i + 1).copied().is_some_and(is_name_start) => {
                flush(&mut tokens, sql, text_start, i);
                let len = bytes[i + 1..]
                    .iter()
                    .take_while(|b| is_name_char(**b))
                    .count();
                tokens.push(Token::Named(&sql[i + 1..i + 1 + len]));
                i += 1 + len;
                text_start = i;
            }
            _ => i += 1,
        }
    }
    flush(&mut tokens, sql, text_start, bytes.len());
    tokens
}

fn render(tokens: &[Token<'_>], out: &mut String) {
    for token in tokens {
        match token {
            Token::Text(text) | Token::Numbered(text) => out.push_str(text),
            Token::Question => out.push('?'),
            Token::Named(name) => {
                out.push(':');
                out.push_str(name);
            }
        }
    }
}

/// Number of bare `?` markers in a template
pub fn placeholder_count(sql: &str) -> usize {
    tokenize(sql)
        .iter()
        .filter(|token| matches!(token, Token::Question))
        .count()
}

/// Rewrite every bare `?` into `style`, numbering from 1 in order of appearance.
///
/// Numbered and named markers, and anything inside quotes or comments, are
/// left as written.
pub fn rebind(style: BindStyle, sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for token in tokenize(sql) {
        match token {
            Token::Question => {
                n += 1;
                style.write_marker(&mut out, n);
            }
            other => render(&[other], &mut out),
        }
    }
    out
}

/// One argument to an IN-expanding query
#[derive(Debug, Clone, PartialEq)]
pub enum InArg {
    Scalar(Value),
    List(Vec<Value>),
}

impl InArg {
    pub fn scalar(value: impl Into<Value>) -> Self {
        InArg::Scalar(value.into())
    }

    /// Build a list argument from anything convertible to values
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        InArg::List(values.into_iter().map(Into::into).collect())
    }
}

/// Expand list arguments into one `?` per element.
///
/// `args` must line up one-to-one with the bare `?` markers of `template`.
/// The returned statement still uses `?`; pass it through [`rebind`] before
/// handing it to a store with another marker style.
pub fn expand_in(template: &str, args: &[InArg]) -> Result<(String, Vec<Value>)> {
    let tokens = tokenize(template);
    let expected = tokens
        .iter()
        .filter(|token| matches!(token, Token::Question))
        .count();
    if expected != args.len() {
        return Err(Error::Arity {
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + 16);
    let mut values = Vec::with_capacity(args.len());
    let mut args = args.iter().enumerate();
    for token in tokens {
        if token != Token::Question {
            render(&[token], &mut out);
            continue;
        }
        let Some((position, arg)) = args.next() else {
            break;
        };
        match arg {
            InArg::Scalar(value) => {
                out.push('?');
                values.push(value.clone());
            }
            InArg::List(list) if list.is_empty() => {
                return Err(Error::EmptyList {
                    position: position + 1,
                });
            }
            InArg::List(list) => {
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('?');
                    values.push(value.clone());
                }
            }
        }
    }
    Ok((out, values))
}

/// A source of values for `:name` parameters
pub trait NamedArgs {
    /// The value bound to `name`, or `None` when the source has no such entry
    fn arg(&self, name: &str) -> Option<Value>;
}

impl NamedArgs for Params {
    fn arg(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

impl NamedArgs for HashMap<String, Value> {
    fn arg(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl NamedArgs for BTreeMap<String, Value> {
    fn arg(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<T: NamedArgs + ?Sized> NamedArgs for &T {
    fn arg(&self, name: &str) -> Option<Value> {
        (**self).arg(name)
    }
}

/// A template with `:name` markers compiled to positional form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    sql: String,
    names: Vec<String>,
}

impl NamedQuery {
    /// Replace every `:name` with a positional marker in `style`.
    ///
    /// A name used twice gets two markers and is bound twice.
    pub fn compile(template: &str, style: BindStyle) -> Self {
        let mut sql = String::with_capacity(template.len());
        let mut names = Vec::new();
        for token in tokenize(template) {
            match token {
                Token::Named(name) => {
                    names.push(name.to_string());
                    style.write_marker(&mut sql, names.len());
                }
                other => render(&[other], &mut sql),
            }
        }
        Self { sql, names }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve every name in order; entries the template never mentions are ignored
    pub fn bind<S: NamedArgs + ?Sized>(&self, source: &S) -> Result<Vec<Value>> {
        self.names
            .iter()
            .map(|name| {
                source.arg(name).ok_or_else(|| Error::UnboundName {
                    name: name.clone(),
                })
            })
            .collect()
    }
}
