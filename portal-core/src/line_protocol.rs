//! InfluxDB line protocol, the format metrics are exchanged in with the host agent.
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
use std::{collections::BTreeMap, iter::Peekable, str::Chars};

use crate::{now_in_nanos, FieldValue, Metric};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing measurement name")]
    MissingMeasurement,

    #[error("malformed tag '{0}'")]
    MalformedTag(String),

    #[error("missing field set")]
    MissingFields,

    #[error("malformed field '{0}'")]
    MalformedField(String),

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidFieldValue { field: String, value: String },

    #[error("unterminated string value for field '{0}'")]
    UnterminatedString(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

const MEASUREMENT_ESCAPES: &[char] = &[',', ' '];
const KEY_ESCAPES: &[char] = &[',', '=', ' '];

struct Cursor<'a> {
    inner: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.inner.peek().copied()
    }

    fn next_if_eq(&mut self, expected: char) -> bool {
        self.inner.next_if_eq(&expected).is_some()
    }

    fn skip_spaces(&mut self) -> usize {
        let mut count = 0;
        while self.next_if_eq(' ') {
            count += 1;
        }

        count
    }

    /// Reads until one of `stops` is found unescaped. The stop character is left in place.
    fn token(&mut self, stops: &[char], escapes: &[char]) -> String {
        let mut token = String::new();

        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }

            self.inner.next();

            if c == '\\' {
                if let Some(escaped) = self.inner.next_if(|n| escapes.contains(n)) {
                    token.push(escaped);
                    continue;
                }

                if let Some(control) = self.peek().and_then(unescape_control) {
                    self.inner.next();
                    token.push(control);
                    continue;
                }
            }

            token.push(c);
        }

        token
    }

    fn rest(&mut self) -> String {
        self.inner.by_ref().collect()
    }
}

/// Parses a single line. Blank lines and comments yield `Ok(None)`.
///
/// When the line carries no timestamp the current time is used.
pub fn parse_line(line: &str) -> Result<Option<Metric>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut cursor = Cursor::new(trimmed);
    let name = cursor.token(MEASUREMENT_ESCAPES, MEASUREMENT_ESCAPES);

    if name.is_empty() {
        return Err(ParseError::MissingMeasurement);
    }

    let mut tags = BTreeMap::new();
    while cursor.next_if_eq(',') {
        let key = cursor.token(KEY_ESCAPES, KEY_ESCAPES);

        if !cursor.next_if_eq('=') {
            return Err(ParseError::MalformedTag(key));
        }

        let value = cursor.token(&[',', ' '], KEY_ESCAPES);

        if key.is_empty() || value.is_empty() {
            return Err(ParseError::MalformedTag(format!("{}={}", key, value)));
        }

        tags.insert(key, value);
    }

    if cursor.skip_spaces() == 0 || cursor.peek().is_none() {
        return Err(ParseError::MissingFields);
    }

    let mut fields = BTreeMap::new();
    loop {
        let key = cursor.token(KEY_ESCAPES, KEY_ESCAPES);

        if key.is_empty() || !cursor.next_if_eq('=') {
            return Err(ParseError::MalformedField(key));
        }

        let value = if cursor.next_if_eq('"') {
            parse_string_value(&mut cursor, &key)?
        } else {
            let raw = cursor.token(&[',', ' '], &[]);
            parse_field_value(&key, &raw)?
        };

        fields.insert(key, value);

        if !cursor.next_if_eq(',') {
            break;
        }
    }

    cursor.skip_spaces();
    let rest = cursor.rest();
    let rest = rest.trim_end();

    let timestamp = if rest.is_empty() {
        now_in_nanos()
    } else {
        rest.parse::<i64>()
            .map_err(|_| ParseError::InvalidTimestamp(rest.to_string()))?
    };

    Ok(Some(Metric {
        name,
        tags,
        fields,
        timestamp,
    }))
}

fn parse_string_value(cursor: &mut Cursor, field: &str) -> Result<FieldValue, ParseError> {
    let mut value = String::new();

    loop {
        match cursor.inner.next() {
            None => return Err(ParseError::UnterminatedString(field.to_string())),
            Some('"') => return Ok(FieldValue::String(value)),
            Some('\\') => {
                if let Some(escaped) = cursor.inner.next_if(|c| *c == '"' || *c == '\\') {
                    value.push(escaped);
                } else if let Some(control) = cursor.peek().and_then(unescape_control) {
                    cursor.inner.next();
                    value.push(control);
                } else {
                    value.push('\\');
                }
            }
            Some(c) => value.push(c),
        }
    }
}

fn parse_field_value(field: &str, raw: &str) -> Result<FieldValue, ParseError> {
    let invalid = || ParseError::InvalidFieldValue {
        field: field.to_string(),
        value: raw.to_string(),
    };

    match raw {
        "t" | "T" | "true" | "True" | "TRUE" => return Ok(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Ok(FieldValue::Boolean(false)),
        _ => {}
    }

    if let Some(digits) = raw.strip_suffix('i') {
        return digits
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid());
    }

    if let Some(digits) = raw.strip_suffix('u') {
        return digits
            .parse::<u64>()
            .map(FieldValue::Unsigned)
            .map_err(|_| invalid());
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(FieldValue::Float(value)),
        _ => Err(invalid()),
    }
}

/// Serializes a metric as one line, without the trailing newline.
///
/// Tags with an empty value are skipped since the protocol cannot represent them.
pub fn encode(metric: &Metric) -> String {
    let mut line = String::with_capacity(128);

    escape_into(&mut line, &metric.name, MEASUREMENT_ESCAPES);

    for (key, value) in metric.tags.iter() {
        if key.is_empty() || value.is_empty() {
            continue;
        }

        line.push(',');
        escape_into(&mut line, key, KEY_ESCAPES);
        line.push('=');
        escape_into(&mut line, value, KEY_ESCAPES);
    }

    for (idx, (key, value)) in metric.fields.iter().enumerate() {
        line.push(if idx == 0 { ' ' } else { ',' });
        escape_into(&mut line, key, KEY_ESCAPES);
        line.push('=');

        match value {
            FieldValue::Float(v) => line.push_str(&v.to_string()),
            FieldValue::Integer(v) => {
                line.push_str(&v.to_string());
                line.push('i');
            }
            FieldValue::Unsigned(v) => {
                line.push_str(&v.to_string());
                line.push('u');
            }
            FieldValue::Boolean(v) => line.push_str(if *v { "true" } else { "false" }),
            FieldValue::String(v) => {
                line.push('"');
                escape_into(&mut line, v, &['"', '\\']);
                line.push('"');
            }
        }
    }

    line.push(' ');
    line.push_str(&metric.timestamp.to_string());

    line
}

/// Control characters are always written as two-character escapes so one metric stays on one
/// line.
fn escape_into(buf: &mut String, value: &str, escapes: &[char]) {
    for c in value.chars() {
        match c {
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\x0c' => buf.push_str("\\f"),
            c => {
                if escapes.contains(&c) {
                    buf.push('\\');
                }

                buf.push(c);
            }
        }
    }
}

fn unescape_control(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'f' => Some('\x0c'),
        _ => None,
    }
}
