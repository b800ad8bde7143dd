//! Rendering of replacement scalars in KiCad's lexical conventions.
//!
//! Only *new* bytes go through this module. Atoms that no edit touches are
//! reproduced from the source buffer and never re-encoded.

/// A scalar value to be rendered as a replacement token.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rendered double-quoted with the escape map below
    Str(String),
    /// Rendered as the bare symbol `yes` or `no`
    Bool(bool),
    /// Rendered as plain decimal digits
    Int(i64),
    /// Rendered with up to 10 significant digits, never scientific notation
    Float(f64),
    /// Rendered verbatim; the caller must ensure symbol lexical class
    Sym(String),
}

impl Value {
    /// Render this value as token bytes.
    pub fn encode(&self) -> String {
        match self {
            Value::Str(s) => quote_string(s),
            Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_number(*f),
            Value::Sym(s) => s.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Quote a string value, escaping special characters.
pub fn quote_string(value: &str) -> String {
    let escaped = escape_string(value);
    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    quoted.push_str(&escaped);
    quoted.push('"');
    quoted
}

/// Apply the outgoing escape map: `\` `"` and the three ASCII control
/// characters newline, carriage return, tab. Nothing else is escaped.
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result
}

/// Render a number the way KiCad writes them: integral values as plain
/// decimal, everything else with up to 10 significant digits, trailing zeros
/// stripped, never scientific notation. Magnitudes in `(0, 1e-4]` go through
/// fixed 10-digit fractional notation before stripping.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return (value as i64).to_string();
    }

    let abs = value.abs();
    let rendered = if abs <= 1e-4 {
        format!("{value:.10}")
    } else {
        let int_digits = if abs >= 1.0 {
            abs.log10().floor() as i64 + 1
        } else {
            0
        };
        let precision = (10 - int_digits).clamp(0, 10) as usize;
        format!("{value:.precision$}")
    };
    trim_float(rendered)
}

fn trim_float(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s
    }
}
