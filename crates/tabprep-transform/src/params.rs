//! Parameter coercion.
//!
//! User overrides arrive loosely typed, usually as strings. [`coerce`] turns a
//! string into a [`ParamValue`] using these rules, first match wins, tested
//! against the lower-cased text:
//!
//! 1. contains `.` and is otherwise all digits: float
//! 2. all digits: int
//! 3. `true` / `false`: boolean
//! 4. `none`: null
//! 5. starts with `[`: list of strings
//! 6. starts with `(`: tuple literal
//! 7. `nan`: NaN
//! 8. anything else: the string, with its original casing
//!
//! [`apply_overrides`] then assigns each value through
//! [`Transformer::set_param`].

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

use crate::error::{Result, TransformError};
use crate::transformer::Transformer;

/// A typed transformer parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<String>),
    Tuple(Vec<ParamValue>),
    Nan,
    Str(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value; ints widen to float and NaN is accepted.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Nan => Some(f64::NAN),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// A pair of numbers, from a two-element tuple or list.
    pub fn as_float_pair(&self) -> Option<(f64, f64)> {
        match self {
            Self::Tuple(items) if items.len() == 2 => {
                Some((items[0].as_float()?, items[1].as_float()?))
            }
            Self::List(items) if items.len() == 2 => {
                Some((items[0].parse().ok()?, items[1].parse().ok()?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Null => f.write_str("none"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                if parts.len() == 1 {
                    write!(f, "({},)", parts[0])
                } else {
                    write!(f, "({})", parts.join(", "))
                }
            }
            Self::Nan => f.write_str("nan"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Null => serializer.serialize_none(),
            Self::List(items) => items.serialize(serializer),
            Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Nan => serializer.serialize_str("nan"),
            Self::Str(value) => serializer.serialize_str(value),
        }
    }
}

/// Coerce a string-encoded override into a typed value.
pub fn coerce(name: &str, raw: &str) -> Result<ParamValue> {
    let syntax_error = || TransformError::ParameterSyntax {
        name: name.to_string(),
        value: raw.to_string(),
    };
    let lower = raw.to_lowercase();

    if lower.contains('.') {
        let digits = lower.replace('.', "");
        if is_all_digits(&digits) {
            return lower
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| syntax_error());
        }
    }
    if is_all_digits(&lower) {
        return lower
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| syntax_error());
    }
    match lower.as_str() {
        "true" => return Ok(ParamValue::Bool(true)),
        "false" => return Ok(ParamValue::Bool(false)),
        "none" => return Ok(ParamValue::Null),
        _ => {}
    }
    if lower.starts_with('[') {
        return Ok(ParamValue::List(parse_list(raw)));
    }
    if lower.starts_with('(') {
        return LiteralParser::parse(raw).ok_or_else(syntax_error);
    }
    if lower == "nan" {
        return Ok(ParamValue::Nan);
    }
    Ok(ParamValue::Str(raw.to_string()))
}

/// Coerce a JSON override. Strings go through [`coerce`]; typed values keep their type.
pub fn coerce_json(name: &str, value: &Value) -> Result<ParamValue> {
    match value {
        Value::String(raw) => coerce(name, raw),
        Value::Null => Ok(ParamValue::Null),
        Value::Bool(flag) => Ok(ParamValue::Bool(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Ok(ParamValue::Int(int)),
            None => number
                .as_f64()
                .map(ParamValue::Float)
                .ok_or_else(|| TransformError::ParameterSyntax {
                    name: name.to_string(),
                    value: number.to_string(),
                }),
        },
        Value::Array(items) => Ok(ParamValue::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        Value::Object(_) => Err(TransformError::ParameterSyntax {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Coerce and assign every override onto a transformer, in key order.
///
/// Stops at the first failure; the transformer may be partially updated.
pub fn apply_overrides(
    transformer: &mut dyn Transformer,
    overrides: &BTreeMap<String, Value>,
) -> Result<()> {
    for (name, raw) in overrides {
        let value = coerce_json(name, raw)?;
        tracing::warn!(
            transformer = transformer.name(),
            parameter = %name,
            value = %value,
            "changing transformer parameter"
        );
        transformer.set_param(name, value)?;
    }
    Ok(())
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn parse_list(raw: &str) -> Vec<String> {
    let inner = raw.trim().strip_prefix('[').unwrap_or(raw);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|item| strip_quotes(item.trim()).to_string())
        .collect()
}

fn strip_quotes(item: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = item
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    item
}

/// Parser for tuple literals such as `(25.0, 75.0)` or `('a', None, (1, 2))`.
struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn parse(src: &'a str) -> Option<ParamValue> {
        let mut parser = Self { src, pos: 0 };
        let value = parser.value()?;
        parser.skip_ws();
        (parser.pos == src.len()).then_some(value)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<ParamValue> {
        self.skip_ws();
        match self.peek()? {
            '(' => self.tuple(),
            quote @ ('\'' | '"') => self.quoted(quote),
            _ => self.atom(),
        }
    }

    fn tuple(&mut self) -> Option<ParamValue> {
        self.eat('(');
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            if self.eat(')') {
                break;
            }
            items.push(self.value()?);
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            if self.eat(')') {
                break;
            }
            return None;
        }
        if items.len() == 1 && !saw_comma {
            return items.pop();
        }
        Some(ParamValue::Tuple(items))
    }

    fn quoted(&mut self, quote: char) -> Option<ParamValue> {
        self.pos += quote.len_utf8();
        let end = self.rest().find(quote)?;
        let text = self.rest()[..end].to_string();
        self.pos += end + quote.len_utf8();
        Some(ParamValue::Str(text))
    }

    fn atom(&mut self) -> Option<ParamValue> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c == ',' || c == ')' || c.is_whitespace())
            .unwrap_or(rest.len());
        let token = &rest[..end];
        if token.is_empty() {
            return None;
        }
        self.pos += end;
        match token.to_lowercase().as_str() {
            "true" => Some(ParamValue::Bool(true)),
            "false" => Some(ParamValue::Bool(false)),
            "none" => Some(ParamValue::Null),
            _ => token
                .parse::<i64>()
                .map(ParamValue::Int)
                .ok()
                .or_else(|| token.parse::<f64>().ok().filter(|v| v.is_finite()).map(ParamValue::Float)),
        }
    }
}
