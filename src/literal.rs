//! Object literals accepted by INSERT/INCLUDE on schema-less tables.
//!
//! The language is relaxed JSON: keys and single-word string values may be
//! left bare (`{name: Alice, age: 30}`) and strings may use single quotes.
//! The text is normalised to strict JSON and then parsed with serde_json,
//! keeping every key/value pair so repeated keys can be reported.

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{DbError, Result};
use crate::value::{Record, Value};

lazy_static! {
    static ref BARE_KEY: Regex = Regex::new(r"([\{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap();
    static ref BARE_VALUE: Regex =
        Regex::new(r"(:\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*[\},])").unwrap();
}

/// One object with its pairs in source order, duplicates included.
struct RawObject(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = RawObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object literal")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RawObject, A::Error> {
                let mut pairs = Vec::new();
                while let Some(pair) = access.next_entry::<String, JsonValue>()? {
                    pairs.push(pair);
                }
                Ok(RawObject(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Quotes bare keys and bare word values in text outside any string literal.
fn normalise_plain(text: &str) -> String {
    let text = BARE_KEY.replace_all(text, "$1\"$2\":");
    let text = BARE_VALUE.replace_all(&text, |caps: &Captures| match &caps[2] {
        "true" | "false" | "null" => caps[0].to_string(),
        word => format!("{}\"{}\"{}", &caps[1], word, &caps[3]),
    });
    text.into_owned()
}

/// Rewrites relaxed syntax to JSON. Double-quoted spans are copied through
/// untouched and single-quoted spans become JSON strings.
fn normalise(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut plain = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                out.push_str(&normalise_plain(&plain));
                plain.clear();
                out.push('"');
                let mut escaped = false;
                for c in chars.by_ref() {
                    out.push(c);
                    match c {
                        '\\' if !escaped => escaped = true,
                        '"' if !escaped => break,
                        _ => escaped = false,
                    }
                }
            }
            '\'' => {
                out.push_str(&normalise_plain(&plain));
                plain.clear();
                let mut content = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    content.push(c);
                }
                if closed {
                    out.push_str(&JsonValue::from(content).to_string());
                } else {
                    // Left unbalanced so serde_json reports the position.
                    out.push('\'');
                    out.push_str(&content);
                }
            }
            c => plain.push(c),
        }
    }
    out.push_str(&normalise_plain(&plain));
    out
}

fn convert(field: &str, value: JsonValue) -> Result<Value> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(b)),
        JsonValue::Number(n) => Ok(n.as_i64().map(Value::Int).unwrap_or_else(|| {
            Value::Float(n.as_f64().unwrap_or(f64::NAN))
        })),
        JsonValue::String(s) => Ok(Value::Text(s)),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(DbError::Syntax(format!(
            "Nested values are not supported (field '{}').",
            field
        ))),
    }
}

fn into_record(object: RawObject) -> Result<Record> {
    let mut record = Record::new();
    for (key, value) in object.0 {
        if record.contains(&key) {
            return Err(DbError::DuplicateKey(key));
        }
        let value = convert(&key, value)?;
        record.set(&key, value);
    }
    Ok(record)
}

/// Parses `{...}` or `[{...}, ...]` into records.
pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let trimmed = text.trim();
    let json = normalise(trimmed);
    let invalid = |e: serde_json::Error| DbError::Syntax(format!("Invalid object literal: {}", e));

    let objects = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<RawObject>>(&json).map_err(invalid)?
    } else if trimmed.starts_with('{') {
        vec![serde_json::from_str::<RawObject>(&json).map_err(invalid)?]
    } else {
        return Err(DbError::Syntax(
            "Expected {field: value, ...} or [{...}, {...}].".to_string(),
        ));
    };

    if objects.is_empty() {
        return Err(DbError::Syntax("Empty data provided.".to_string()));
    }
    objects.into_iter().map(into_record).collect()
}
