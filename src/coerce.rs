use crate::error::{DbError, Result};
use crate::value::{DataType, Value};

/// Removes one pair of matching surrounding quotes, if present.
pub fn strip_quotes(literal: &str) -> &str {
    let trimmed = literal.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Converts a literal token into a value of the given type.
///
/// `field` is only used for error reporting. With no type the literal is kept
/// as (quote-stripped) text.
pub fn coerce(field: &str, literal: &str, data_type: Option<DataType>) -> Result<Value> {
    let text = strip_quotes(literal);
    let mismatch = |expected| DbError::TypeMismatch {
        field: field.to_string(),
        expected,
        literal: literal.trim().to_string(),
    };

    match data_type {
        None | Some(DataType::Text) => Ok(Value::Text(text.to_string())),
        Some(DataType::Int) => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| mismatch(DataType::Int)),
        Some(DataType::Float) => text
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Float)
            .ok_or_else(|| mismatch(DataType::Float)),
        Some(DataType::Bool) => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch(DataType::Bool)),
        },
    }
}
