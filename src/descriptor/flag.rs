//! Normalization of string-typed boolean flags.
//!
//! Authoring tools write `generated` / `used` as YAML booleans, quoted strings
//! in either case (`"False"`, `"yes"`), or 0/1. They are folded into a real
//! `bool` here and nowhere else.

use serde_yaml::Value;

const TRUE_TOKENS: &[&str] = &["true", "yes", "y", "on", "1"];
const FALSE_TOKENS: &[&str] = &["false", "no", "n", "off", "0", ""];

/// Interpret a flag value. A missing or null value is `false`.
pub fn parse_flag(value: Option<&Value>) -> Result<bool, String> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(format!("flag must be 0 or 1, got {}", n)),
        },
        Some(Value::String(s)) => parse_flag_token(s),
        Some(other) => Err(format!("flag must be a scalar, got {:?}", other)),
    }
}

fn parse_flag_token(token: &str) -> Result<bool, String> {
    let normalized = token.trim().to_ascii_lowercase();
    if TRUE_TOKENS.contains(&normalized.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&normalized.as_str()) {
        Ok(false)
    } else {
        Err(format!("unrecognized flag value '{}'", token))
    }
}
