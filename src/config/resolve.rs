//! Variable reference resolution for configuration strings.
//!
//! Supports `${section.field}` syntax for cross-referencing values in a store.
//! Use `$${...}` to escape and produce a literal `${...}`.

use toml::Value;

use super::ConfigError;

/// Replaces every `${name}` placeholder in `input` using `resolve`.
///
/// `resolve` returning `Ok(None)` leaves the placeholder untouched.
/// `$$` always collapses to a single `$`. A placeholder without its closing
/// brace is reported through `unclosed`.
pub(crate) fn expand_placeholders<E>(
    input: &str,
    mut resolve: impl FnMut(&str) -> Result<Option<String>, E>,
    unclosed: impl FnOnce() -> E,
) -> Result<String, E> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                // Escape sequence: $$ -> $
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next(); // consume '{'
                let Some(name) = consume_until(&mut chars, '}') else {
                    return Err(unclosed());
                };
                match resolve(&name)? {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(&name);
                        result.push('}');
                    }
                }
            }
            _ => result.push('$'),
        }
    }

    Ok(result)
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None // Delimiter not found
}

/// Resolves all `${path.to.field}` references in `literal`.
///
/// `lookup` returns the value stored under a dotted path, already resolved.
/// Missing paths are an error rather than being left in place.
pub fn interpolate(
    literal: &str,
    mut lookup: impl FnMut(&str) -> Result<Option<Value>, ConfigError>,
) -> Result<String, ConfigError> {
    expand_placeholders(
        literal,
        |path| {
            validate_path(path)?;
            let value = lookup(path)?.ok_or_else(|| ConfigError::ReferenceNotFound(path.to_string()))?;
            value_to_string(&value, path).map(Some)
        },
        || ConfigError::UnclosedReference(literal.to_string()),
    )
}

/// Returns true when `s` contains something `interpolate` would rewrite.
pub(crate) fn has_references(s: &str) -> bool {
    s.contains("${") || s.contains("$$")
}

fn validate_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidReferencePath(path.to_string()));
    }
    Ok(())
}

/// Converts a TOML value to its string representation.
pub(crate) fn value_to_string(value: &Value, path: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        Value::Array(_) | Value::Table(_) => {
            Err(ConfigError::NonScalarReference(path.to_string()))
        }
    }
}
