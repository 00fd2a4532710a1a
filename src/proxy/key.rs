//! Property key derivation from accessor names.

use super::BindingFault;

/// Normalises a prefix to either `""` or a string ending in `.`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{prefix}.")
    }
}

/// The accessor verb stripped from a method name: `get`, `is`, or nothing.
pub fn verb(method: &str) -> &'static str {
    if method.starts_with("get") {
        "get"
    } else if method.starts_with("is") {
        "is"
    } else {
        ""
    }
}

/// Derives the property key for an accessor.
///
/// `getConnectTimeout` under prefix `http.` maps to `http.connectTimeout`;
/// `isEnabled` maps to `http.enabled`. A name override replaces the derived
/// part entirely but still sits under the prefix.
pub fn derive_key(prefix: &str, method: &str, name_override: Option<&str>) -> Result<String, BindingFault> {
    let base = match name_override {
        Some(name) => name.to_string(),
        None => decapitalize(&method[verb(method).len()..]),
    };
    if base.is_empty() {
        return Err(BindingFault::EmptyPropertyName);
    }
    Ok(format!("{prefix}{base}"))
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
