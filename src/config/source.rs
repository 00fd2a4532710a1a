use toml::{Table, Value};

use super::ConfigError;

/// A value to be merged into a store at a dotted path.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }

    /// Builds an entry from a dotted property key such as `server.port`.
    pub fn at_key(key: &str, value: Value) -> Self {
        Self::at_path(split_key(key), value)
    }
}

/// A named body of configuration that can be merged into a store.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

impl<S: ConfigSource + ?Sized> ConfigSource for Box<S> {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        (**self).entries()
    }
}

pub(crate) fn split_key(key: &str) -> Vec<String> {
    key.split('.').map(str::to_string).collect()
}

pub fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(first), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => {
                deep_merge(base, overlay);
            }
            (_, value) => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        table.insert(first.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

/// Removes the value at `path`, returning it. Emptied parent tables are kept.
pub fn remove_at_path(table: &mut Table, path: &[String]) -> Option<Value> {
    let (first, rest) = path.split_first()?;
    if rest.is_empty() {
        return table.remove(first);
    }
    match table.get_mut(first) {
        Some(Value::Table(nested)) => remove_at_path(nested, rest),
        _ => None,
    }
}

/// Looks up a dotted path in the table.
pub fn lookup_path<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = table.get(parts.next()?)?;
    for part in parts {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(toml_str: &str) -> Table {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_merge_at_path_creates_tables() {
        let mut table = Table::new();
        merge_at_path(&mut table, &split_key("a.b.c"), Value::Integer(1));
        assert_eq!(lookup_path(&table, "a.b.c"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_merge_root_is_deep() {
        let mut table = make_table("[server]\nhost = \"a\"\nport = 1");
        let overlay = make_table("[server]\nport = 2");
        merge_at_path(&mut table, &[], Value::Table(overlay));
        assert_eq!(lookup_path(&table, "server.host").and_then(Value::as_str), Some("a"));
        assert_eq!(lookup_path(&table, "server.port"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_scalar_replaced_by_table() {
        let mut table = make_table("server = \"flat\"");
        merge_at_path(&mut table, &split_key("server.port"), Value::Integer(9));
        assert_eq!(lookup_path(&table, "server.port"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_remove_at_path() {
        let mut table = make_table("[a]\nb = 1\nc = 2");
        assert_eq!(remove_at_path(&mut table, &split_key("a.b")), Some(Value::Integer(1)));
        assert_eq!(lookup_path(&table, "a.b"), None);
        assert_eq!(lookup_path(&table, "a.c"), Some(&Value::Integer(2)));
        assert_eq!(remove_at_path(&mut table, &split_key("x.y")), None);
    }

    #[test]
    fn test_lookup_through_scalar_is_none() {
        let table = make_table("a = 1");
        assert_eq!(lookup_path(&table, "a.b"), None);
    }
}
