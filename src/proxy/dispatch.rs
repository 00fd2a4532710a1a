//! Runtime objects serving accessor calls.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use toml::Value;

use super::binder::{self, AccessorBinding, BindContext};
use super::decl::{ConfigInterface, InterfaceType};
use super::key::normalize_prefix;
use crate::config::ConfigError;
use crate::Error;

/// Method name of the display operation.
pub const DISPLAY_METHOD: &str = "toString";

/// What an accessor call produced.
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Value),
    Interface(Proxy),
    Map(ProxyMap),
}

impl Resolved {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_proxy(self) -> Option<Proxy> {
        match self {
            Resolved::Interface(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<ProxyMap> {
        match self {
            Resolved::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(Value::String(s)) => f.write_str(s),
            Resolved::Value(value) => write!(f, "{value}"),
            Resolved::Interface(proxy) => write!(f, "{proxy}"),
            Resolved::Map(map) => write!(f, "{map}"),
        }
    }
}

/// A bound configuration interface.
///
/// Cheap to clone; clones share the same bindings and caches, and
/// [`Proxy::ptr_eq`] tells whether two handles are the same instance. Safe to
/// share between threads.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    ty: InterfaceType,
    interface: String,
    prefix: String,
    bindings: Vec<AccessorBinding>,
    index: HashMap<String, usize>,
}

impl Proxy {
    pub(crate) fn new(ty: InterfaceType, interface: String, prefix: String, bindings: Vec<AccessorBinding>) -> Self {
        let index = bindings
            .iter()
            .enumerate()
            .map(|(i, binding)| (binding.method().to_string(), i))
            .collect();
        Self {
            inner: Arc::new(ProxyInner {
                ty,
                interface,
                prefix,
                bindings,
                index,
            }),
        }
    }

    /// The interface's simple name.
    pub fn interface_name(&self) -> &str {
        &self.inner.interface
    }

    pub fn interface_type(&self) -> InterfaceType {
        self.inner.ty
    }

    /// The normalised prefix, `""` or ending in `.`.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Bindings in declaration order.
    pub fn bindings(&self) -> &[AccessorBinding] {
        &self.inner.bindings
    }

    pub fn binding(&self, method: &str) -> Option<&AccessorBinding> {
        self.inner.index.get(method).map(|&i| &self.inner.bindings[i])
    }

    pub fn ptr_eq(a: &Proxy, b: &Proxy) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Calls `method` with `args`.
    ///
    /// Bound methods delegate to their resolver and their errors propagate
    /// unchanged. An unbound [`DISPLAY_METHOD`] returns the summary string;
    /// anything else is [`Error::UnsupportedMethod`].
    pub fn invoke(&self, method: &str, args: &[&dyn Display]) -> Result<Resolved, Error> {
        if let Some(binding) = self.binding(method) {
            return binding.resolver.invoke(args);
        }
        if method == DISPLAY_METHOD {
            return Ok(Resolved::Value(Value::String(self.summary())));
        }
        Err(Error::UnsupportedMethod {
            interface: self.inner.interface.clone(),
            method: method.to_string(),
        })
    }

    /// Calls a leaf accessor and deserializes its value.
    pub fn get<T: DeserializeOwned>(&self, method: &str) -> Result<T, Error> {
        self.get_with(method, &[])
    }

    /// Calls a parameterized leaf accessor and deserializes its value.
    pub fn get_with<T: DeserializeOwned>(&self, method: &str, args: &[&dyn Display]) -> Result<T, Error> {
        match self.invoke(method, args)? {
            Resolved::Value(value) => value
                .try_into()
                .map_err(|e| Error::Config(ConfigError::DeserializeError(e))),
            _ => Err(self.unexpected(method, "a value")),
        }
    }

    /// Calls a nested-interface accessor.
    pub fn nested<T: ConfigInterface>(&self, method: &str) -> Result<T, Error> {
        match self.invoke(method, &[])? {
            Resolved::Interface(proxy) if proxy.is::<T>() => Ok(T::from_proxy(proxy)),
            _ => Err(self.unexpected(method, std::any::type_name::<T>())),
        }
    }

    /// Calls a map accessor.
    pub fn map(&self, method: &str) -> Result<ProxyMap, Error> {
        match self.invoke(method, &[])? {
            Resolved::Map(map) => Ok(map),
            _ => Err(self.unexpected(method, "a map")),
        }
    }

    /// Calls a map accessor and looks up `key` in the result.
    pub fn entry<T: ConfigInterface>(&self, method: &str, key: &str) -> Result<T, Error> {
        let proxy = self.map(method)?.get(key)?;
        if proxy.is::<T>() {
            Ok(T::from_proxy(proxy))
        } else {
            Err(self.unexpected(method, std::any::type_name::<T>()))
        }
    }

    /// Whether this proxy was bound from `T`'s declaration.
    pub fn is<T: ConfigInterface>(&self) -> bool {
        self.inner.ty == InterfaceType::of::<T>()
    }

    /// Renders `Name[key='value', ...]` in declaration order, with the
    /// prefix stripped from each key. A failing accessor shows its error
    /// message in place of the value.
    pub fn summary(&self) -> String {
        let fields: Vec<String> = self
            .inner
            .bindings
            .iter()
            .map(|binding| {
                let key = binding.key().strip_prefix(self.prefix()).unwrap_or(binding.key());
                let value = match binding.resolver.invoke(&[]) {
                    Ok(resolved) => resolved.to_string(),
                    Err(e) => e.to_string(),
                };
                format!("{key}='{value}'")
            })
            .collect();
        format!("{}[{}]", self.inner.interface, fields.join(", "))
    }

    fn unexpected(&self, method: &str, expected: &'static str) -> Error {
        Error::UnexpectedReturn {
            interface: self.inner.interface.clone(),
            method: method.to_string(),
            expected,
        }
    }
}

impl Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("interface", &self.inner.interface)
            .field("prefix", &self.inner.prefix)
            .field("bindings", &self.inner.bindings)
            .finish()
    }
}

/// String-keyed sub-proxies of one interface type, built on first request.
///
/// Each key is bound once under `<map key>.<key>.` and the same instance is
/// returned from then on, including to concurrent first callers. Entries are
/// never evicted.
#[derive(Clone)]
pub struct ProxyMap {
    inner: Arc<MapInner>,
}

struct MapInner {
    ctx: Arc<BindContext>,
    value_type: InterfaceType,
    key: String,
    immutable: bool,
    slots: DashMap<String, Arc<Slot>>,
}

#[derive(Default)]
struct Slot {
    proxy: OnceLock<Proxy>,
    init: Mutex<()>,
}

impl ProxyMap {
    pub(crate) fn new(ctx: Arc<BindContext>, value_type: InterfaceType, key: String, immutable: bool) -> Self {
        Self {
            inner: Arc::new(MapInner {
                ctx,
                value_type,
                key,
                immutable,
                slots: DashMap::new(),
            }),
        }
    }

    /// The property key the map lives under.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns the sub-proxy for `key`, binding it on first use.
    pub fn get(&self, key: &str) -> Result<Proxy, Error> {
        let slot = self.slot(key);
        if let Some(proxy) = slot.proxy.get() {
            return Ok(proxy.clone());
        }

        // Serialises construction per key only; other keys proceed.
        let _guard = slot.init.lock();
        if let Some(proxy) = slot.proxy.get() {
            return Ok(proxy.clone());
        }
        let ty = self.inner.value_type;
        let prefix = normalize_prefix(&format!("{}.{}", self.inner.key, key));
        let proxy = binder::build(&self.inner.ctx, ty, ty.declare(), prefix, self.inner.immutable)?;
        tracing::debug!(map = %self.inner.key, entry = %key, "constructed map entry");
        Ok(slot.proxy.get_or_init(|| proxy).clone())
    }

    /// Calls `get` and wraps the result in its facade type.
    pub fn get_as<T: ConfigInterface>(&self, key: &str) -> Result<T, Error> {
        let proxy = self.get(key)?;
        if proxy.is::<T>() {
            Ok(T::from_proxy(proxy))
        } else {
            Err(Error::UnexpectedReturn {
                interface: self.inner.value_type.declare().name,
                method: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
        }
    }

    /// Keys constructed so far, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .slots
            .iter()
            .filter(|entry| entry.value().proxy.get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(a: &ProxyMap, b: &ProxyMap) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        if let Some(slot) = self.inner.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.inner.slots.entry(key.to_string()).or_default().value())
    }
}

impl Display for ProxyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.keys().join(", "))
    }
}

impl fmt::Debug for ProxyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyMap")
            .field("key", &self.inner.key)
            .field("value_type", &self.inner.value_type)
            .field("entries", &self.keys())
            .finish()
    }
}
