//! The resolution strategies behind bound accessors.

use std::fmt::{self, Display};
use std::sync::{Arc, OnceLock};

use toml::Value;

use super::binder::BindContext;
use super::dispatch::{Proxy, ProxyMap, Resolved};
use super::template;
use crate::config::{PropertyHandle, ValueKind};
use crate::Error;

/// How a binding produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Strategy {
    /// Reads the store on every call.
    Dynamic,
    /// Reads the store once and keeps the value.
    Immutable,
    /// Returns one sub-proxy bound under the accessor's key.
    Nested,
    /// Returns a lazily populated map of sub-proxies.
    Map,
    /// Builds the key from call arguments on every call.
    Parameterized,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Dynamic => "dynamic",
            Strategy::Immutable => "immutable",
            Strategy::Nested => "nested",
            Strategy::Map => "map",
            Strategy::Parameterized => "parameterized",
        };
        f.write_str(name)
    }
}

pub(crate) trait MethodInvoker: Send + Sync {
    fn invoke(&self, args: &[&dyn Display]) -> Result<Resolved, Error>;
}

pub(crate) struct DynamicLeaf {
    handle: PropertyHandle,
}

impl DynamicLeaf {
    pub(crate) fn new(handle: PropertyHandle) -> Self {
        Self { handle }
    }
}

impl MethodInvoker for DynamicLeaf {
    fn invoke(&self, _args: &[&dyn Display]) -> Result<Resolved, Error> {
        Ok(Resolved::Value(self.handle.get()?))
    }
}

/// First successful read wins; concurrent first reads may each query the
/// store, but only one value is ever published.
pub(crate) struct ImmutableLeaf {
    handle: PropertyHandle,
    cached: OnceLock<Value>,
}

impl ImmutableLeaf {
    pub(crate) fn new(handle: PropertyHandle) -> Self {
        Self {
            handle,
            cached: OnceLock::new(),
        }
    }
}

impl MethodInvoker for ImmutableLeaf {
    fn invoke(&self, _args: &[&dyn Display]) -> Result<Resolved, Error> {
        if let Some(value) = self.cached.get() {
            return Ok(Resolved::Value(value.clone()));
        }
        let value = self.handle.get()?;
        let value = self.cached.get_or_init(|| value);
        Ok(Resolved::Value(value.clone()))
    }
}

pub(crate) struct NestedInterface {
    proxy: Proxy,
}

impl NestedInterface {
    pub(crate) fn new(proxy: Proxy) -> Self {
        Self { proxy }
    }
}

impl MethodInvoker for NestedInterface {
    fn invoke(&self, _args: &[&dyn Display]) -> Result<Resolved, Error> {
        Ok(Resolved::Interface(self.proxy.clone()))
    }
}

pub(crate) struct MapOfInterfaces {
    map: ProxyMap,
}

impl MapOfInterfaces {
    pub(crate) fn new(map: ProxyMap) -> Self {
        Self { map }
    }
}

impl MethodInvoker for MapOfInterfaces {
    fn invoke(&self, _args: &[&dyn Display]) -> Result<Resolved, Error> {
        Ok(Resolved::Map(self.map.clone()))
    }
}

/// Derives its key from the call arguments and never caches.
pub(crate) struct ParameterizedLeaf {
    ctx: Arc<BindContext>,
    template: String,
    kind: ValueKind,
    default: Option<String>,
}

impl ParameterizedLeaf {
    pub(crate) fn new(ctx: Arc<BindContext>, template: String, kind: ValueKind, default: Option<String>) -> Self {
        Self {
            ctx,
            template,
            kind,
            default,
        }
    }
}

impl MethodInvoker for ParameterizedLeaf {
    fn invoke(&self, args: &[&dyn Display]) -> Result<Resolved, Error> {
        let key = template::substitute(&self.template, args)?;
        tracing::trace!(template = %self.template, %key, "substituted property key");
        let handle = self.ctx.handle(key, self.kind, self.default.clone());
        Ok(Resolved::Value(handle.get()?))
    }
}
