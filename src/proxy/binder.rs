//! One-time analysis of an interface and construction of its resolvers.
//!
//! Binding runs in two passes. The first walks every interface reachable from
//! the root, classifying each method and rejecting cycles of eagerly nested
//! interfaces, without touching the store. The second derives keys and builds
//! resolvers, recursing into nested interfaces. A fault in either pass aborts
//! the whole bind.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::decl::{Interface, InterfaceType, Method, ReturnType};
use super::dispatch::{Proxy, ProxyMap};
use super::key::{derive_key, normalize_prefix};
use super::resolver::{
    DynamicLeaf, ImmutableLeaf, MapOfInterfaces, MethodInvoker, NestedInterface, ParameterizedLeaf, Strategy,
};
use super::{template, BindingFault};
use crate::config::{Decoder, PropertyHandle, PropertyStore, SourceLoader, ValueKind};
use crate::Error;

/// The collaborators every bind and every resolver reads through.
#[derive(Debug)]
pub(crate) struct BindContext {
    store: Arc<dyn PropertyStore>,
    decoder: Arc<dyn Decoder>,
    loader: Arc<dyn SourceLoader>,
}

impl BindContext {
    pub(crate) fn new(store: Arc<dyn PropertyStore>, decoder: Arc<dyn Decoder>, loader: Arc<dyn SourceLoader>) -> Self {
        Self { store, decoder, loader }
    }

    pub(crate) fn handle(&self, key: String, kind: ValueKind, default: Option<String>) -> PropertyHandle {
        PropertyHandle::resolve(self.store.clone(), self.decoder.clone(), key, kind, default)
    }
}

/// The association between one accessor and how it resolves.
pub struct AccessorBinding {
    method: String,
    key: String,
    strategy: Strategy,
    default_value: Option<String>,
    pub(crate) resolver: Box<dyn MethodInvoker>,
}

impl AccessorBinding {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The full property key, or prefix plus template for parameterized
    /// accessors.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }
}

impl fmt::Debug for AccessorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorBinding")
            .field("method", &self.method)
            .field("key", &self.key)
            .field("strategy", &self.strategy)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}

/// Binds `ty` under `prefix`, falling back to the interface's declared prefix
/// and immutable flag when not overridden.
pub(crate) fn bind(
    ctx: &Arc<BindContext>,
    ty: InterfaceType,
    prefix: Option<&str>,
    immutable: Option<bool>,
) -> Result<Proxy, Error> {
    let decl = ty.declare();
    Analysis::default().check(ty, &decl)?;

    let prefix = normalize_prefix(prefix.or(decl.prefix.as_deref()).unwrap_or(""));
    let immutable = immutable.unwrap_or(decl.immutable);
    build(ctx, ty, decl, prefix, immutable)
}

/// Constructs a proxy for an interface that has already been analysed.
pub(crate) fn build(
    ctx: &Arc<BindContext>,
    ty: InterfaceType,
    decl: Interface,
    prefix: String,
    immutable: bool,
) -> Result<Proxy, Error> {
    if let Some(directive) = &decl.source {
        ctx.loader.load(directive).map_err(|source| Error::SourceLoad {
            interface: decl.name.clone(),
            source,
        })?;
    }

    let mut bindings = Vec::with_capacity(decl.methods.len());
    for method in &decl.methods {
        let binding = build_method(ctx, method, &prefix, immutable).map_err(|fault| Error::Binding {
            interface: decl.name.clone(),
            method: method.name.clone(),
            fault,
        })?;
        bindings.push(binding);
    }

    tracing::debug!(
        interface = %decl.name,
        prefix = %prefix,
        immutable,
        methods = bindings.len(),
        "bound configuration interface"
    );
    Ok(Proxy::new(ty, decl.name, prefix, bindings))
}

fn build_method(
    ctx: &Arc<BindContext>,
    method: &Method,
    prefix: &str,
    immutable: bool,
) -> Result<AccessorBinding, BindingFault> {
    let strategy = classify(method, immutable)?;
    let default_value = method.default_value.clone();

    let (key, resolver): (String, Box<dyn MethodInvoker>) = match (&method.returns, strategy) {
        (ReturnType::Map(value_type), _) => {
            let key = derive_key(prefix, &method.name, method.property_name.as_deref())?;
            let map = ProxyMap::new(ctx.clone(), *value_type, key.clone(), immutable);
            let resolver: Box<dyn MethodInvoker> = Box::new(MapOfInterfaces::new(map));
            (key, resolver)
        }
        (ReturnType::Interface(child), _) => {
            let key = derive_key(prefix, &method.name, method.property_name.as_deref())?;
            let proxy = build(ctx, *child, child.declare(), normalize_prefix(&key), immutable)
                .map_err(|e| BindingFault::Nested(Box::new(e)))?;
            let resolver: Box<dyn MethodInvoker> = Box::new(NestedInterface::new(proxy));
            (key, resolver)
        }
        (ReturnType::Value(kind), Strategy::Parameterized) => {
            let template = method.property_name.clone().ok_or(BindingFault::MissingNameTemplate)?;
            let key = format!("{prefix}{template}");
            let resolver: Box<dyn MethodInvoker> =
                Box::new(ParameterizedLeaf::new(ctx.clone(), template, *kind, default_value.clone()));
            (key, resolver)
        }
        (ReturnType::Value(kind), strategy) => {
            let key = derive_key(prefix, &method.name, method.property_name.as_deref())?;
            let handle = ctx.handle(key.clone(), *kind, default_value.clone());
            let resolver: Box<dyn MethodInvoker> = if strategy == Strategy::Immutable {
                Box::new(ImmutableLeaf::new(handle))
            } else {
                Box::new(DynamicLeaf::new(handle))
            };
            (key, resolver)
        }
    };

    Ok(AccessorBinding {
        method: method.name.clone(),
        key,
        strategy,
        default_value,
        resolver,
    })
}

/// Picks a method's strategy, checking everything that does not depend on
/// the prefix or the store.
fn classify(method: &Method, immutable: bool) -> Result<Strategy, BindingFault> {
    match (&method.returns, method.params) {
        (ReturnType::Map(_) | ReturnType::Interface(_), params) if params > 0 => {
            Err(BindingFault::ParameterizedInterface)
        }
        (ReturnType::Map(_), _) => {
            derive_key("", &method.name, method.property_name.as_deref())?;
            Ok(Strategy::Map)
        }
        (ReturnType::Interface(_), _) => {
            derive_key("", &method.name, method.property_name.as_deref())?;
            Ok(Strategy::Nested)
        }
        (ReturnType::Value(_), 0) => {
            derive_key("", &method.name, method.property_name.as_deref())?;
            Ok(if immutable { Strategy::Immutable } else { Strategy::Dynamic })
        }
        (ReturnType::Value(_), params) => {
            let template = method.property_name.as_deref().ok_or(BindingFault::MissingNameTemplate)?;
            template::validate(template, params)?;
            Ok(Strategy::Parameterized)
        }
    }
}

/// Walks the interface graph once before anything is constructed.
///
/// Nested interfaces are built eagerly, so a type reappearing on the current
/// nesting path would recurse forever and is rejected. Map values are built
/// on demand, so a map edge starts a fresh path.
///
/// A type is only skipped on an eager edge once its own check has finished.
/// A type still being checked further up (behind a map edge) is walked again
/// so cycles back into the outer path are still found.
#[derive(Default)]
struct Analysis {
    path: Vec<(InterfaceType, String)>,
    active: HashMap<TypeId, usize>,
    done: HashSet<TypeId>,
}

impl Analysis {
    fn check(&mut self, ty: InterfaceType, decl: &Interface) -> Result<(), Error> {
        *self.active.entry(ty.id()).or_default() += 1;
        self.path.push((ty, decl.name.clone()));
        let result = self.check_methods(decl);
        self.path.pop();
        if let Some(count) = self.active.get_mut(&ty.id()) {
            *count -= 1;
            if *count == 0 {
                self.active.remove(&ty.id());
            }
        }
        if result.is_ok() {
            self.done.insert(ty.id());
        }
        result
    }

    fn check_methods(&mut self, decl: &Interface) -> Result<(), Error> {
        let mut names = HashSet::new();
        for method in &decl.methods {
            self.check_method(method, &mut names).map_err(|fault| Error::Binding {
                interface: decl.name.clone(),
                method: method.name.clone(),
                fault,
            })?;
        }
        Ok(())
    }

    fn check_method<'m>(&mut self, method: &'m Method, names: &mut HashSet<&'m str>) -> Result<(), BindingFault> {
        if !names.insert(method.name.as_str()) {
            return Err(BindingFault::DuplicateMethod);
        }
        classify(method, false)?;

        match &method.returns {
            ReturnType::Interface(child) => {
                if self.path.iter().any(|(ty, _)| ty == child) {
                    return Err(BindingFault::CyclicInterface(self.render_cycle(*child)));
                }
                if !self.done.contains(&child.id()) {
                    self.check(*child, &child.declare())
                        .map_err(|e| BindingFault::Nested(Box::new(e)))?;
                }
            }
            ReturnType::Map(child) => {
                let id = child.id();
                if !self.done.contains(&id) && !self.active.contains_key(&id) {
                    let outer = std::mem::take(&mut self.path);
                    let result = self.check(*child, &child.declare());
                    self.path = outer;
                    result.map_err(|e| BindingFault::Nested(Box::new(e)))?;
                }
            }
            ReturnType::Value(_) => {}
        }
        Ok(())
    }

    fn render_cycle(&self, back_to: InterfaceType) -> String {
        let closing = back_to.declare().name;
        let start = self.path.iter().position(|(ty, _)| *ty == back_to).unwrap_or(0);
        let mut names: Vec<&str> = self.path[start..].iter().map(|(_, name)| name.as_str()).collect();
        names.push(closing.as_str());
        names.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultDecoder, MemoryStore, NoopLoader};
    use crate::proxy::{ConfigInterface, Proxy};
    use tracing_test::traced_test;

    fn context() -> Arc<BindContext> {
        Arc::new(BindContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(DefaultDecoder),
            Arc::new(NoopLoader),
        ))
    }

    fn bind_type<T: ConfigInterface>() -> Result<Proxy, Error> {
        bind(&context(), InterfaceType::of::<T>(), None, None)
    }

    macro_rules! interface {
        ($ty:ident, $decl:expr) => {
            struct $ty;

            impl ConfigInterface for $ty {
                fn interface() -> Interface {
                    $decl
                }

                fn from_proxy(_proxy: Proxy) -> Self {
                    $ty
                }
            }
        };
    }

    interface!(
        Leaves,
        Interface::new("Leaves")
            .prefix("app")
            .method(Method::new("getName"))
            .method(Method::new("isEnabled").value(ValueKind::Boolean))
            .method(Method::new("getKey").property_name("custom.key"))
            .method(Method::new("getShard").params(2).property_name("shards.${1}.${0}"))
    );
    interface!(
        Frozen,
        Interface::new("Frozen").immutable(true).method(Method::new("getName"))
    );
    interface!(CycleA, Interface::new("CycleA").method(Method::new("getB").interface::<CycleB>()));
    interface!(CycleB, Interface::new("CycleB").method(Method::new("getA").interface::<CycleA>()));
    interface!(
        Root,
        Interface::new("Root")
            .method(Method::new("getItems").map_of::<Branch>())
            .method(Method::new("getBranch").interface::<Branch>())
    );
    interface!(Branch, Interface::new("Branch").method(Method::new("getRoot").interface::<Root>()));

    interface!(
        Tree,
        Interface::new("Tree")
            .method(Method::new("getLabel"))
            .method(Method::new("getChildren").map_of::<Tree>())
    );
    interface!(
        Untemplated,
        Interface::new("Untemplated").method(Method::new("getShard").params(1))
    );
    interface!(
        OutOfRange,
        Interface::new("OutOfRange").method(Method::new("getShard").params(1).property_name("s.${1}"))
    );
    interface!(
        Duplicated,
        Interface::new("Duplicated")
            .method(Method::new("getName"))
            .method(Method::new("getName"))
    );
    interface!(
        ParameterizedNested,
        Interface::new("ParameterizedNested").method(
            Method::new("getLeaves")
                .interface::<Leaves>()
                .params(1)
                .property_name("x.${0}")
        )
    );
    interface!(Outer, Interface::new("Outer").method(Method::new("getInner").interface::<Untemplated>()));

    fn fault(err: Error) -> (String, String, BindingFault) {
        match err {
            Error::Binding { interface, method, fault } => (interface, method, fault),
            other => panic!("expected binding fault, got {other:?}"),
        }
    }

    #[test]
    fn test_keys_and_strategies() {
        let proxy = bind_type::<Leaves>().unwrap();
        let bound: Vec<(&str, &str, Strategy)> = proxy
            .bindings()
            .iter()
            .map(|b| (b.method(), b.key(), b.strategy()))
            .collect();

        assert_eq!(
            bound,
            [
                ("getName", "app.name", Strategy::Dynamic),
                ("isEnabled", "app.enabled", Strategy::Dynamic),
                ("getKey", "app.custom.key", Strategy::Dynamic),
                ("getShard", "app.shards.${1}.${0}", Strategy::Parameterized),
            ]
        );
    }

    #[test]
    fn test_immutable_flag_selects_strategy() {
        let proxy = bind_type::<Frozen>().unwrap();
        assert_eq!(proxy.bindings()[0].strategy(), Strategy::Immutable);

        let proxy = bind(&context(), InterfaceType::of::<Frozen>(), None, Some(false)).unwrap();
        assert_eq!(proxy.bindings()[0].strategy(), Strategy::Dynamic);
    }

    #[test]
    fn test_prefix_override() {
        let proxy = bind(&context(), InterfaceType::of::<Leaves>(), Some("other"), None).unwrap();
        assert_eq!(proxy.prefix(), "other.");
        assert_eq!(proxy.bindings()[0].key(), "other.name");
    }

    #[test]
    fn test_eager_cycle_is_rejected() {
        let (interface, method, fault) = fault(bind_type::<CycleA>().unwrap_err());
        assert_eq!(interface, "CycleA");
        assert_eq!(method, "getB");
        let BindingFault::Nested(inner) = fault else {
            panic!("expected nested fault");
        };
        let (_, _, inner) = self::fault(*inner);
        assert!(matches!(inner, BindingFault::CyclicInterface(ref path) if path == "CycleA -> CycleB -> CycleA"));
    }

    #[test]
    fn test_eager_cycle_behind_map_is_rejected() {
        let mut fault = self::fault(bind_type::<Root>().unwrap_err()).2;
        while let BindingFault::Nested(inner) = fault {
            fault = self::fault(*inner).2;
        }
        assert!(matches!(fault, BindingFault::CyclicInterface(ref path) if path == "Branch -> Root -> Branch"));
    }

    #[test]
    fn test_self_referencing_map_binds() {
        let proxy = bind_type::<Tree>().unwrap();
        assert_eq!(proxy.bindings()[1].strategy(), Strategy::Map);
    }

    #[test]
    fn test_parameterized_without_template() {
        let (interface, method, fault) = fault(bind_type::<Untemplated>().unwrap_err());
        assert_eq!((interface.as_str(), method.as_str()), ("Untemplated", "getShard"));
        assert!(matches!(fault, BindingFault::MissingNameTemplate));
    }

    #[test]
    fn test_template_index_out_of_range() {
        let (_, _, fault) = fault(bind_type::<OutOfRange>().unwrap_err());
        assert!(matches!(
            fault,
            BindingFault::TemplateArgumentOutOfRange { index: 1, params: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_method() {
        let (_, _, fault) = fault(bind_type::<Duplicated>().unwrap_err());
        assert!(matches!(fault, BindingFault::DuplicateMethod));
    }

    #[test]
    fn test_parameterized_interface() {
        let (_, _, fault) = fault(bind_type::<ParameterizedNested>().unwrap_err());
        assert!(matches!(fault, BindingFault::ParameterizedInterface));
    }

    #[test]
    fn test_nested_fault_names_outer_and_inner() {
        let err = bind_type::<Outer>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'getInner' of interface 'Outer'"), "{message}");
        assert!(message.contains("'getShard' of interface 'Untemplated'"), "{message}");
    }

    #[traced_test]
    #[test]
    fn test_bind_is_logged() {
        bind_type::<Leaves>().unwrap();
        assert!(logs_contain("bound configuration interface"));
    }
}
