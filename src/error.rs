use crate::config::ConfigError;
use crate::proxy::{BindingFault, TemplateError};
use thiserror::Error;

/// Top-level error type for the dragon-proxy library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Resolution fault raised by the store, decoder or interpolation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("error binding method '{method}' of interface '{interface}': {fault}")]
    Binding {
        interface: String,
        method: String,
        #[source]
        fault: BindingFault,
    },

    #[error("failed to load configuration sources for interface '{interface}': {source}")]
    SourceLoad {
        interface: String,
        source: ConfigError,
    },

    #[error("{method} not found on interface {interface}")]
    UnsupportedMethod { interface: String, method: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("method '{method}' of interface '{interface}' does not return {expected}")]
    UnexpectedReturn {
        interface: String,
        method: String,
        expected: &'static str,
    },

    #[error("application context requires a property store")]
    MissingStore,
}
