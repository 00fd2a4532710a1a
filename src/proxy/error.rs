use thiserror::Error;

/// Why a method could not be bound.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindingFault {
    #[error("derived property name is empty")]
    EmptyPropertyName,

    #[error("method is declared more than once")]
    DuplicateMethod,

    #[error("method takes parameters but has no property name template")]
    MissingNameTemplate,

    #[error("template '{template}' references argument {index} but the method takes {params}")]
    TemplateArgumentOutOfRange {
        template: String,
        index: usize,
        params: usize,
    },

    #[error("malformed property name template '{0}'")]
    MalformedTemplate(String),

    #[error("methods returning interfaces or maps cannot take parameters")]
    ParameterizedInterface,

    #[error("cyclic interface reference: {0}")]
    CyclicInterface(String),

    #[error(transparent)]
    Nested(Box<crate::Error>),
}

/// Failure to turn a key template into a property key at call time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("missing argument index {index} for template '{template}' ({provided} provided)")]
    MissingArgument {
        template: String,
        index: usize,
        provided: usize,
    },

    #[error("unclosed placeholder in template '{0}'")]
    Unclosed(String),
}
