//! Positional `${N}` placeholders in property name templates.

use std::fmt::Display;

use super::{BindingFault, TemplateError};
use crate::config::expand_placeholders;

/// Replaces each `${N}` in `template` with the string form of `args[N]`.
///
/// Placeholders whose name is not an index are left as written.
pub fn substitute(template: &str, args: &[&dyn Display]) -> Result<String, TemplateError> {
    expand_placeholders(
        template,
        |name| match name.parse::<usize>() {
            Ok(index) => args.get(index).map(|arg| Some(arg.to_string())).ok_or_else(|| {
                TemplateError::MissingArgument {
                    template: template.to_string(),
                    index,
                    provided: args.len(),
                }
            }),
            Err(_) => Ok(None),
        },
        || TemplateError::Unclosed(template.to_string()),
    )
}

/// Checks at bind time that every index in `template` exists for a method
/// taking `params` arguments.
pub fn validate(template: &str, params: usize) -> Result<(), BindingFault> {
    expand_placeholders(
        template,
        |name| match name.parse::<usize>() {
            Ok(index) if index >= params => Err(BindingFault::TemplateArgumentOutOfRange {
                template: template.to_string(),
                index,
                params,
            }),
            _ => Ok(None),
        },
        || BindingFault::MalformedTemplate(template.to_string()),
    )
    .map(drop)
}
