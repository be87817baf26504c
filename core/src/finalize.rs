//! Shared per-option finalizer.
//!
//! Every option, grouped or not, gets its value through
//! [`finalize_options`]. The precedence is fixed:
//!
//! 1. invocations on the command line (flags resolve to `"true"`);
//! 2. the option's environment variable, if set and non-empty;
//! 3. the first [`ValueSource`](crate::ValueSource) that knows the option;
//! 4. the declared default.
//!
//! A required option left without a value produces a
//! [`UsageError::MissingOption`]. Errors are collected across all options so
//! the user sees every missing option at once.

use tracing::trace;

use crate::error::collect_errors;
use crate::{
    Context, InvocationMap, OptionHandle, ResolvedValue, UsageError, UsageErrors, ValueOrigin,
};

/// Resolves and stores the value of each option.
///
/// Every option receives a resolution, including those that end up without a
/// value, so reading them afterwards never reports a misuse error.
///
/// # Examples
///
/// ```
/// use optgroup_core::*;
///
/// let a = OptionBuilder::new(&["--a"]).required().build().unwrap();
/// let b = OptionBuilder::new(&["--b"]).default("x").build().unwrap();
/// let mut invocations = InvocationMap::new();
/// invocations.push(b.id(), Invocation::with_value("--b", "y"));
///
/// let errors = finalize_options(&Context::new(), [&a, &b], &invocations).unwrap_err();
/// assert_eq!(errors.to_string(), "missing option --a");
/// assert_eq!(b.value().as_deref(), Some("y"));
/// assert_eq!(a.value(), None);
/// ```
pub fn finalize_options<'a, I>(
    context: &Context,
    options: I,
    invocations: &InvocationMap,
) -> Result<(), UsageErrors>
where
    I: IntoIterator<Item = &'a OptionHandle>,
{
    let mut errors = Vec::new();

    for option in options {
        let resolved = resolve(context, option, invocations);
        match &resolved {
            Some(value) => trace!(option = option.name(), origin = ?value.origin, "resolved option"),
            None if option.is_required() => errors.push(UsageError::MissingOption {
                name: option.name().to_string(),
            }),
            None => trace!(option = option.name(), "option has no value"),
        }
        option.set_resolution(resolved);
    }

    collect_errors(errors)
}

fn resolve(
    context: &Context,
    option: &OptionHandle,
    invocations: &InvocationMap,
) -> Option<ResolvedValue> {
    let invoked = invocations.get(option.id());
    if !invoked.is_empty() {
        let values = invoked
            .iter()
            .flat_map(|invocation| {
                if invocation.values.is_empty() {
                    vec!["true".to_string()]
                } else {
                    invocation.values.clone()
                }
            })
            .collect();
        return Some(ResolvedValue {
            values,
            origin: ValueOrigin::CommandLine,
        });
    }

    if let Some(value) = option.env_value(context) {
        return Some(ResolvedValue {
            values: vec![value],
            origin: ValueOrigin::Environment,
        });
    }

    if let Some(values) = option.source_values(context) {
        return Some(ResolvedValue {
            values,
            origin: ValueOrigin::ValueSource,
        });
    }

    option.default_value().map(|default| ResolvedValue {
        values: vec![default.to_string()],
        origin: ValueOrigin::Default,
    })
}
