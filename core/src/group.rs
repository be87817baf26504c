//! Parameter group contract and the plain option group.
//!
//! A [`ParameterGroup`] is anything the owning [`Command`](crate::Command)
//! can finalize and post-validate as a unit. The command guarantees the
//! two-phase barrier: `finalize` runs on every group before `post_validate`
//! runs on any of them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::{Context, InvocationMap, OptionHandle, UsageError, UsageErrors, finalize_options};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a group; options point back to their group through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    pub(crate) fn next() -> Self {
        Self(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Heading shown for a group in help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupHelp {
    /// Group title.
    pub name: String,
    /// Group description.
    pub help: String,
}

/// Contract every group of options satisfies.
pub trait ParameterGroup {
    /// Identity stamped onto member options at registration.
    fn id(&self) -> GroupId;

    /// Group name, or `None` if its options are not set apart in help.
    fn name(&self) -> Option<&str>;

    /// Help text; ignored when [`name`](Self::name) is `None`.
    fn help(&self) -> Option<&str>;

    /// Member options in declaration order.
    fn options(&self) -> &[OptionHandle];

    /// Help heading, present only when both name and help are set.
    fn parameter_help(&self) -> Option<GroupHelp> {
        match (self.name(), self.help()) {
            (Some(name), Some(help)) => Some(GroupHelp {
                name: name.to_string(),
                help: help.to_string(),
            }),
            _ => None,
        }
    }

    /// Resolves member options once the whole command line is known.
    ///
    /// `invocations` covers every option of the command, not just this
    /// group's.
    fn finalize(&self, context: &Context, invocations: &InvocationMap) -> Result<(), UsageErrors>;

    /// Cross-option checks, run after every group in the command finalized.
    fn post_validate(&self, context: &Context) -> Result<(), UsageError>;

    /// Drops group-level state from an earlier parse.
    ///
    /// The command calls this on every group before collecting invocations.
    fn reset(&self) {}
}

/// A named collection of options shown together in help.
///
/// # Examples
///
/// ```
/// use optgroup_core::{OptionBuilder, OptionGroup, ParameterGroup};
///
/// let name = OptionBuilder::new(&["--name"]).build().unwrap();
/// let age = OptionBuilder::new(&["--age"]).build().unwrap();
/// let group = OptionGroup::named("User Options")
///     .with_help("Options controlling the user")
///     .with_option(name.clone())
///     .with_option(age);
///
/// assert_eq!(group.options().len(), 2);
/// assert_eq!(name.group_id(), Some(group.id()));
/// assert_eq!(name.group_name().as_deref(), Some("User Options"));
/// assert!(group.parameter_help().is_some());
/// ```
#[derive(Debug)]
pub struct OptionGroup {
    id: GroupId,
    name: Option<String>,
    help: Option<String>,
    options: Vec<OptionHandle>,
}

impl Default for OptionGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionGroup {
    /// Creates an unnamed group.
    pub fn new() -> Self {
        Self {
            id: GroupId::next(),
            name: None,
            help: None,
            options: Vec::new(),
        }
    }

    /// Creates a group with a display name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new()
        }
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Adds an option and returns the group.
    pub fn with_option(mut self, option: OptionHandle) -> Self {
        self.register(option);
        self
    }

    /// Appends an option and points it back at this group.
    ///
    /// Name uniqueness is enforced by the owning command, not here.
    pub fn register(&mut self, option: OptionHandle) {
        option.bind_group(self.id, self.name.as_deref());
        self.options.push(option);
    }
}

impl AsRef<OptionGroup> for OptionGroup {
    fn as_ref(&self) -> &OptionGroup {
        self
    }
}

impl ParameterGroup for OptionGroup {
    fn id(&self) -> GroupId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    fn options(&self) -> &[OptionHandle] {
        &self.options
    }

    fn finalize(&self, context: &Context, invocations: &InvocationMap) -> Result<(), UsageErrors> {
        finalize_options(context, &self.options, invocations)
    }

    fn post_validate(&self, context: &Context) -> Result<(), UsageError> {
        self.options
            .iter()
            .try_for_each(|option| option.post_validate(context))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::{Invocation, OptionBuilder};

    #[test]
    fn test_parameter_help_requires_name_and_help() {
        assert_eq!(OptionGroup::new().with_help("text").parameter_help(), None);
        assert_eq!(OptionGroup::named("Net").parameter_help(), None);
        assert_eq!(
            OptionGroup::named("Net").with_help("text").parameter_help(),
            Some(GroupHelp {
                name: "Net".to_string(),
                help: "text".to_string(),
            })
        );
    }

    #[test]
    fn test_finalize_resolves_every_option() {
        let a = OptionBuilder::new(&["--a"]).build().unwrap();
        let b = OptionBuilder::new(&["--b"]).default("x").build().unwrap();
        let group = OptionGroup::new().with_option(a.clone()).with_option(b.clone());
        let mut invocations = InvocationMap::new();
        invocations.push(a.id(), Invocation::with_value("--a", "v"));

        group.finalize(&Context::new(), &invocations).unwrap();
        assert_eq!(a.value().as_deref(), Some("v"));
        assert_eq!(b.value().as_deref(), Some("x"));
    }

    #[test]
    fn test_post_validate_visits_options_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut group = OptionGroup::new();
        for name in ["--first", "--second", "--third"] {
            let log = Rc::clone(&seen);
            let option = OptionBuilder::new(&[name])
                .default("1")
                .check(move |_, _| {
                    log.borrow_mut().push(name);
                    Ok(())
                })
                .build()
                .unwrap();
            group.register(option);
        }

        group.finalize(&Context::new(), &InvocationMap::new()).unwrap();
        group.post_validate(&Context::new()).unwrap();
        assert_eq!(*seen.borrow(), vec!["--first", "--second", "--third"]);
    }

    #[test]
    fn test_post_validate_stops_at_first_failure() {
        let failing = OptionBuilder::new(&["--a"])
            .default("1")
            .check(|_, _| Err("rejected".to_string()))
            .build()
            .unwrap();
        let never = OptionBuilder::new(&["--b"])
            .default("1")
            .check(|_, _| panic!("second option must not be checked"))
            .build()
            .unwrap();
        let group = OptionGroup::new().with_option(failing).with_option(never);

        group.finalize(&Context::new(), &InvocationMap::new()).unwrap();
        let err = group.post_validate(&Context::new()).unwrap_err();
        assert_eq!(err.option_name(), "--a");
    }
}
