//! Option declarations and their per-parse resolved values.
//!
//! An option is declared once with [`OptionBuilder`] and then shared as an
//! [`OptionHandle`]: the group that contains it, the command that collects its
//! invocations, and the code that reads its value all hold the same handle.
//! Declaration data (names, required, eager, default, environment variable)
//! is immutable after [`build`](OptionBuilder::build); only the group
//! back-reference and the resolved value change, and only through the
//! finalization protocol.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::{
    Context, DefinitionError, GroupId, Invocation, MisuseError, Resolution, UsageError,
};

static NEXT_OPTION_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a declared option, stable for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(u64);

impl OptionId {
    fn next() -> Self {
        Self(NEXT_OPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a resolved option value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    /// One or more invocations on the command line.
    CommandLine,
    /// The option's environment variable.
    Environment,
    /// A [`ValueSource`](crate::ValueSource) such as a config file.
    ValueSource,
    /// The declared default.
    Default,
}

/// Value assigned to an option by the shared finalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    /// All values in the order they were supplied.
    pub values: Vec<String>,
    /// Where the values came from.
    pub origin: ValueOrigin,
}

impl ResolvedValue {
    /// Last supplied value; later invocations override earlier ones.
    pub fn last(&self) -> Option<&str> {
        self.values.last().map(String::as_str)
    }
}

/// Tags describing an option in help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTag {
    /// The option must be given.
    Required,
    /// Value used when the option is absent.
    Default(String),
    /// Environment variable consulted when the option is absent.
    Env(String),
}

type Check = Box<dyn Fn(&ResolvedValue, &Context) -> Result<(), String>>;

/// Builder for a single option.
///
/// # Examples
///
/// ```
/// use optgroup_core::OptionBuilder;
///
/// let output = OptionBuilder::new(&["-o", "--output"])
///     .help("Where to write results")
///     .envvar("APP_OUTPUT")
///     .required()
///     .build()
///     .unwrap();
/// assert_eq!(output.name(), "--output");
/// assert!(output.is_required());
/// assert!(output.takes_value());
///
/// let verbose = OptionBuilder::flag(&["-v"]).build().unwrap();
/// assert!(!verbose.takes_value());
/// ```
pub struct OptionBuilder {
    names: Vec<String>,
    help: Option<String>,
    required: bool,
    eager: bool,
    takes_value: bool,
    default: Option<String>,
    envvar: Option<String>,
    checks: Vec<Check>,
}

impl OptionBuilder {
    /// Starts an option that takes one value per invocation.
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            help: None,
            required: false,
            eager: false,
            takes_value: true,
            default: None,
            envvar: None,
            checks: Vec::new(),
        }
    }

    /// Starts a flag (no value).
    pub fn flag(names: &[&str]) -> Self {
        Self {
            takes_value: false,
            ..Self::new(names)
        }
    }

    /// Adds help text.
    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the option as eager: its presence short-circuits the parse.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Sets the value used when nothing else supplies one.
    pub fn default(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    /// Sets the environment variable read when the option is not invoked.
    pub fn envvar(mut self, name: &str) -> Self {
        self.envvar = Some(name.to_string());
        self
    }

    /// Adds a check run during post-validation against the resolved value.
    pub fn check<F>(mut self, check: F) -> Self
    where
        F: Fn(&ResolvedValue, &Context) -> Result<(), String> + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Validates the names and produces a shareable handle.
    ///
    /// Short names are a single dash and one character (`-v`); long names
    /// start with `--` followed by a non-dash character.
    pub fn build(self) -> Result<OptionHandle, DefinitionError> {
        if self.names.is_empty() {
            return Err(DefinitionError::MissingOptionName);
        }
        for name in &self.names {
            let valid_long =
                name.starts_with("--") && name.chars().nth(2).is_some_and(|c| c != '-');
            let valid_short =
                name.starts_with('-') && !name.starts_with("--") && name.chars().count() == 2;
            if !(valid_long || valid_short) || name.contains('=') {
                return Err(DefinitionError::InvalidOptionName(name.clone()));
            }
        }

        Ok(OptionHandle(Rc::new(OptionInner {
            id: OptionId::next(),
            names: self.names,
            help: self.help,
            required: self.required,
            eager: self.eager,
            takes_value: self.takes_value,
            default: self.default,
            envvar: self.envvar,
            checks: self.checks,
            group: Cell::new(None),
            group_name: RefCell::new(None),
            resolution: RefCell::new(Resolution::Unresolved),
        })))
    }
}

struct OptionInner {
    id: OptionId,
    names: Vec<String>,
    help: Option<String>,
    required: bool,
    eager: bool,
    takes_value: bool,
    default: Option<String>,
    envvar: Option<String>,
    checks: Vec<Check>,
    group: Cell<Option<GroupId>>,
    group_name: RefCell<Option<String>>,
    resolution: RefCell<Resolution<Option<ResolvedValue>>>,
}

/// Shared handle to a declared option.
///
/// Cloning the handle does not copy the option; all clones observe the same
/// resolved value. Equality is identity.
#[derive(Clone)]
pub struct OptionHandle(Rc<OptionInner>);

impl OptionHandle {
    /// Identity used as the key of an [`InvocationMap`](crate::InvocationMap).
    pub fn id(&self) -> OptionId {
        self.0.id
    }

    /// All declared names.
    pub fn names(&self) -> &[String] {
        &self.0.names
    }

    /// Display name: the longest declared name.
    pub fn name(&self) -> &str {
        self.0
            .names
            .iter()
            .max_by_key(|name| name.len())
            .map_or("", String::as_str)
    }

    /// Key used to look the option up in a value source (`--out-dir` → `out-dir`).
    pub fn value_key(&self) -> &str {
        self.name().trim_start_matches('-')
    }

    /// Returns `true` if `name` is one of the declared names.
    pub fn matches(&self, name: &str) -> bool {
        self.0.names.iter().any(|n| n == name)
    }

    /// Help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.0.help.as_deref()
    }

    /// Whether the option must be supplied.
    pub fn is_required(&self) -> bool {
        self.0.required
    }

    /// Whether the option is eager.
    pub fn is_eager(&self) -> bool {
        self.0.eager
    }

    /// Whether each invocation consumes one argument.
    pub fn takes_value(&self) -> bool {
        self.0.takes_value
    }

    /// Declared default value.
    pub fn default_value(&self) -> Option<&str> {
        self.0.default.as_deref()
    }

    /// Declared environment variable.
    pub fn envvar(&self) -> Option<&str> {
        self.0.envvar.as_deref()
    }

    /// Tags shown next to the option in help output.
    ///
    /// # Examples
    ///
    /// ```
    /// use optgroup_core::{HelpTag, OptionBuilder};
    ///
    /// let opt = OptionBuilder::new(&["--a"]).required().envvar("A").build().unwrap();
    /// assert_eq!(opt.help_tags(), vec![HelpTag::Required, HelpTag::Env("A".into())]);
    /// ```
    pub fn help_tags(&self) -> Vec<HelpTag> {
        let mut tags = Vec::new();
        if self.0.required {
            tags.push(HelpTag::Required);
        }
        if let Some(default) = &self.0.default {
            tags.push(HelpTag::Default(default.clone()));
        }
        if let Some(envvar) = &self.0.envvar {
            tags.push(HelpTag::Env(envvar.clone()));
        }
        tags
    }

    /// Group this option is bound to, if any.
    pub fn group_id(&self) -> Option<GroupId> {
        self.0.group.get()
    }

    /// Display name of the group this option is bound to.
    pub fn group_name(&self) -> Option<String> {
        self.0.group_name.borrow().clone()
    }

    pub(crate) fn bind_group(&self, group: GroupId, name: Option<&str>) {
        self.0.group.set(Some(group));
        *self.0.group_name.borrow_mut() = name.map(String::from);
    }

    pub(crate) fn unbind_group(&self) {
        self.0.group.set(None);
        *self.0.group_name.borrow_mut() = None;
    }

    /// Value from the environment, ignoring empty variables.
    pub(crate) fn env_value(&self, context: &Context) -> Option<String> {
        self.envvar()
            .and_then(|var| context.env(var))
            .filter(|value| !value.is_empty())
            .map(String::from)
    }

    /// Value from the first value source that knows this option.
    pub(crate) fn source_values(&self, context: &Context) -> Option<Vec<String>> {
        context.sources().find_map(|source| source.values(self))
    }

    /// Reports whether a value exists outside the given invocations.
    ///
    /// Only meaningful when the option was not invoked: invocations always
    /// take precedence, so an invoked option never reports a sourced value.
    pub fn has_sourced_value(&self, context: &Context, invocations: &[Invocation]) -> bool {
        invocations.is_empty()
            && (self.env_value(context).is_some() || self.source_values(context).is_some())
    }

    pub(crate) fn set_resolution(&self, value: Option<ResolvedValue>) {
        *self.0.resolution.borrow_mut() = Resolution::Resolved(value);
    }

    pub(crate) fn clear_resolution(&self) {
        *self.0.resolution.borrow_mut() = Resolution::Unresolved;
    }

    /// Whether the option has been finalized in the current parse.
    pub fn is_resolved(&self) -> bool {
        self.0.resolution.borrow().is_resolved()
    }

    /// Full resolution, or a misuse error before finalization.
    pub fn resolved(&self) -> Result<Option<ResolvedValue>, MisuseError> {
        self.0.resolution.borrow().get().cloned()
    }

    /// Last resolved value; `None` if absent or not finalized.
    pub fn value(&self) -> Option<String> {
        self.resolved()
            .ok()
            .flatten()
            .and_then(|resolved| resolved.last().map(String::from))
    }

    /// All resolved values; empty if absent or not finalized.
    pub fn values(&self) -> Vec<String> {
        self.resolved()
            .ok()
            .flatten()
            .map(|resolved| resolved.values)
            .unwrap_or_default()
    }

    /// Origin of the resolved value.
    pub fn origin(&self) -> Option<ValueOrigin> {
        self.resolved().ok().flatten().map(|resolved| resolved.origin)
    }

    /// Runs the declared checks against the resolved value.
    ///
    /// Options without a value, or not finalized in this parse, pass.
    pub fn post_validate(&self, context: &Context) -> Result<(), UsageError> {
        let Ok(Some(resolved)) = self.resolved() else {
            return Ok(());
        };
        for check in &self.0.checks {
            check(&resolved, context).map_err(|message| UsageError::BadParameter {
                name: self.name().to_string(),
                message,
            })?;
        }
        Ok(())
    }
}

impl PartialEq for OptionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for OptionHandle {}

impl fmt::Debug for OptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionHandle")
            .field("id", &self.0.id)
            .field("names", &self.0.names)
            .field("required", &self.0.required)
            .field("eager", &self.0.eager)
            .field("group", &self.0.group.get())
            .field("resolution", &self.0.resolution.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_empty_names() {
        let err = OptionBuilder::new(&[]).build().unwrap_err();
        assert_eq!(err, DefinitionError::MissingOptionName);
    }

    #[test]
    fn test_build_rejects_bad_names() {
        for bad in ["a", "-ab", "--", "---", "--a=b"] {
            let result = OptionBuilder::new(&[bad]).build();
            assert!(
                matches!(result, Err(DefinitionError::InvalidOptionName(_))),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn test_name_prefers_long_form() {
        let opt = OptionBuilder::new(&["-o", "--output"]).build().unwrap();
        assert_eq!(opt.name(), "--output");
        assert_eq!(opt.value_key(), "output");
        assert!(opt.matches("-o"));
        assert!(!opt.matches("--out"));
    }

    #[test]
    fn test_handles_share_resolution() {
        let opt = OptionBuilder::new(&["--a"]).build().unwrap();
        let alias = opt.clone();
        assert_eq!(opt, alias);
        assert!(!alias.is_resolved());

        opt.set_resolution(Some(ResolvedValue {
            values: vec!["1".to_string(), "2".to_string()],
            origin: ValueOrigin::CommandLine,
        }));
        assert_eq!(alias.value().as_deref(), Some("2"));
        assert_eq!(alias.values(), vec!["1", "2"]);
        assert_eq!(alias.origin(), Some(ValueOrigin::CommandLine));

        opt.clear_resolution();
        assert_eq!(alias.resolved(), Err(MisuseError::ReadBeforeFinalize));
    }

    #[test]
    fn test_distinct_options_are_not_equal() {
        let a = OptionBuilder::new(&["--a"]).build().unwrap();
        let b = OptionBuilder::new(&["--a"]).build().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_has_sourced_value_from_env() {
        let opt = OptionBuilder::new(&["--token"])
            .envvar("TEST_TOKEN")
            .build()
            .unwrap();
        let empty = Context::new().with_env("TEST_TOKEN", "");
        let set = Context::new().with_env("TEST_TOKEN", "secret");

        assert!(!opt.has_sourced_value(&Context::new(), &[]));
        assert!(!opt.has_sourced_value(&empty, &[]));
        assert!(opt.has_sourced_value(&set, &[]));
        assert!(!opt.has_sourced_value(&set, &[Invocation::with_value("--token", "x")]));
    }

    #[test]
    fn test_post_validate_runs_checks() {
        let opt = OptionBuilder::new(&["--port"])
            .check(|value, _| match value.last() {
                Some(v) if v.parse::<u16>().is_ok() => Ok(()),
                _ => Err("must be a port number".to_string()),
            })
            .build()
            .unwrap();
        let context = Context::new();

        assert_eq!(opt.post_validate(&context), Ok(()));

        opt.set_resolution(Some(ResolvedValue {
            values: vec!["http".to_string()],
            origin: ValueOrigin::CommandLine,
        }));
        assert_eq!(
            opt.post_validate(&context),
            Err(UsageError::BadParameter {
                name: "--port".to_string(),
                message: "must be a port number".to_string(),
            })
        );
    }
}
