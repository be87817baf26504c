//! Owning command: option registry and the two-phase parse driver.
//!
//! A [`Command`] keeps a flat registry of every option (grouped or not) so it
//! can map argv tokens to options, plus the list of registered groups. A
//! parse runs in strict phases:
//!
//! 1. clear option resolutions and group state left by a previous parse;
//! 2. collect invocations from argv into one [`InvocationMap`];
//! 3. stop early if an eager option was invoked;
//! 4. finalize ungrouped options and then every group, aggregating errors;
//! 5. only if phase 4 succeeded, post-validate every group and every
//!    ungrouped option.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use crate::error::collect_errors;
use crate::{
    Context, DefinitionError, Invocation, InvocationMap, OptionHandle, OptionId, ParameterGroup,
    UsageError, UsageErrors, finalize_options,
};

/// What a successful parse leaves behind besides option values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Tokens that were not options, in order.
    pub positional: Vec<String>,
    /// Name of the eager option that short-circuited the parse, if any.
    pub eager: Option<String>,
}

/// A command owning options and groups.
///
/// # Examples
///
/// ```
/// use optgroup_core::*;
///
/// let verbose = OptionBuilder::flag(&["-v", "--verbose"]).build().unwrap();
/// let mut command = Command::new("tool");
/// command.register_option(verbose.clone()).unwrap();
///
/// let outcome = command.parse(&Context::new(), &["-v", "input.txt"]).unwrap();
/// assert_eq!(outcome.positional, vec!["input.txt"]);
/// assert_eq!(verbose.value().as_deref(), Some("true"));
/// ```
pub struct Command {
    name: String,
    options: Vec<OptionHandle>,
    ids: HashSet<OptionId>,
    grouped: HashSet<OptionId>,
    names: HashMap<String, usize>,
    groups: Vec<Rc<dyn ParameterGroup>>,
}

impl Command {
    /// Creates a command with no options.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Vec::new(),
            ids: HashSet::new(),
            grouped: HashSet::new(),
            names: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every registered option in registration order.
    pub fn options(&self) -> &[OptionHandle] {
        &self.options
    }

    /// Registered groups in registration order.
    pub fn groups(&self) -> &[Rc<dyn ParameterGroup>] {
        &self.groups
    }

    /// Finds a registered option by any of its names.
    pub fn option(&self, name: &str) -> Option<&OptionHandle> {
        self.names
            .get(name)
            .and_then(|&index| self.options.get(index))
    }

    /// Adds an ungrouped option to the flat registry.
    ///
    /// Fails if this exact option is already registered or one of its names
    /// is taken by another option. A group binding left over from a group
    /// that was never registered is cleared, so the command finalizes the
    /// option itself.
    pub fn register_option(&mut self, option: OptionHandle) -> Result<(), DefinitionError> {
        self.check_option(&option)?;
        option.unbind_group();
        self.insert_option(option);
        Ok(())
    }

    fn insert_option(&mut self, option: OptionHandle) {
        let index = self.options.len();
        for name in option.names() {
            self.names.insert(name.clone(), index);
        }
        self.ids.insert(option.id());
        self.options.push(option);
    }

    /// Registered options that belong to no registered group.
    fn ungrouped_options(&self) -> impl Iterator<Item = &OptionHandle> {
        self.options
            .iter()
            .filter(|option| !self.grouped.contains(&option.id()))
    }

    fn check_option(&self, option: &OptionHandle) -> Result<(), DefinitionError> {
        if self.ids.contains(&option.id()) {
            return Err(DefinitionError::OptionAlreadyRegistered(
                option.name().to_string(),
            ));
        }
        if let Some(taken) = option.names().iter().find(|n| self.names.contains_key(*n)) {
            return Err(DefinitionError::DuplicateOption(taken.clone()));
        }
        Ok(())
    }

    /// Adds a group to the group list without touching its options.
    pub fn register_option_group(&mut self, group: Rc<dyn ParameterGroup>) {
        self.groups.push(group);
    }

    /// Registers a group and each of its options, returning a handle to it.
    ///
    /// Member options are bound to this group's identity and display name, so
    /// for a co-occurring group they point at the wrapper rather than the
    /// inner group. Nothing is registered if any option is rejected.
    pub fn register_group<T>(&mut self, group: T) -> Result<Rc<T>, DefinitionError>
    where
        T: ParameterGroup + 'static,
    {
        self.register_shared_group(Rc::new(group))
    }

    /// Like [`register_group`](Self::register_group) for a group that is
    /// already shared.
    pub fn register_shared_group<T>(&mut self, group: Rc<T>) -> Result<Rc<T>, DefinitionError>
    where
        T: ParameterGroup + 'static,
    {
        let mut pending = HashSet::new();
        let mut pending_names = HashSet::new();
        for option in group.options() {
            self.check_option(option)?;
            if !pending.insert(option.id()) {
                return Err(DefinitionError::OptionAlreadyRegistered(
                    option.name().to_string(),
                ));
            }
            if let Some(taken) = option
                .names()
                .iter()
                .find(|n| !pending_names.insert(n.as_str()))
            {
                return Err(DefinitionError::DuplicateOption(taken.clone()));
            }
        }

        for option in group.options() {
            option.bind_group(group.id(), group.name());
            self.grouped.insert(option.id());
            self.insert_option(option.clone());
        }
        let shared: Rc<dyn ParameterGroup> = group.clone();
        self.register_option_group(shared);
        Ok(group)
    }

    /// Splits argv into option invocations and positional arguments.
    ///
    /// Accepts `--name value`, `--name=value`, `-n value`, and bare flags.
    /// Everything after `--` is positional.
    pub fn collect_invocations<S: AsRef<str>>(
        &self,
        argv: &[S],
    ) -> Result<(InvocationMap, Vec<String>), UsageErrors> {
        let mut invocations = InvocationMap::new();
        let mut positional = Vec::new();
        let mut errors = Vec::new();
        let mut only_positional = false;
        let mut tokens = argv.iter().map(|token| token.as_ref());

        while let Some(token) = tokens.next() {
            if only_positional || !token.starts_with('-') || token == "-" {
                positional.push(token.to_string());
                continue;
            }
            if token == "--" {
                only_positional = true;
                continue;
            }

            let (name, inline) = match token.split_once('=') {
                Some((name, value)) if token.starts_with("--") => (name, Some(value)),
                _ => (token, None),
            };
            let Some(option) = self.option(name) else {
                errors.push(UsageError::NoSuchOption {
                    name: name.to_string(),
                });
                continue;
            };

            let values = if option.takes_value() {
                match inline.or_else(|| tokens.next()) {
                    Some(value) => vec![value.to_string()],
                    None => {
                        errors.push(UsageError::MissingArgument {
                            name: name.to_string(),
                        });
                        continue;
                    }
                }
            } else if inline.is_some() {
                errors.push(UsageError::UnexpectedValue {
                    name: name.to_string(),
                });
                continue;
            } else {
                Vec::new()
            };

            invocations.push(
                option.id(),
                Invocation {
                    name: name.to_string(),
                    values,
                },
            );
        }

        collect_errors(errors)?;
        Ok((invocations, positional))
    }

    /// Parses `argv` and runs finalize and post-validation on every group.
    ///
    /// All finalize errors of one parse are returned together. Post-validation
    /// only runs when finalization succeeded everywhere, and stops at the
    /// first failing check.
    pub fn parse<S: AsRef<str>>(
        &self,
        context: &Context,
        argv: &[S],
    ) -> Result<ParseOutcome, UsageErrors> {
        for option in &self.options {
            option.clear_resolution();
        }
        for group in &self.groups {
            group.reset();
        }

        let (invocations, positional) = self.collect_invocations(argv)?;
        debug!(
            command = %self.name,
            invoked = invocations.len(),
            positional = positional.len(),
            "collected invocations"
        );

        if let Some(eager) = self
            .options
            .iter()
            .find(|option| option.is_eager() && invocations.contains(option.id()))
        {
            debug!(command = %self.name, option = eager.name(), "eager option invoked");
            return Ok(ParseOutcome {
                positional,
                eager: Some(eager.name().to_string()),
            });
        }

        let mut errors = Vec::new();
        if let Err(found) = finalize_options(context, self.ungrouped_options(), &invocations) {
            errors.extend(found);
        }
        for group in &self.groups {
            if let Err(found) = group.finalize(context, &invocations) {
                errors.extend(found);
            }
        }
        collect_errors(errors)?;

        for group in &self.groups {
            group.post_validate(context)?;
        }
        for option in self.ungrouped_options() {
            option.post_validate(context)?;
        }

        Ok(ParseOutcome {
            positional,
            eager: None,
        })
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("groups", &self.groups.len())
            .finish()
    }
}
