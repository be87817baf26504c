//! All-or-nothing option groups.
//!
//! A [`CoOccurringOptionGroup`] wraps an [`OptionGroup`] so that its options
//! are either validated together or not at all. If none of the options was
//! given (on the command line, through the environment, or by a value
//! source), the group did not occur and none of its `required` constraints
//! are enforced. If any of them was given, every required option must be
//! given as well.
//!
//! # Example
//!
//! ```
//! use optgroup_core::*;
//!
//! let user = OptionBuilder::new(&["--user"]).required().build().unwrap();
//! let port = OptionBuilder::new(&["--port"]).default("22").build().unwrap();
//! let login = OptionGroup::named("Login")
//!     .with_option(user.clone())
//!     .with_option(port.clone());
//!
//! let mut command = Command::new("ssh-ish");
//! let login = command.register_group(cooccurring(login).unwrap()).unwrap();
//!
//! // Nothing given: no error, the group value is None.
//! let none: [&str; 0] = [];
//! command.parse(&Context::new(), &none).unwrap();
//! assert!(!login.occurred());
//! assert!(login.value().unwrap().is_none());
//!
//! // Only the optional option given: the required one is now enforced.
//! let errors = command.parse(&Context::new(), &["--port", "2222"]).unwrap_err();
//! assert_eq!(errors.to_string(), "missing option --user");
//!
//! command.parse(&Context::new(), &["--user", "root"]).unwrap();
//! assert!(login.value().unwrap().is_some());
//! assert_eq!(port.value().as_deref(), Some("22"));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::{
    Context, DefinitionError, GroupId, HelpTag, InvocationMap, MisuseError, OptionGroup,
    OptionHandle, ParameterGroup, Resolution, UsageError, UsageErrors,
};

/// Function producing a co-occurring group's output from the parse result.
///
/// Receives whether the group occurred, the shared inner group, and the parse
/// context. It runs on every finalize, in both the occurred and the absent
/// case.
pub type Transform<G, Out> = Box<dyn Fn(bool, &Rc<G>, &Context) -> Out>;

/// Option group whose options are required only if any of them is present.
///
/// `G` is the inner group: an [`OptionGroup`] or any type that exposes one
/// through `AsRef<OptionGroup>`, typically a struct holding the group and
/// handles to its options.
pub struct CoOccurringOptionGroup<G, Out> {
    id: GroupId,
    group: Rc<G>,
    transform: Transform<G, Out>,
    occurred: Cell<bool>,
    value: RefCell<Resolution<Out>>,
}

impl<G: AsRef<OptionGroup>, Out> CoOccurringOptionGroup<G, Out> {
    /// Wraps `group`, checking that it has a required option and no eager
    /// option.
    ///
    /// # Examples
    ///
    /// ```
    /// use optgroup_core::*;
    ///
    /// let optional = OptionBuilder::new(&["--b"]).build().unwrap();
    /// let group = OptionGroup::new().with_option(optional);
    /// let result = CoOccurringOptionGroup::new(group, |occurred, _, _| occurred);
    /// assert_eq!(result.err(), Some(DefinitionError::NoRequiredOption));
    /// ```
    pub fn new<F>(group: G, transform: F) -> Result<Self, DefinitionError>
    where
        F: Fn(bool, &Rc<G>, &Context) -> Out + 'static,
    {
        Self::from_shared(Rc::new(group), Box::new(transform))
    }

    fn from_shared(group: Rc<G>, transform: Transform<G, Out>) -> Result<Self, DefinitionError> {
        let options = <G as AsRef<OptionGroup>>::as_ref(&group).options();
        if !options
            .iter()
            .any(|option| option.help_tags().contains(&HelpTag::Required))
        {
            return Err(DefinitionError::NoRequiredOption);
        }
        if let Some(eager) = options.iter().find(|option| option.is_eager()) {
            return Err(DefinitionError::EagerOption(eager.name().to_string()));
        }

        Ok(Self {
            id: GroupId::next(),
            group,
            transform,
            occurred: Cell::new(false),
            value: RefCell::new(Resolution::Unresolved),
        })
    }

    fn inner(&self) -> &OptionGroup {
        <G as AsRef<OptionGroup>>::as_ref(&self.group)
    }

    /// The shared inner group.
    pub fn group(&self) -> &Rc<G> {
        &self.group
    }

    /// Whether the last finalize saw any of this group's options.
    pub fn occurred(&self) -> bool {
        self.occurred.get()
    }

    /// Whether finalize has run since the last reset.
    pub fn is_finalized(&self) -> bool {
        self.value.borrow().is_resolved()
    }

    /// Returns a clone of the transformed value.
    pub fn value(&self) -> Result<Out, MisuseError>
    where
        Out: Clone,
    {
        self.value.borrow().get().cloned()
    }

    /// Borrows the transformed value for the duration of `f`.
    pub fn with_value<R>(&self, f: impl FnOnce(&Out) -> R) -> Result<R, MisuseError> {
        self.value.borrow().get().map(f)
    }

    /// Creates a second group over the same inner group with another
    /// transform.
    ///
    /// The copy shares the options (and their resolved values) but keeps its
    /// own `occurred` flag and output. Only one of the two may be registered
    /// with a command; registering both is rejected with
    /// [`DefinitionError::OptionAlreadyRegistered`].
    ///
    /// # Examples
    ///
    /// ```
    /// use optgroup_core::*;
    ///
    /// let a = OptionBuilder::new(&["--a"]).required().build().unwrap();
    /// let group = cooccurring(OptionGroup::new().with_option(a)).unwrap();
    /// let flag = group.copy(|occurred, _, _| occurred);
    /// assert!(std::rc::Rc::ptr_eq(group.group(), flag.group()));
    /// ```
    pub fn copy<T, F>(&self, transform: F) -> CoOccurringOptionGroup<G, T>
    where
        F: Fn(bool, &Rc<G>, &Context) -> T + 'static,
    {
        CoOccurringOptionGroup {
            id: GroupId::next(),
            group: Rc::clone(&self.group),
            transform: Box::new(transform),
            occurred: Cell::new(false),
            value: RefCell::new(Resolution::Unresolved),
        }
    }
}

impl<G: AsRef<OptionGroup>, Out> ParameterGroup for CoOccurringOptionGroup<G, Out> {
    fn id(&self) -> GroupId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.inner().name()
    }

    fn help(&self) -> Option<&str> {
        self.inner().help()
    }

    fn options(&self) -> &[OptionHandle] {
        self.inner().options()
    }

    fn finalize(&self, context: &Context, invocations: &InvocationMap) -> Result<(), UsageErrors> {
        let options = self.inner().options();
        let occurred = options.iter().any(|option| invocations.contains(option.id()))
            || options
                .iter()
                .any(|option| option.has_sourced_value(context, invocations.get(option.id())));
        self.occurred.set(occurred);

        let validated = if occurred {
            debug!(group = ?self.name(), "co-occurring group present, validating");
            self.inner().finalize(context, invocations)
        } else {
            debug!(group = ?self.name(), "co-occurring group absent, skipping validation");
            Ok(())
        };

        let value = (self.transform)(occurred, &self.group, context);
        *self.value.borrow_mut() = Resolution::Resolved(value);
        validated
    }

    fn post_validate(&self, context: &Context) -> Result<(), UsageError> {
        if self.occurred.get() {
            self.inner().post_validate(context)
        } else {
            Ok(())
        }
    }

    fn reset(&self) {
        self.occurred.set(false);
        *self.value.borrow_mut() = Resolution::Unresolved;
    }
}

impl<G, Out: fmt::Debug> fmt::Debug for CoOccurringOptionGroup<G, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoOccurringOptionGroup")
            .field("id", &self.id)
            .field("occurred", &self.occurred.get())
            .field("value", &self.value.borrow())
            .finish_non_exhaustive()
    }
}

/// Makes `group` co-occurring with the standard output: `Some(group)` when
/// any of its options was given, `None` otherwise.
///
/// At least one option in the group must be required, and none may be eager.
pub fn cooccurring<G>(group: G) -> Result<CoOccurringOptionGroup<G, Option<Rc<G>>>, DefinitionError>
where
    G: AsRef<OptionGroup> + 'static,
{
    CoOccurringOptionGroup::new(group, |occurred, group: &Rc<G>, _| {
        occurred.then(|| Rc::clone(group))
    })
}
