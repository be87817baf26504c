//! Error types for option definition, parsing, and value access.
//!
//! Errors fall into three families with different audiences:
//!
//! - [`DefinitionError`]: raised while a command is being declared (bad
//!   option names, co-occurring groups without a required option, ...). These
//!   are meant for the author of the command and never depend on argv.
//! - [`MisuseError`]: a programming error such as reading a group value
//!   before the command line has been finalized.
//! - [`UsageError`]: a problem with what the end user typed. Several of them
//!   are collected into [`UsageErrors`] so one invocation reports every
//!   missing option at once.

use std::fmt;

use thiserror::Error;

/// Errors detected while declaring options, groups, and commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A co-occurring group has no required option.
    #[error("at least one option in a co-occurring group must be required")]
    NoRequiredOption,
    /// A co-occurring group contains an eager option.
    #[error("eager options are not allowed in co-occurring groups: {0}")]
    EagerOption(String),
    /// Two registered options share a name.
    #[error("duplicate option name: {0}")]
    DuplicateOption(String),
    /// The same option was registered twice with one command.
    #[error("option is already registered with this command: {0}")]
    OptionAlreadyRegistered(String),
    /// An option was declared without any name.
    #[error("option must define at least one name")]
    MissingOptionName,
    /// An option name does not look like `-x` or `--long`.
    #[error("invalid option name: {0}")]
    InvalidOptionName(String),
}

/// Programming errors in the way parsed values are accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MisuseError {
    /// A value was read before `finalize` ran for the current parse.
    #[error("cannot read from option group before parsing command line")]
    ReadBeforeFinalize,
}

/// A single user-facing problem with the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A required option has no invocation and no sourced value.
    #[error("missing option {name}")]
    MissingOption {
        /// Display name of the option.
        name: String,
    },
    /// The command line named an option the command does not know.
    #[error("no such option {name}")]
    NoSuchOption {
        /// Name as typed by the user.
        name: String,
    },
    /// An option that takes a value was given as the last token.
    #[error("option {name} requires a value")]
    MissingArgument {
        /// Name as typed by the user.
        name: String,
    },
    /// A flag was given an inline `=value`.
    #[error("option {name} does not take a value")]
    UnexpectedValue {
        /// Name as typed by the user.
        name: String,
    },
    /// A post-validation check rejected the resolved value.
    #[error("invalid value for {name}: {message}")]
    BadParameter {
        /// Display name of the option.
        name: String,
        /// Message produced by the check.
        message: String,
    },
}

impl UsageError {
    /// Returns the option name this error refers to.
    ///
    /// # Examples
    ///
    /// ```
    /// use optgroup_core::UsageError;
    ///
    /// let err = UsageError::MissingOption { name: "--a".into() };
    /// assert_eq!(err.option_name(), "--a");
    /// assert_eq!(err.to_string(), "missing option --a");
    /// ```
    pub fn option_name(&self) -> &str {
        match self {
            Self::MissingOption { name }
            | Self::NoSuchOption { name }
            | Self::MissingArgument { name }
            | Self::UnexpectedValue { name }
            | Self::BadParameter { name, .. } => name,
        }
    }
}

/// Non-empty collection of [`UsageError`]s produced by one parse.
///
/// # Examples
///
/// ```
/// use optgroup_core::{UsageError, UsageErrors};
///
/// let errors = UsageErrors::from_vec(vec![
///     UsageError::MissingOption { name: "--a".into() },
///     UsageError::MissingOption { name: "--b".into() },
/// ])
/// .unwrap();
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors.to_string(), "missing option --a\nmissing option --b");
///
/// assert!(UsageErrors::from_vec(Vec::new()).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageErrors(Vec<UsageError>);

impl UsageErrors {
    /// Wraps a list of errors, returning `None` when the list is empty.
    pub fn from_vec(errors: Vec<UsageError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// Builds an aggregate holding exactly one error.
    pub fn single(error: UsageError) -> Self {
        Self(vec![error])
    }

    /// Number of errors in the aggregate.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the aggregate holds no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the contained errors in the order they were raised.
    pub fn iter(&self) -> std::slice::Iter<'_, UsageError> {
        self.0.iter()
    }

    /// Consumes the aggregate and returns the errors.
    pub fn into_vec(self) -> Vec<UsageError> {
        self.0
    }
}

impl fmt::Display for UsageErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UsageErrors {}

impl From<UsageError> for UsageErrors {
    fn from(error: UsageError) -> Self {
        Self::single(error)
    }
}

impl<'a> IntoIterator for &'a UsageErrors {
    type Item = &'a UsageError;
    type IntoIter = std::slice::Iter<'a, UsageError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for UsageErrors {
    type Item = UsageError;
    type IntoIter = std::vec::IntoIter<UsageError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Turns a list of collected errors into a `Result`.
pub(crate) fn collect_errors(errors: Vec<UsageError>) -> Result<(), UsageErrors> {
    match UsageErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

/// Errors raised while building a value source from external data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Input was not valid JSON.
    #[error("invalid JSON value source: {0}")]
    Json(#[from] serde_json::Error),
    /// Top-level JSON value was not an object.
    #[error("value source must be a JSON object")]
    NotAnObject,
    /// A key mapped to a nested object, which has no option representation.
    #[error("unsupported value for key '{0}': nested objects are not allowed")]
    UnsupportedValue(String),
}
