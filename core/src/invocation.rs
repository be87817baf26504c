//! Parsed option occurrences collected from the command line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::OptionId;

/// One occurrence of an option on the command line.
///
/// `name` is the spelling the user typed (`-o` or `--output`); `values` holds
/// the raw argument text, empty for flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Option name as typed.
    pub name: String,
    /// Raw argument text.
    pub values: Vec<String>,
}

impl Invocation {
    /// Creates an invocation of a flag (no argument).
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
        }
    }

    /// Creates an invocation carrying one argument.
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            values: vec![value.to_string()],
        }
    }
}

/// Invocations of every option in a command, keyed by option identity.
///
/// The map is built once per parse and always covers the whole command, not
/// a single group, so groups can decide whether they occurred by looking at
/// their own options.
///
/// # Examples
///
/// ```
/// use optgroup_core::{Invocation, InvocationMap, OptionBuilder};
///
/// let verbose = OptionBuilder::flag(&["-v", "--verbose"]).build().unwrap();
/// let mut map = InvocationMap::new();
/// assert!(map.get(verbose.id()).is_empty());
///
/// map.push(verbose.id(), Invocation::flag("-v"));
/// map.push(verbose.id(), Invocation::flag("--verbose"));
/// assert_eq!(map.get(verbose.id()).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InvocationMap {
    entries: HashMap<OptionId, Vec<Invocation>>,
}

impl InvocationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an invocation for an option, keeping argv order.
    pub fn push(&mut self, option: OptionId, invocation: Invocation) {
        self.entries.entry(option).or_default().push(invocation);
    }

    /// Returns the invocations of an option, empty if it never appeared.
    pub fn get(&self, option: OptionId) -> &[Invocation] {
        self.entries.get(&option).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the option appeared at least once.
    pub fn contains(&self, option: OptionId) -> bool {
        !self.get(option).is_empty()
    }

    /// Returns `true` when no option appeared at all.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Number of distinct options that appeared.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|list| !list.is_empty()).count()
    }
}
