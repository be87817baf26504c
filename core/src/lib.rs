//! Option groups and their finalization protocol for command-line parsers.
//!
//! This crate models how related options are collected into groups and
//! validated once the whole command line is known:
//!
//! - [`OptionBuilder`] / [`OptionHandle`]: a declared option with immutable
//!   `required` and `eager` markers and a per-parse resolved value.
//! - [`ParameterGroup`]: the contract every group satisfies: `finalize`
//!   after all invocations are collected, `post_validate` after every group
//!   has finalized.
//! - [`OptionGroup`]: a plain named collection of options.
//! - [`CoOccurringOptionGroup`]: an all-or-nothing group: its required
//!   options are enforced only if any of its options is present.
//! - [`Command`]: the owning command that registers options and groups,
//!   builds the [`InvocationMap`] from argv, and drives the two phases.
//!
//! Values can also come from the environment or from a [`ValueSource`],
//! both carried by the [`Context`].
//!
//! # Example
//!
//! ```
//! use optgroup_core::*;
//!
//! let a = OptionBuilder::new(&["--a"]).required().build()?;
//! let b = OptionBuilder::new(&["--b"]).default("x").build()?;
//! let pair = OptionGroup::named("Pair")
//!     .with_option(a.clone())
//!     .with_option(b.clone());
//!
//! let mut command = Command::new("tool");
//! let pair = command.register_group(cooccurring(pair)?)?;
//!
//! command.parse(&Context::new(), &["--a", "v"])?;
//! assert!(pair.occurred());
//! assert_eq!(a.value().as_deref(), Some("v"));
//! assert_eq!(b.value().as_deref(), Some("x"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod command;
mod context;
mod cooccurring;
mod error;
mod finalize;
mod group;
mod invocation;
mod option;
mod resolution;

pub use command::{Command, ParseOutcome};
pub use context::{Context, MapValueSource, ValueSource};
pub use cooccurring::{CoOccurringOptionGroup, Transform, cooccurring};
pub use error::{DefinitionError, MisuseError, SourceError, UsageError, UsageErrors};
pub use finalize::finalize_options;
pub use group::{GroupHelp, GroupId, OptionGroup, ParameterGroup};
pub use invocation::{Invocation, InvocationMap};
pub use option::{HelpTag, OptionBuilder, OptionHandle, OptionId, ResolvedValue, ValueOrigin};
pub use resolution::Resolution;
