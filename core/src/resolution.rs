//! Two-state holder for values that only exist after finalization.

use crate::MisuseError;

/// A value that is unavailable until the command line has been finalized.
///
/// Both options and co-occurring groups keep their parsed state in a
/// `Resolution`. Reading an [`Unresolved`](Resolution::Unresolved) value is a
/// [`MisuseError`] rather than a panic.
///
/// # Examples
///
/// ```
/// use optgroup_core::{MisuseError, Resolution};
///
/// let mut value: Resolution<u32> = Resolution::default();
/// assert_eq!(value.get(), Err(MisuseError::ReadBeforeFinalize));
///
/// value = Resolution::Resolved(7);
/// assert_eq!(value.get(), Ok(&7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Finalization has not run for the current parse.
    Unresolved,
    /// Finalization produced this value.
    Resolved(T),
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl<T> Resolution<T> {
    /// Returns `true` once a value has been stored.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Borrows the resolved value.
    pub fn get(&self) -> Result<&T, MisuseError> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Unresolved => Err(MisuseError::ReadBeforeFinalize),
        }
    }

    /// Consumes the holder and returns the resolved value.
    pub fn into_result(self) -> Result<T, MisuseError> {
        match self {
            Self::Resolved(value) => Ok(value),
            Self::Unresolved => Err(MisuseError::ReadBeforeFinalize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unresolved() {
        let value: Resolution<String> = Resolution::default();
        assert!(!value.is_resolved());
        assert_eq!(value.into_result(), Err(MisuseError::ReadBeforeFinalize));
    }

    #[test]
    fn test_resolved_none_is_still_resolved() {
        let value: Resolution<Option<String>> = Resolution::Resolved(None);
        assert!(value.is_resolved());
        assert_eq!(value.get(), Ok(&None));
    }
}
