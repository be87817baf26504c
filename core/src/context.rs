//! Per-parse context: environment snapshot and value sources.
//!
//! Options may receive a value without being invoked, either from an
//! environment variable or from a [`ValueSource`] (a config file, a JSON
//! document, ...). The [`Context`] carries both so that finalization never
//! reads process state directly and tests can supply exact inputs.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::{OptionHandle, SourceError};

/// Provider of option values that do not come from argv or the environment.
pub trait ValueSource {
    /// Returns the values for `option`, or `None` if this source has none.
    fn values(&self, option: &OptionHandle) -> Option<Vec<String>>;
}

/// Value source backed by an in-memory map keyed by
/// [`OptionHandle::value_key`].
///
/// # Examples
///
/// ```
/// use optgroup_core::{MapValueSource, OptionBuilder, ValueSource};
///
/// let source = MapValueSource::from_json_str(r#"{"output": "out.txt", "tag": ["a", "b"]}"#)
///     .unwrap();
/// let output = OptionBuilder::new(&["-o", "--output"]).build().unwrap();
/// let tag = OptionBuilder::new(&["--tag"]).build().unwrap();
/// let other = OptionBuilder::new(&["--other"]).build().unwrap();
///
/// assert_eq!(source.values(&output), Some(vec!["out.txt".to_string()]));
/// assert_eq!(source.values(&tag), Some(vec!["a".to_string(), "b".to_string()]));
/// assert_eq!(source.values(&other), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapValueSource {
    values: HashMap<String, Vec<String>>,
}

impl MapValueSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single value for `key`, replacing previous values.
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.insert(key, vec![value.to_string()]);
        self
    }

    /// Sets the values for `key`.
    pub fn insert(&mut self, key: &str, values: Vec<String>) {
        self.values.insert(key.to_string(), values);
    }

    /// Builds a source from a JSON object.
    ///
    /// Strings, numbers, and booleans become one value; arrays of them become
    /// several values; `null` is skipped. Nested objects are rejected.
    pub fn from_json(json: &Value) -> Result<Self, SourceError> {
        let object = json.as_object().ok_or(SourceError::NotAnObject)?;
        let mut source = Self::new();
        for (key, value) in object {
            let values = match value {
                Value::Null => continue,
                Value::Array(items) => items
                    .iter()
                    .map(|item| scalar_to_string(key, item))
                    .collect::<Result<Vec<_>, _>>()?,
                scalar => vec![scalar_to_string(key, scalar)?],
            };
            source.insert(key, values);
        }
        Ok(source)
    }

    /// Parses JSON text and builds a source from it.
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Number of keys in the source.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the source has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String, SourceError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(SourceError::UnsupportedValue(key.to_string()))
        }
    }
}

impl ValueSource for MapValueSource {
    fn values(&self, option: &OptionHandle) -> Option<Vec<String>> {
        self.values.get(option.value_key()).cloned()
    }
}

/// Inputs shared by every group and option during one parse.
///
/// # Examples
///
/// ```
/// use optgroup_core::{Context, MapValueSource};
///
/// let context = Context::new()
///     .with_env("APP_TOKEN", "secret")
///     .with_source(MapValueSource::new().with_value("region", "eu"));
/// assert_eq!(context.env("APP_TOKEN"), Some("secret"));
/// assert_eq!(context.env("MISSING"), None);
/// assert_eq!(context.sources().count(), 1);
/// ```
#[derive(Default)]
pub struct Context {
    env: HashMap<String, String>,
    sources: Vec<Box<dyn ValueSource>>,
}

impl Context {
    /// Creates a context with an empty environment and no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context holding a snapshot of the process environment.
    pub fn from_process_env() -> Self {
        Self::new().with_env_vars(std::env::vars())
    }

    /// Sets one environment variable in the snapshot.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds several environment variables to the snapshot.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Appends a value source; earlier sources take precedence.
    pub fn with_source<S: ValueSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Looks up an environment variable in the snapshot.
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Iterates over the value sources in precedence order.
    pub fn sources(&self) -> impl Iterator<Item = &dyn ValueSource> {
        self.sources.iter().map(|source| source.as_ref())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("env_vars", &self.env.len())
            .field("sources", &self.sources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OptionBuilder;

    #[test]
    fn test_from_json_converts_scalars() {
        let source = MapValueSource::from_json(&json!({
            "port": 8080,
            "debug": true,
            "name": "svc",
            "unset": null
        }))
        .unwrap();

        assert_eq!(source.len(), 3);
        let port = OptionBuilder::new(&["--port"]).build().unwrap();
        let debug = OptionBuilder::flag(&["--debug"]).build().unwrap();
        assert_eq!(source.values(&port), Some(vec!["8080".to_string()]));
        assert_eq!(source.values(&debug), Some(vec!["true".to_string()]));
    }

    #[test]
    fn test_from_json_rejects_nested_objects() {
        let err = MapValueSource::from_json(&json!({"db": {"host": "x"}})).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedValue(key) if key == "db"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = MapValueSource::from_json(&json!(["a"])).unwrap_err();
        assert!(matches!(err, SourceError::NotAnObject));
    }

    #[test]
    fn test_from_json_str_rejects_invalid_json() {
        let err = MapValueSource::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[test]
    fn test_first_source_wins() {
        let region = OptionBuilder::new(&["--region"]).build().unwrap();
        let context = Context::new()
            .with_source(MapValueSource::new().with_value("region", "eu"))
            .with_source(MapValueSource::new().with_value("region", "us"));

        let found = context.sources().find_map(|source| source.values(&region));
        assert_eq!(found, Some(vec!["eu".to_string()]));
    }
}
