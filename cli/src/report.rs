//! Serializable summary of one parse.

use optgroup_core::{Command, OptionHandle, ParameterGroup, ParseOutcome, UsageErrors, ValueOrigin};
use serde::Serialize;

use crate::definition::{BuiltCommand, BuiltGroup};

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub command: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager: Option<String>,
    pub positional: Vec<String>,
    pub groups: Vec<GroupReport>,
    pub options: Vec<OptionReport>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupReport {
    pub name: Option<String>,
    pub cooccurring: bool,
    /// Only meaningful for co-occurring groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct OptionReport {
    pub name: String,
    pub group: Option<String>,
    pub resolved: bool,
    pub values: Vec<String>,
    pub origin: Option<ValueOrigin>,
}

impl OptionReport {
    fn from_option(option: &OptionHandle) -> Self {
        Self {
            name: option.name().to_string(),
            group: option.group_name(),
            resolved: option.is_resolved(),
            values: option.values(),
            origin: option.origin(),
        }
    }
}

impl ParseReport {
    /// Builds the report from the command state left by a parse.
    pub fn new(built: &BuiltCommand, result: &Result<ParseOutcome, UsageErrors>) -> Self {
        let command: &Command = &built.command;
        let groups = built
            .groups
            .iter()
            .map(|group| match group {
                BuiltGroup::Plain(group) => GroupReport {
                    name: group.name().map(String::from),
                    cooccurring: false,
                    occurred: None,
                },
                BuiltGroup::CoOccurring(group) => GroupReport {
                    name: group.name().map(String::from),
                    cooccurring: true,
                    occurred: group.is_finalized().then(|| group.occurred()),
                },
            })
            .collect();
        let options = command
            .options()
            .iter()
            .map(OptionReport::from_option)
            .collect();

        match result {
            Ok(outcome) => Self {
                command: command.name().to_string(),
                ok: true,
                eager: outcome.eager.clone(),
                positional: outcome.positional.clone(),
                groups,
                options,
                errors: Vec::new(),
            },
            Err(errors) => Self {
                command: command.name().to_string(),
                ok: false,
                eager: None,
                positional: Vec::new(),
                groups,
                options,
                errors: errors.iter().map(ToString::to_string).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use optgroup_core::Context;

    use super::*;
    use crate::definition::{CommandDefinition, build_command};

    fn built() -> BuiltCommand {
        let def: CommandDefinition = serde_json::from_value(serde_json::json!({
            "name": "tool",
            "groups": [{
                "name": "Pair",
                "cooccurring": true,
                "options": [
                    {"names": ["--a"], "required": true},
                    {"names": ["--b"], "default": "x"}
                ]
            }]
        }))
        .unwrap();
        build_command(&def).unwrap()
    }

    #[test]
    fn test_report_for_absent_group() {
        let built = built();
        let result = built.command.parse(&Context::new(), &[] as &[&str]);
        let report = ParseReport::new(&built, &result);

        assert!(report.ok);
        assert_eq!(report.groups[0].occurred, Some(false));
        assert!(report.options.iter().all(|o| !o.resolved));
    }

    #[test]
    fn test_report_lists_errors() {
        let built = built();
        let result = built.command.parse(&Context::new(), &["--b", "y"]);
        let report = ParseReport::new(&built, &result);

        assert!(!report.ok);
        assert_eq!(report.errors, vec!["missing option --a"]);
        assert_eq!(report.groups[0].occurred, Some(true));
        let b = report.options.iter().find(|o| o.name == "--b").unwrap();
        assert_eq!(b.values, vec!["y"]);
        assert_eq!(b.origin, Some(ValueOrigin::CommandLine));
        assert_eq!(b.group.as_deref(), Some("Pair"));
    }
}
