//! Declarative command definitions loaded from YAML or JSON.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use optgroup_core::{
    CoOccurringOptionGroup, Command, DefinitionError, OptionBuilder, OptionGroup, OptionHandle,
    cooccurring,
};
use serde::Deserialize;

/// Top-level definition file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDefinition {
    pub names: Vec<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub eager: bool,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub envvar: Option<String>,
    /// Accepted values, checked during post-validation.
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub cooccurring: bool,
    pub options: Vec<OptionDefinition>,
}

/// A registered group, kept so the report can inspect it after parsing.
pub enum BuiltGroup {
    Plain(Rc<OptionGroup>),
    CoOccurring(Rc<CoOccurringOptionGroup<OptionGroup, Option<Rc<OptionGroup>>>>),
}

/// Command built from a definition, with handles to everything registered.
pub struct BuiltCommand {
    pub command: Command,
    pub groups: Vec<BuiltGroup>,
}

/// Reads a definition, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
pub fn load_definition(path: &Path) -> Result<CommandDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    } else {
        serde_json::from_str(&content)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
    }
}

fn build_option(def: &OptionDefinition) -> Result<OptionHandle, DefinitionError> {
    let names: Vec<&str> = def.names.iter().map(String::as_str).collect();
    let mut builder = if def.flag {
        OptionBuilder::flag(&names)
    } else {
        OptionBuilder::new(&names)
    };
    if let Some(help) = &def.help {
        builder = builder.help(help);
    }
    if def.required {
        builder = builder.required();
    }
    if def.eager {
        builder = builder.eager();
    }
    if let Some(default) = &def.default {
        builder = builder.default(default);
    }
    if let Some(envvar) = &def.envvar {
        builder = builder.envvar(envvar);
    }
    if !def.choices.is_empty() {
        let choices = def.choices.clone();
        builder = builder.check(move |value, _| {
            match value.values.iter().find(|v| !choices.contains(*v)) {
                Some(bad) => Err(format!(
                    "'{bad}' is not one of {}",
                    choices.join(", ")
                )),
                None => Ok(()),
            }
        });
    }
    builder.build()
}

/// Builds and registers every option and group of a definition.
pub fn build_command(def: &CommandDefinition) -> Result<BuiltCommand, DefinitionError> {
    let mut command = Command::new(&def.name);
    for option in &def.options {
        command.register_option(build_option(option)?)?;
    }

    let mut groups = Vec::new();
    for group_def in &def.groups {
        let mut group = match &group_def.name {
            Some(name) => OptionGroup::named(name),
            None => OptionGroup::new(),
        };
        if let Some(help) = &group_def.help {
            group = group.with_help(help);
        }
        for option in &group_def.options {
            group.register(build_option(option)?);
        }

        let built = if group_def.cooccurring {
            BuiltGroup::CoOccurring(command.register_group(cooccurring(group)?)?)
        } else {
            BuiltGroup::Plain(command.register_group(group)?)
        };
        groups.push(built);
    }

    Ok(BuiltCommand { command, groups })
}
