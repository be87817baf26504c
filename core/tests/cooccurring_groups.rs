//! End-to-end tests for co-occurring groups driven through a `Command`.

use std::cell::Cell;
use std::rc::Rc;

use optgroup_core::{
    CoOccurringOptionGroup, Command, Context, DefinitionError, MapValueSource, MisuseError,
    OptionBuilder, OptionGroup, OptionHandle, ParameterGroup, UsageError, ValueOrigin, cooccurring,
};

const NO_ARGS: [&str; 0] = [];

/// Group `{--a (required), --b (optional, default "x")}` used by most tests.
struct Pair {
    group: OptionGroup,
    a: OptionHandle,
    b: OptionHandle,
}

impl Pair {
    fn new() -> Self {
        let a = OptionBuilder::new(&["--a"])
            .required()
            .envvar("PAIR_A")
            .build()
            .unwrap();
        let b = OptionBuilder::new(&["--b"]).default("x").build().unwrap();
        let group = OptionGroup::named("Pair")
            .with_help("Options that go together")
            .with_option(a.clone())
            .with_option(b.clone());
        Self { group, a, b }
    }
}

impl AsRef<OptionGroup> for Pair {
    fn as_ref(&self) -> &OptionGroup {
        &self.group
    }
}

fn pair_command() -> (Command, Rc<CoOccurringOptionGroup<Pair, Option<Rc<Pair>>>>) {
    let mut command = Command::new("tool");
    let pair = command.register_group(cooccurring(Pair::new()).unwrap()).unwrap();
    (command, pair)
}

#[test]
fn absent_group_yields_none_without_errors() {
    let (command, pair) = pair_command();

    command.parse(&Context::new(), &NO_ARGS).unwrap();

    assert!(!pair.occurred());
    assert!(pair.value().unwrap().is_none());
}

#[test]
fn optional_member_alone_triggers_required_error() {
    let (command, pair) = pair_command();

    let errors = command.parse(&Context::new(), &["--b", "y"]).unwrap_err();

    assert!(pair.occurred());
    assert_eq!(
        errors.into_vec(),
        vec![UsageError::MissingOption {
            name: "--a".to_string()
        }]
    );
    assert_eq!(pair.group().b.value().as_deref(), Some("y"));
}

#[test]
fn required_member_present_resolves_whole_group() {
    let (command, pair) = pair_command();

    command.parse(&Context::new(), &["--a", "v"]).unwrap();

    assert!(pair.occurred());
    let group = pair.value().unwrap().expect("group should be present");
    assert_eq!(group.a.value().as_deref(), Some("v"));
    assert_eq!(group.b.value().as_deref(), Some("x"));
    assert_eq!(group.b.origin(), Some(ValueOrigin::Default));
}

#[test]
fn environment_value_makes_group_occur() {
    let (command, pair) = pair_command();
    let context = Context::new().with_env("PAIR_A", "from-env");

    command.parse(&context, &NO_ARGS).unwrap();

    assert!(pair.occurred());
    let group = pair.value().unwrap().unwrap();
    assert_eq!(group.a.value().as_deref(), Some("from-env"));
    assert_eq!(group.a.origin(), Some(ValueOrigin::Environment));
}

#[test]
fn value_source_makes_group_occur() {
    let (command, pair) = pair_command();
    let context = Context::new().with_source(MapValueSource::new().with_value("a", "cfg"));

    command.parse(&context, &NO_ARGS).unwrap();

    assert!(pair.occurred());
    assert_eq!(pair.group().a.origin(), Some(ValueOrigin::ValueSource));
}

#[test]
fn unrelated_options_do_not_make_group_occur() {
    let verbose = OptionBuilder::flag(&["-v"]).build().unwrap();
    let (mut command, pair) = pair_command();
    command.register_option(verbose.clone()).unwrap();

    command.parse(&Context::new(), &["-v"]).unwrap();

    assert!(!pair.occurred());
    assert_eq!(verbose.value().as_deref(), Some("true"));
}

#[test]
fn errors_from_several_groups_are_reported_together() {
    let (mut command, _pair) = pair_command();
    let user = OptionBuilder::new(&["--user"]).required().build().unwrap();
    let port = OptionBuilder::new(&["--port"]).build().unwrap();
    let login = OptionGroup::named("Login").with_option(user).with_option(port);
    command.register_group(cooccurring(login).unwrap()).unwrap();

    let errors = command
        .parse(&Context::new(), &["--b", "y", "--port", "22"])
        .unwrap_err();

    let names: Vec<&str> = errors.iter().map(UsageError::option_name).collect();
    assert_eq!(names, vec!["--a", "--user"]);
}

#[test]
fn plain_and_cooccurring_groups_side_by_side() {
    let (mut command, pair) = pair_command();
    let level = OptionBuilder::new(&["--level"]).required().build().unwrap();
    let plain = command
        .register_group(OptionGroup::named("Logging").with_option(level.clone()))
        .unwrap();

    let errors = command.parse(&Context::new(), &NO_ARGS).unwrap_err();
    assert_eq!(errors.to_string(), "missing option --level");
    assert!(!pair.occurred());

    command.parse(&Context::new(), &["--level", "info"]).unwrap();
    assert_eq!(level.value().as_deref(), Some("info"));
    assert_eq!(level.group_id(), Some(plain.id()));
}

#[test]
fn post_validation_runs_only_for_present_groups() {
    let checks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&checks);
    let a = OptionBuilder::new(&["--a"])
        .required()
        .check(move |value, _| {
            counter.set(counter.get() + 1);
            match value.last() {
                Some("bad") => Err("not allowed".to_string()),
                _ => Ok(()),
            }
        })
        .build()
        .unwrap();
    let mut command = Command::new("tool");
    command
        .register_group(cooccurring(OptionGroup::new().with_option(a)).unwrap())
        .unwrap();

    command.parse(&Context::new(), &NO_ARGS).unwrap();
    assert_eq!(checks.get(), 0);

    command.parse(&Context::new(), &["--a", "ok"]).unwrap();
    assert_eq!(checks.get(), 1);

    let errors = command.parse(&Context::new(), &["--a", "bad"]).unwrap_err();
    assert_eq!(errors.to_string(), "invalid value for --a: not allowed");
    assert_eq!(checks.get(), 2);
}

#[test]
fn reused_command_overwrites_previous_parse() {
    let (command, pair) = pair_command();

    command.parse(&Context::new(), &["--a", "v", "--b", "y"]).unwrap();
    assert!(pair.occurred());
    assert_eq!(pair.group().b.value().as_deref(), Some("y"));

    command.parse(&Context::new(), &NO_ARGS).unwrap();
    assert!(!pair.occurred());
    assert!(pair.value().unwrap().is_none());
    assert!(!pair.group().a.is_resolved());
    assert_eq!(pair.group().b.value(), None);
}

#[test]
fn rejected_argv_leaves_no_stale_group_value() {
    let (command, pair) = pair_command();

    command.parse(&Context::new(), &["--a", "v"]).unwrap();
    assert!(pair.occurred());

    let errors = command.parse(&Context::new(), &["--nope"]).unwrap_err();
    assert_eq!(errors.to_string(), "no such option --nope");
    assert!(!pair.occurred());
    assert!(!pair.is_finalized());
    assert_eq!(pair.value().err(), Some(MisuseError::ReadBeforeFinalize));
    assert!(!pair.group().a.is_resolved());
}

#[test]
fn eager_parse_leaves_no_stale_group_value() {
    let mut command = Command::new("tool");
    let version = OptionBuilder::flag(&["--version"]).eager().build().unwrap();
    command.register_option(version).unwrap();
    let pair = command.register_group(cooccurring(Pair::new()).unwrap()).unwrap();

    command.parse(&Context::new(), &["--a", "v"]).unwrap();
    assert!(pair.value().unwrap().is_some());

    let outcome = command.parse(&Context::new(), &["--a", "v", "--version"]).unwrap();
    assert_eq!(outcome.eager.as_deref(), Some("--version"));
    assert!(!pair.occurred());
    assert_eq!(pair.value().err(), Some(MisuseError::ReadBeforeFinalize));
    assert!(!pair.group().a.is_resolved());

    command.parse(&Context::new(), &NO_ARGS).unwrap();
    assert!(pair.value().unwrap().is_none());
}

#[test]
fn copy_presents_one_group_in_two_shapes() {
    let original = cooccurring(Pair::new()).unwrap();
    let summary = original.copy(|occurred, pair: &Rc<Pair>, _| {
        if occurred {
            format!("a={}", pair.a.value().unwrap_or_default())
        } else {
            "absent".to_string()
        }
    });
    let mut command = Command::new("tool");
    let summary = command.register_group(summary).unwrap();

    command.parse(&Context::new(), &["--a", "v"]).unwrap();
    assert_eq!(summary.value().unwrap(), "a=v");

    // The unregistered alias can still be finalized by hand and sees the
    // same options.
    let argv_map = command.collect_invocations(&["--a", "v"]).unwrap().0;
    original.finalize(&Context::new(), &argv_map).unwrap();
    assert_eq!(original.occurred(), summary.occurred());
    assert!(Rc::ptr_eq(
        &original.value().unwrap().unwrap(),
        summary.group()
    ));
}

#[test]
fn registering_both_copies_is_rejected() {
    let original = cooccurring(Pair::new()).unwrap();
    let alias = original.copy(|occurred, _, _| occurred);
    let mut command = Command::new("tool");
    command.register_group(original).unwrap();

    let err = command.register_group(alias).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::OptionAlreadyRegistered("--a".to_string())
    );
}

#[test]
fn definition_errors_surface_before_parsing() {
    let optional = OptionBuilder::new(&["--b"]).build().unwrap();
    let eager = OptionBuilder::flag(&["--help"]).eager().build().unwrap();
    let required = OptionBuilder::new(&["--a"]).required().build().unwrap();

    let no_required = cooccurring(OptionGroup::new().with_option(optional));
    assert!(matches!(no_required, Err(DefinitionError::NoRequiredOption)));

    let with_eager = cooccurring(OptionGroup::new().with_option(required).with_option(eager));
    assert!(matches!(with_eager, Err(DefinitionError::EagerOption(_))));
}
