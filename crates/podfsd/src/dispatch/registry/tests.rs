//! Registry construction and lookup tests.

use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

use super::*;
use crate::workdir::WorkingDirectory;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoArgs {
    text: String,
    #[serde(default)]
    shout: bool,
}

struct Echo;

impl Command for Echo {
    const NAME: &'static str = "echo";
    type Args = EchoArgs;

    fn execute(&self, args: EchoArgs, _context: &CommandContext) -> Result<Reply, DispatchError> {
        let text = if args.shout {
            args.text.to_uppercase()
        } else {
            args.text
        };
        let mut reply = Reply::new();
        reply.insert("text".to_owned(), Value::from(text));
        Ok(reply)
    }
}

struct Blank;

impl Command for Blank {
    const NAME: &'static str = "";
    type Args = EchoArgs;

    fn execute(&self, _args: EchoArgs, _context: &CommandContext) -> Result<Reply, DispatchError> {
        Ok(Reply::new())
    }
}

fn arguments(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[fixture]
fn context() -> CommandContext {
    CommandContext::new(1024, 4096, WorkingDirectory::new("/"))
}

#[fixture]
fn registry() -> CommandRegistry {
    CommandRegistry::builder()
        .register(Echo)
        .expect("register echo")
        .build()
}

#[rstest]
fn lookup_finds_registered_command(registry: CommandRegistry, context: CommandContext) {
    let command = registry.lookup("echo").expect("echo is registered");
    assert_eq!(command.name(), "echo");
    let reply = command
        .invoke(arguments(json!({"text": "hi", "shout": true})), &context)
        .expect("invoke");
    assert_eq!(reply.get("text"), Some(&Value::from("HI")));
}

#[rstest]
fn lookup_rejects_unknown_command(registry: CommandRegistry) {
    let error = registry.lookup("nope").err().expect("unknown command");
    assert!(matches!(error, DispatchError::UnknownCommand { ref command } if command == "nope"));
}

#[rstest]
#[case::missing(json!({}))]
#[case::extra(json!({"text": "hi", "colour": "red"}))]
#[case::mistyped(json!({"text": 42}))]
fn invoke_rejects_mismatched_arguments(
    registry: CommandRegistry,
    context: CommandContext,
    #[case] supplied: Value,
) {
    let command = registry.lookup("echo").expect("echo is registered");
    let error = command
        .invoke(arguments(supplied), &context)
        .expect_err("arguments must be rejected");
    assert!(matches!(error, DispatchError::InvalidArguments { .. }));
    assert!(error.to_string().contains("echo"));
}

#[test]
fn duplicate_registration_fails() {
    let error = CommandRegistry::builder()
        .register(Echo)
        .and_then(|builder| builder.register(Echo))
        .err()
        .expect("duplicate must fail");
    assert_eq!(
        error,
        RegistryError::DuplicateCommand {
            name: "echo".to_owned()
        }
    );
}

#[test]
fn empty_name_is_rejected() {
    let error = CommandRegistry::builder()
        .register(Blank)
        .err()
        .expect("empty name must fail");
    assert!(matches!(error, RegistryError::InvalidName { .. }));
}

#[rstest]
fn debug_lists_names(registry: CommandRegistry) {
    assert_eq!(registry.names(), vec!["echo"]);
    assert_eq!(registry.len(), 1);
    assert!(format!("{registry:?}").contains("echo"));
}

#[test]
fn into_reply_requires_object() {
    assert!(into_reply(&json!({"a": 1})).is_ok());
    assert!(matches!(
        into_reply(&json!([1, 2])),
        Err(DispatchError::Internal { .. })
    ));
}
