//! Session-level commands: `cd` and the `test` liveness probe.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatch::{Command, CommandContext, DispatchError, Reply, into_reply};

use super::COMMANDS_TARGET;
use super::PathArgs;

/// Greeting returned by `test`.
pub const GREETING: &str = "hello from pod";

/// `test` takes no arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Debug, Serialize)]
struct Greeting {
    msg: &'static str,
}

/// `cd` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDirectory;

impl Command for ChangeDirectory {
    const NAME: &'static str = "cd";
    type Args = PathArgs;

    fn execute(&self, args: PathArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let current = context.workdir().change_to(&args.p)?;
        info!(
            target: COMMANDS_TARGET,
            directory = %current.display(),
            "working directory changed"
        );
        Ok(Reply::new())
    }
}

/// `test` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ping;

impl Command for Ping {
    const NAME: &'static str = "test";
    type Args = NoArgs;

    fn execute(&self, _args: NoArgs, _context: &CommandContext) -> Result<Reply, DispatchError> {
        into_reply(&Greeting { msg: GREETING })
    }
}
