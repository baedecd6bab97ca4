//! Built-in filesystem command set.
//!
//! Every command resolves its path arguments through the shared
//! [`WorkingDirectory`](crate::workdir::WorkingDirectory), so relative paths
//! follow the most recent `cd`. Argument field names match what the
//! controller sends on the wire.

mod content;
mod kind;
mod listing;
mod session;
mod stat;
mod tree;

use std::path::PathBuf;

use serde::Deserialize;

use crate::dispatch::{CommandRegistry, RegistryError};

pub use self::content::{ReadContent, WriteArgs, WriteContent, oversize_notice};
pub use self::kind::EntryKind;
pub use self::listing::{ListDirectory, ListEntry, list_directory};
pub use self::session::{ChangeDirectory, GREETING, NoArgs, Ping};
pub use self::stat::{EDITABLE, PREFETCH_ENTRY_OVERHEAD, READ_ONLY, StatPath};
pub use self::tree::{CopyPath, MakeDirectories, MovePath, RemoveArgs, RemovePath, TransferArgs};

/// Tracing target for command handlers.
pub(crate) const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Arguments for commands that take a single path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathArgs {
    /// Target path, absolute or relative to the working directory.
    pub p: PathBuf,
}

/// Builds the registry holding every built-in command.
///
/// # Errors
///
/// Returns a [`RegistryError`] if two commands share a name.
pub fn filesystem_registry() -> Result<CommandRegistry, RegistryError> {
    Ok(CommandRegistry::builder()
        .register(ListDirectory)?
        .register(StatPath)?
        .register(ReadContent)?
        .register(WriteContent)?
        .register(MakeDirectories)?
        .register(RemovePath)?
        .register(MovePath)?
        .register(CopyPath)?
        .register(ChangeDirectory)?
        .register(Ping)?
        .build())
}
