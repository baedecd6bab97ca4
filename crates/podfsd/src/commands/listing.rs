//! `ls`: directory listings with kind bitmasks.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::dispatch::{Command, CommandContext, DispatchError, Reply, into_reply};

use super::PathArgs;
use super::kind::EntryKind;

/// One directory entry on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Entry name (lossily converted when not valid UTF-8).
    pub n: String,
    /// Kind bitmask.
    pub k: EntryKind,
}

impl ListEntry {
    /// Bytes this entry contributes to a prefetch budget.
    pub(crate) fn budget_cost(&self, overhead: usize) -> usize {
        self.n.len().saturating_add(overhead)
    }
}

#[derive(Debug, Serialize)]
struct ListReply {
    files: Vec<ListEntry>,
}

/// Lists the entries of `dir`, sorted by name.
///
/// # Errors
///
/// Returns `DispatchError::OperationFailure` if the directory cannot be read.
pub fn list_directory(dir: &Path) -> Result<Vec<ListEntry>, DispatchError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(DispatchError::at(dir))? {
        let entry = entry.map_err(DispatchError::at(dir))?;
        let path = entry.path();
        let kind = entry
            .file_type()
            .map_or(EntryKind::UNKNOWN, |file_type| {
                EntryKind::classify(file_type, &path)
            });
        files.push(ListEntry {
            n: entry.file_name().to_string_lossy().into_owned(),
            k: kind,
        });
    }
    files.sort_by(|left, right| left.n.cmp(&right.n));
    Ok(files)
}

/// `ls` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListDirectory;

impl Command for ListDirectory {
    const NAME: &'static str = "ls";
    type Args = PathArgs;

    fn execute(&self, args: PathArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let dir = context.workdir().resolve(&args.p);
        let files = list_directory(&dir)?;
        into_reply(&ListReply { files })
    }
}
