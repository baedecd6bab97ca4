//! `mstat`: metadata with an optional inline listing.

use std::fs::{self, Metadata};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::dispatch::{Command, CommandContext, DispatchError, Reply, into_reply};

use super::COMMANDS_TARGET;
use super::PathArgs;
use super::kind::EntryKind;
use super::listing::{ListEntry, list_directory};

/// Per-entry overhead charged against the prefetch budget.
pub const PREFETCH_ENTRY_OVERHEAD: usize = 8;

/// Value of `permissions` when in-place editing is allowed.
pub const EDITABLE: u8 = 0;
/// Value of `permissions` when the path is read-only or too large.
pub const READ_ONLY: u8 = 1;

#[derive(Debug, Serialize)]
struct StatReply {
    #[serde(rename = "type")]
    kind: EntryKind,
    ctime: i64,
    mtime: i64,
    size: u64,
    prefetch_ls: Option<Vec<ListEntry>>,
    permissions: u8,
}

/// `mstat` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatPath;

impl Command for StatPath {
    const NAME: &'static str = "mstat";
    type Args = PathArgs;

    fn execute(&self, args: PathArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let path = context.workdir().resolve(&args.p);
        let kind = EntryKind::of(&path).map_err(DispatchError::at(&path))?;
        let metadata = fs::metadata(&path)
            .or_else(|_| fs::symlink_metadata(&path))
            .map_err(DispatchError::at(&path))?;

        let prefetch_ls = if metadata.is_dir() {
            prefetch_listing(&path, context.prefetch_budget())
        } else {
            None
        };
        let size = metadata.len();
        let permissions = if is_writable(&path, &metadata) && size <= context.size_limit() {
            EDITABLE
        } else {
            READ_ONLY
        };

        into_reply(&StatReply {
            kind,
            ctime: change_time_millis(&metadata),
            mtime: metadata.modified().map_or(0, millis_since_epoch),
            size,
            prefetch_ls,
            permissions,
        })
    }
}

/// Lists `dir` when the listing fits in `budget`.
///
/// A directory that cannot be read simply yields no prefetch; the caller can
/// still issue `ls` and see the real error.
fn prefetch_listing(dir: &Path, budget: usize) -> Option<Vec<ListEntry>> {
    let entries = match list_directory(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(target: COMMANDS_TARGET, %error, "prefetch listing skipped");
            return None;
        }
    };
    fits_budget(&entries, budget).then_some(entries)
}

fn fits_budget(entries: &[ListEntry], budget: usize) -> bool {
    let cost = entries.iter().fold(0_usize, |total, entry| {
        total.saturating_add(entry.budget_cost(PREFETCH_ENTRY_OVERHEAD))
    });
    cost < budget
}

fn millis_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

#[cfg(unix)]
fn change_time_millis(metadata: &Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;

    metadata
        .ctime()
        .saturating_mul(1000)
        .saturating_add(metadata.ctime_nsec() / 1_000_000)
}

#[cfg(not(unix))]
fn change_time_millis(metadata: &Metadata) -> i64 {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_or(0, millis_since_epoch)
}

#[cfg(unix)]
fn is_writable(path: &Path, _metadata: &Metadata) -> bool {
    use nix::unistd::{AccessFlags, access};

    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(_path: &Path, metadata: &Metadata) -> bool {
    !metadata.permissions().readonly()
}
