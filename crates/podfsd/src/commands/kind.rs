//! Entry kind bitmask shared by `ls` and `mstat`.

use std::fs::{self, FileType};
use std::io;
use std::ops::BitOr;
use std::path::Path;

use serde::Serialize;

/// Bit-flag encoding of a filesystem entry type.
///
/// A symlink carries [`EntryKind::SYMLINK`] together with the kind of its
/// target; a dangling link is just [`EntryKind::SYMLINK`]. Entries that are
/// neither files nor directories (sockets, FIFOs, devices) report
/// [`EntryKind::UNKNOWN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryKind(u8);

impl EntryKind {
    pub const UNKNOWN: Self = Self(0);
    pub const FILE: Self = Self(1);
    pub const DIRECTORY: Self = Self(2);
    pub const SYMLINK: Self = Self(64);

    /// Raw bitmask value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Classifies `path` without requiring the symlink target to exist.
    pub fn of(path: &Path) -> io::Result<Self> {
        let link = fs::symlink_metadata(path)?;
        Ok(Self::classify(link.file_type(), path))
    }

    /// Classifies an entry whose (unfollowed) file type is already known.
    pub fn classify(file_type: FileType, path: &Path) -> Self {
        if file_type.is_symlink() {
            let target = fs::metadata(path).map_or(Self::UNKNOWN, |metadata| {
                Self::from_file_type(metadata.file_type())
            });
            Self::SYMLINK | target
        } else {
            Self::from_file_type(file_type)
        }
    }

    fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_dir() {
            Self::DIRECTORY
        } else if file_type.is_file() {
            Self::FILE
        } else {
            Self::UNKNOWN
        }
    }
}

impl BitOr for EntryKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
