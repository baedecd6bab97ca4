//! Tree-shaping commands: `mkdirs`, `rm`, `mv`, `cp`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::dispatch::{Command, CommandContext, DispatchError, Reply};

use super::COMMANDS_TARGET;
use super::PathArgs;

/// Arguments for `rm`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveArgs {
    /// Path to remove.
    pub p: PathBuf,
    /// Allow removing non-empty directories.
    #[serde(default)]
    pub recursive: bool,
}

/// Arguments for `mv` and `cp`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferArgs {
    /// Source path.
    pub src: PathBuf,
    /// Destination path.
    pub dst: PathBuf,
}

/// `mkdirs` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct MakeDirectories;

impl Command for MakeDirectories {
    const NAME: &'static str = "mkdirs";
    type Args = PathArgs;

    fn execute(&self, args: PathArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let path = context.workdir().resolve(&args.p);
        fs::create_dir_all(&path).map_err(DispatchError::at(&path))?;
        Ok(Reply::new())
    }
}

/// `rm` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemovePath;

impl Command for RemovePath {
    const NAME: &'static str = "rm";
    type Args = RemoveArgs;

    fn execute(&self, args: RemoveArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let path = context.workdir().resolve(&args.p);
        let metadata = fs::symlink_metadata(&path).map_err(DispatchError::at(&path))?;
        let outcome = if !metadata.is_dir() {
            fs::remove_file(&path)
        } else if args.recursive {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_dir(&path)
        };
        outcome.map_err(DispatchError::at(&path))?;
        Ok(Reply::new())
    }
}

/// `mv` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovePath;

impl Command for MovePath {
    const NAME: &'static str = "mv";
    type Args = TransferArgs;

    fn execute(
        &self,
        args: TransferArgs,
        context: &CommandContext,
    ) -> Result<Reply, DispatchError> {
        let workdir = context.workdir();
        let src = workdir.resolve(&args.src);
        let dst = workdir.resolve(&args.dst);

        match fs::rename(&src, &dst) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
                debug!(
                    target: COMMANDS_TARGET,
                    src = %src.display(),
                    dst = %dst.display(),
                    "rename crosses devices, copying instead"
                );
                move_by_copy(&src, &dst)?;
            }
            Err(error) => return Err(DispatchError::at(&src)(error)),
        }
        Ok(Reply::new())
    }
}

/// `cp` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyPath;

impl Command for CopyPath {
    const NAME: &'static str = "cp";
    type Args = TransferArgs;

    fn execute(
        &self,
        args: TransferArgs,
        context: &CommandContext,
    ) -> Result<Reply, DispatchError> {
        let workdir = context.workdir();
        let src = workdir.resolve(&args.src);
        let dst = workdir.resolve(&args.dst);

        let metadata = fs::metadata(&src).map_err(DispatchError::at(&src))?;
        if metadata.is_dir() {
            copy_tree(&src, &dst)?;
        } else {
            copy_file(&src, &dst)?;
        }
        Ok(Reply::new())
    }
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), DispatchError> {
    let target = match src.file_name() {
        Some(name) if dst.is_dir() => dst.join(name),
        _ => dst.to_path_buf(),
    };
    fs::copy(src, &target).map_err(DispatchError::at(&target))?;
    Ok(())
}

/// Copies the contents of `src` into `dst`, creating or merging directories
/// and recreating symlinks rather than following them.
fn copy_tree(src: &Path, dst: &Path) -> Result<(), DispatchError> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|error| {
            let path = error.path().unwrap_or(src).to_path_buf();
            DispatchError::at(&path)(io::Error::from(error))
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|error| DispatchError::internal(error.to_string()))?;
        let target = dst.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(DispatchError::at(&target))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(DispatchError::at(&target))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), DispatchError> {
    let destination = fs::read_link(link).map_err(DispatchError::at(link))?;
    if fs::symlink_metadata(target).is_ok_and(|existing| !existing.is_dir()) {
        fs::remove_file(target).map_err(DispatchError::at(target))?;
    }
    std::os::unix::fs::symlink(destination, target).map_err(DispatchError::at(target))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), DispatchError> {
    fs::copy(link, target)
        .map(drop)
        .map_err(DispatchError::at(target))
}

fn move_by_copy(src: &Path, dst: &Path) -> Result<(), DispatchError> {
    let metadata = fs::symlink_metadata(src).map_err(DispatchError::at(src))?;
    if metadata.is_dir() {
        copy_tree(src, dst)?;
        fs::remove_dir_all(src).map_err(DispatchError::at(src))
    } else if metadata.is_symlink() {
        copy_symlink(src, dst)?;
        fs::remove_file(src).map_err(DispatchError::at(src))
    } else {
        fs::copy(src, dst).map_err(DispatchError::at(dst))?;
        fs::remove_file(src).map_err(DispatchError::at(src))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;
    use crate::workdir::WorkingDirectory;

    struct Sandbox {
        dir: TempDir,
        context: CommandContext,
    }

    impl Sandbox {
        fn path(&self, relative: &str) -> PathBuf {
            self.dir.path().join(relative)
        }

        fn transfer(src: &str, dst: &str) -> TransferArgs {
            TransferArgs {
                src: src.into(),
                dst: dst.into(),
            }
        }
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let dir = TempDir::new().expect("temp dir");
        let context = CommandContext::new(1024, 4096, WorkingDirectory::new(dir.path()));
        Sandbox { dir, context }
    }

    #[rstest]
    fn mkdirs_creates_parents_and_tolerates_existing(sandbox: Sandbox) {
        let args = PathArgs { p: "a/b/c".into() };
        MakeDirectories
            .execute(args.clone(), &sandbox.context)
            .expect("first mkdirs");
        MakeDirectories
            .execute(args, &sandbox.context)
            .expect("repeat mkdirs");
        assert!(sandbox.path("a/b/c").is_dir());
    }

    #[rstest]
    #[case::plain(false, false)]
    #[case::recursive(true, true)]
    fn rm_non_empty_directory(sandbox: Sandbox, #[case] recursive: bool, #[case] removed: bool) {
        fs::create_dir_all(sandbox.path("d/inner")).expect("mkdir");
        let outcome = RemovePath.execute(
            RemoveArgs {
                p: "d".into(),
                recursive,
            },
            &sandbox.context,
        );
        assert_eq!(outcome.is_ok(), removed);
        assert_eq!(!sandbox.path("d").exists(), removed);
    }

    #[rstest]
    fn rm_file_and_empty_directory(sandbox: Sandbox) {
        fs::write(sandbox.path("f"), b"x").expect("write");
        fs::create_dir(sandbox.path("empty")).expect("mkdir");
        for name in ["f", "empty"] {
            RemovePath
                .execute(
                    RemoveArgs {
                        p: name.into(),
                        recursive: false,
                    },
                    &sandbox.context,
                )
                .expect("remove");
            assert!(!sandbox.path(name).exists());
        }
    }

    #[cfg(unix)]
    #[rstest]
    fn rm_symlink_leaves_target(sandbox: Sandbox) {
        fs::create_dir(sandbox.path("target")).expect("mkdir");
        fs::write(sandbox.path("target/keep"), b"x").expect("write");
        std::os::unix::fs::symlink(sandbox.path("target"), sandbox.path("link")).expect("symlink");
        RemovePath
            .execute(
                RemoveArgs {
                    p: "link".into(),
                    recursive: true,
                },
                &sandbox.context,
            )
            .expect("remove link");
        assert!(sandbox.path("target/keep").exists());
    }

    #[rstest]
    fn mv_renames(sandbox: Sandbox) {
        fs::write(sandbox.path("a"), b"payload").expect("write");
        MovePath
            .execute(Sandbox::transfer("a", "b"), &sandbox.context)
            .expect("move");
        assert!(!sandbox.path("a").exists());
        assert_eq!(fs::read(sandbox.path("b")).expect("read"), b"payload");
    }

    #[rstest]
    fn mv_missing_source_fails(sandbox: Sandbox) {
        let error = MovePath
            .execute(Sandbox::transfer("absent", "b"), &sandbox.context)
            .expect_err("missing source");
        assert!(error.to_string().contains("absent"));
    }

    #[rstest]
    fn move_by_copy_handles_directories(sandbox: Sandbox) {
        fs::create_dir_all(sandbox.path("src/nested")).expect("mkdir");
        fs::write(sandbox.path("src/nested/f"), b"x").expect("write");
        move_by_copy(&sandbox.path("src"), &sandbox.path("dst")).expect("move");
        assert!(!sandbox.path("src").exists());
        assert!(sandbox.path("dst/nested/f").is_file());
    }

    #[rstest]
    fn cp_file_into_directory(sandbox: Sandbox) {
        fs::write(sandbox.path("f.txt"), b"x").expect("write");
        fs::create_dir(sandbox.path("out")).expect("mkdir");
        CopyPath
            .execute(Sandbox::transfer("f.txt", "out"), &sandbox.context)
            .expect("copy");
        assert!(sandbox.path("out/f.txt").is_file());
        assert!(sandbox.path("f.txt").is_file());
    }

    #[rstest]
    fn cp_directory_merges_into_existing(sandbox: Sandbox) {
        fs::create_dir_all(sandbox.path("src/sub")).expect("mkdir");
        fs::write(sandbox.path("src/sub/new"), b"new").expect("write");
        fs::create_dir_all(sandbox.path("dst/sub")).expect("mkdir");
        fs::write(sandbox.path("dst/sub/old"), b"old").expect("write");

        CopyPath
            .execute(Sandbox::transfer("src", "dst"), &sandbox.context)
            .expect("copy tree");
        assert_eq!(fs::read(sandbox.path("dst/sub/new")).expect("read"), b"new");
        assert_eq!(fs::read(sandbox.path("dst/sub/old")).expect("read"), b"old");
    }

    #[cfg(unix)]
    #[rstest]
    fn cp_directory_preserves_symlinks(sandbox: Sandbox) {
        fs::create_dir(sandbox.path("src")).expect("mkdir");
        fs::write(sandbox.path("src/real"), b"x").expect("write");
        std::os::unix::fs::symlink("real", sandbox.path("src/alias")).expect("symlink");

        CopyPath
            .execute(Sandbox::transfer("src", "dst"), &sandbox.context)
            .expect("copy tree");
        let copied = fs::symlink_metadata(sandbox.path("dst/alias")).expect("lstat");
        assert!(copied.file_type().is_symlink());
        assert_eq!(
            fs::read_link(sandbox.path("dst/alias")).expect("readlink"),
            PathBuf::from("real")
        );
    }
}
