//! `b64read` and `b64write`: whole-file content transfer.
//!
//! Reads are capped by the configured size limit. An oversized file is not
//! opened at all; the reply instead carries a short notice, encoded the same
//! way real content would be, so the client can display it in place of the
//! file. Writes are not capped.

use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::{Command, CommandContext, DispatchError, Reply, into_reply};

use super::COMMANDS_TARGET;
use super::PathArgs;

const BYTES_PER_MIB: f64 = 1_048_576.0;

#[derive(Debug, Serialize)]
struct ReadReply {
    b64: String,
}

#[derive(Debug, Serialize)]
struct WriteReply {
    nb: usize,
}

/// Arguments for `b64write`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteArgs {
    /// Target file.
    pub p: PathBuf,
    /// Base64 (standard alphabet) file contents.
    pub contents: String,
}

/// `b64read` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadContent;

impl Command for ReadContent {
    const NAME: &'static str = "b64read";
    type Args = PathArgs;

    fn execute(&self, args: PathArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let path = context.workdir().resolve(&args.p);
        let size = fs::metadata(&path)
            .map_err(DispatchError::at(&path))?
            .len();

        let bytes = if size > context.size_limit() {
            debug!(
                target: COMMANDS_TARGET,
                path = %path.display(),
                size,
                limit = context.size_limit(),
                "refusing oversized read"
            );
            oversize_notice(context.size_limit(), size).into_bytes()
        } else {
            fs::read(&path).map_err(DispatchError::at(&path))?
        };

        into_reply(&ReadReply {
            b64: STANDARD.encode(bytes),
        })
    }
}

/// `b64write` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteContent;

impl Command for WriteContent {
    const NAME: &'static str = "b64write";
    type Args = WriteArgs;

    fn execute(&self, args: WriteArgs, context: &CommandContext) -> Result<Reply, DispatchError> {
        let bytes = STANDARD
            .decode(args.contents.as_bytes())
            .map_err(|error| DispatchError::invalid_arguments(Self::NAME, error.to_string()))?;
        let path = context.workdir().resolve(&args.p);
        fs::write(&path, &bytes).map_err(DispatchError::at(&path))?;
        into_reply(&WriteReply { nb: bytes.len() })
    }
}

/// Placeholder text returned instead of an oversized file's content.
pub fn oversize_notice(limit: u64, size: u64) -> String {
    format!(
        "File too large to open (limit {:.1} MB, file is {:.1} MB).\n",
        mebibytes(limit),
        mebibytes(size)
    )
}

fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
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

    #[fixture]
    fn sandbox() -> Sandbox {
        let dir = TempDir::new().expect("temp dir");
        let context = CommandContext::new(16, 4096, WorkingDirectory::new(dir.path()));
        Sandbox { dir, context }
    }

    fn read(sandbox: &Sandbox, name: &str) -> Vec<u8> {
        let reply = ReadContent
            .execute(PathArgs { p: name.into() }, &sandbox.context)
            .expect("read");
        let encoded = reply["b64"].as_str().expect("b64 string");
        STANDARD.decode(encoded).expect("valid base64")
    }

    #[rstest]
    #[case(5 * 1_048_576, 6 * 1_048_576 + 209_716, "limit 5.0 MB, file is 6.2 MB")]
    #[case(1_048_576, 1_572_864, "limit 1.0 MB, file is 1.5 MB")]
    fn notice_reports_mebibytes(#[case] limit: u64, #[case] size: u64, #[case] fragment: &str) {
        let notice = oversize_notice(limit, size);
        assert!(notice.contains(fragment), "{notice}");
        assert!(notice.ends_with(").\n"));
    }

    #[rstest]
    fn write_then_read_returns_content(sandbox: Sandbox) {
        let reply = WriteContent
            .execute(
                WriteArgs {
                    p: "hi.txt".into(),
                    contents: STANDARD.encode("hi"),
                },
                &sandbox.context,
            )
            .expect("write");
        assert_eq!(reply["nb"], 2);
        assert_eq!(read(&sandbox, "hi.txt"), b"hi");
    }

    #[rstest]
    fn oversized_read_returns_notice(sandbox: Sandbox) {
        fs::write(sandbox.dir.path().join("big"), [0_u8; 17]).expect("write");
        let decoded = String::from_utf8(read(&sandbox, "big")).expect("utf-8 notice");
        assert_eq!(decoded, oversize_notice(16, 17));
    }

    #[rstest]
    fn writes_are_not_capped(sandbox: Sandbox) {
        let payload = vec![b'x'; 64];
        WriteContent
            .execute(
                WriteArgs {
                    p: "large".into(),
                    contents: STANDARD.encode(&payload),
                },
                &sandbox.context,
            )
            .expect("write");
        let written = fs::read(sandbox.dir.path().join("large")).expect("read back");
        assert_eq!(written, payload);
    }

    #[rstest]
    fn invalid_base64_is_rejected(sandbox: Sandbox) {
        let error = WriteContent
            .execute(
                WriteArgs {
                    p: "x".into(),
                    contents: "not base64!".to_owned(),
                },
                &sandbox.context,
            )
            .expect_err("invalid base64");
        assert!(matches!(error, DispatchError::InvalidArguments { .. }));
        assert!(!sandbox.dir.path().join("x").exists());
    }

    #[rstest]
    fn write_into_missing_directory_fails(sandbox: Sandbox) {
        let error = WriteContent
            .execute(
                WriteArgs {
                    p: "absent/x".into(),
                    contents: STANDARD.encode("x"),
                },
                &sandbox.context,
            )
            .expect_err("parent missing");
        assert!(matches!(error, DispatchError::OperationFailure { .. }));
    }
}
