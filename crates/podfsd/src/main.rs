use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use podfsd::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let worker = match bootstrap_with(&SystemConfigLoader, reporter) {
        Ok(worker) => worker,
        Err(error) => return report_failure(&error),
    };

    match worker.serve(io::stdin().lock(), io::stdout()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => report_failure(&error),
    }
}

fn report_failure(error: &dyn std::error::Error) -> ExitCode {
    // Nothing useful remains to be done if stderr itself is gone.
    let _ = writeln!(io::stderr(), "podfsd: {error}");
    ExitCode::FAILURE
}
