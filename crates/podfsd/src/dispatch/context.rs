//! Shared state handed to every command invocation.

use podfs_config::Config;

use crate::workdir::WorkingDirectory;

/// Tunables and process-wide state visible to commands.
#[derive(Debug, Clone)]
pub struct CommandContext {
    size_limit: u64,
    prefetch_budget: usize,
    workdir: WorkingDirectory,
}

impl CommandContext {
    /// Builds a context from explicit limits.
    pub fn new(size_limit: u64, prefetch_budget: usize, workdir: WorkingDirectory) -> Self {
        Self {
            size_limit,
            prefetch_budget,
            workdir,
        }
    }

    /// Builds a context from the loaded configuration.
    pub fn from_config(config: &Config, workdir: WorkingDirectory) -> Self {
        Self::new(config.size_limit(), config.prefetch_budget(), workdir)
    }

    /// Byte threshold for full reads and the edit permission flag.
    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// Byte budget for `mstat` prefetch listings.
    pub fn prefetch_budget(&self) -> usize {
        self.prefetch_budget
    }

    /// Base directory for relative paths.
    pub fn workdir(&self) -> &WorkingDirectory {
        &self.workdir
    }
}
