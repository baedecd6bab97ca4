/// Default log filter expression used by the worker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Byte threshold gating full-content reads and the edit permission flag.
pub const DEFAULT_SIZE_LIMIT: u64 = 5 * 1024 * 1024;

/// Byte budget for listings embedded in `mstat` replies.
pub const DEFAULT_PREFETCH_BUDGET: usize = 4096;

/// Number of dispatch worker threads.
pub const DEFAULT_WORKERS: usize = 8;

/// Requests that may wait for a free worker before the reader blocks.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Default log filter expression used by the worker.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the worker.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default size limit, in bytes.
pub fn default_size_limit() -> u64 {
    DEFAULT_SIZE_LIMIT
}

/// Default prefetch budget, in bytes.
pub fn default_prefetch_budget() -> usize {
    DEFAULT_PREFETCH_BUDGET
}

/// Default worker count.
pub fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Default queue depth.
pub fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH
}
