//! Classification job and rate limiting constants
//!
//! Defaults for the retry policy of queued classification jobs and for the
//! shared completion-API rate limiter. All of them can be overridden through
//! `RetryPolicy` and `LimiterConfig`.

use std::time::Duration;

/// Maximum attempts for one classification job
pub const JOB_MAX_ATTEMPTS: u32 = 3;

/// Waits between failed job attempts; the last entry repeats
pub const JOB_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

/// Budget for a single job attempt
pub const JOB_TIMEOUT: Duration = Duration::from_secs(120);

/// Limiter key shared by everything that calls the completion API
pub const RATE_LIMIT_KEY: &str = "openai_classification";

/// Requests per window when nothing else is configured
pub const DEFAULT_RATE_LIMIT: u32 = 30;

/// Window length when nothing else is configured
pub const DEFAULT_DECAY_MINUTES: u32 = 1;

/// Window of the `--rate-limit` option of bulk runs, which is per minute
pub const BULK_WINDOW_MINUTES: u32 = 1;

/// Growth factor of the advisory backoff delay per attempt
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Cap on the advisory backoff delay
pub const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);
