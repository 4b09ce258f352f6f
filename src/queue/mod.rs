//! Rate-limited, deduplicating work queue used by agent workers.

mod rate_limiter;
mod work_queue;

pub use rate_limiter::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, RateLimiter};
pub use work_queue::{DoneGuard, WorkQueue};
