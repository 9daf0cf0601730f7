//! Extraction with bounded retry, backoff and synthetic fallback.

pub mod extractor;
pub mod policy;
pub mod sleeper;

pub use extractor::{Extractor, DEFAULT_HISTORY_DAYS};
pub use policy::{uniform_between, RetryPolicy};
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};
