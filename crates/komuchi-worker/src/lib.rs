//! Komuchi Worker
//!
//! Background job infrastructure: a Postgres-backed queue with LISTEN/NOTIFY
//! wakeups, a bounded worker pool, retry with exponential backoff, stale job
//! reaping, and the transcription/debrief pipeline handlers.

pub mod context;
pub mod handlers;
pub mod queue;

pub use context::JobHandlerContext;
pub use handlers::JobContext;
pub use queue::{JobQueue, JobQueueConfig, JOB_NOTIFY_CHANNEL, MAX_RETRY_BACKOFF_SECS};
