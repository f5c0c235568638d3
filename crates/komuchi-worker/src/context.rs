//! Job handler context trait
//!
//! The worker holds a weak reference to the context and calls `dispatch_job`
//! when processing a claimed job; the implementation matches on job type and
//! invokes the appropriate handler. The weak reference means a dropped
//! context (shutdown) stops dispatch instead of keeping the state alive.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use komuchi_core::models::Job;

/// Context for job dispatch.
#[async_trait]
pub trait JobHandlerContext: Send + Sync {
    /// Dispatch a job to the appropriate handler.
    async fn dispatch_job(self: Arc<Self>, job: &Job) -> Result<()>;
}
