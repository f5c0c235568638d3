//! Recoverability wrapper for background job failures.
//!
//! Job handlers return `anyhow::Result`; wrapping an error in [`JobError`] lets the
//! queue distinguish failures worth retrying (provider timeouts, transient storage
//! errors) from ones that will never succeed (missing transcript, bad configuration).
//! Errors that are not a `JobError` are treated as recoverable.

use std::fmt;

/// An error from a job handler carrying an explicit recoverability flag.
#[derive(Debug)]
pub struct JobError {
    recoverable: bool,
    source: anyhow::Error,
}

impl JobError {
    /// Wrap an error that may succeed on retry.
    pub fn recoverable(source: anyhow::Error) -> Self {
        Self {
            recoverable: true,
            source,
        }
    }

    /// Wrap an error that will never succeed on retry.
    pub fn unrecoverable(source: anyhow::Error) -> Self {
        Self {
            recoverable: false,
            source,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Extension methods for marking job results recoverable or not.
pub trait JobResultExt<T> {
    /// Mark any error in this result as recoverable.
    fn recoverable(self) -> anyhow::Result<T>;

    /// Mark any error in this result as unrecoverable.
    fn unrecoverable(self) -> anyhow::Result<T>;
}

impl<T> JobResultExt<T> for anyhow::Result<T> {
    fn recoverable(self) -> anyhow::Result<T> {
        self.map_err(|e| JobError::recoverable(e).into())
    }

    fn unrecoverable(self) -> anyhow::Result<T> {
        self.map_err(|e| JobError::unrecoverable(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_reports_recoverability() {
        let err = JobError::recoverable(anyhow::anyhow!("network"));
        assert!(err.is_recoverable());

        let err = JobError::unrecoverable(anyhow::anyhow!("missing transcript"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn downcasts_through_anyhow() {
        let err: anyhow::Error = JobError::unrecoverable(anyhow::anyhow!("bad config")).into();
        let flag = err
            .downcast_ref::<JobError>()
            .map(|e| e.is_recoverable())
            .unwrap_or(true);
        assert!(!flag);
    }

    #[test]
    fn result_ext_marks_errors() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("boom"));
        let err = result.unrecoverable().unwrap_err();
        assert!(err.downcast_ref::<JobError>().is_some());

        let ok: anyhow::Result<i32> = Ok(7);
        assert_eq!(ok.recoverable().unwrap(), 7);
    }

    #[test]
    fn display_shows_underlying_message() {
        let err = JobError::recoverable(anyhow::anyhow!("provider timeout"));
        assert_eq!(err.to_string(), "provider timeout");
    }
}
