//! Per-call cancellation and deadline.
//!
//! The driver checks the context before each backend call, never during
//! one: cancellation takes effect at the next call boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use docstore_core::{Error, Result};

/// Cancellation flag plus optional deadline, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that never expires until cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once [`Context::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Ok` while the next backend call may proceed.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] after cancellation, [`Error::DeadlineExceeded`]
    /// once the deadline has passed. Cancellation wins when both apply.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_expires() {
        assert!(Context::background().check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check(), Err(Error::Cancelled));
    }

    #[test]
    fn test_past_deadline() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.check(), Err(Error::DeadlineExceeded));
    }

    #[test]
    fn test_future_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_some());
    }

    #[test]
    fn test_cancel_wins_over_deadline() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        ctx.cancel();
        assert_eq!(ctx.check(), Err(Error::Cancelled));
    }
}
