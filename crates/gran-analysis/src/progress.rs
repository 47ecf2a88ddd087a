//! Per-step progress reporting and cooperative cancellation.
//!
//! The curve computer calls [`Progress::step`] once per operator
//! application and then checks [`Progress::is_cancelled`]. Any
//! `Fn(&StepProgress)` closure is a progress sink.
//!
//! ```rust
//! use gran_analysis::progress::{CancelToken, Progress, StepProgress};
//!
//! let token = CancelToken::new();
//! let sink = token.wrap(|p: &StepProgress<'_>| println!("{} {}/{}", p.label, p.step, p.total));
//! assert!(!sink.is_cancelled());
//! token.cancel();
//! assert!(sink.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress of one curve computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepProgress<'a> {
    /// Label of the image being processed.
    pub label: &'a str,
    /// Reported (calibrated) size of this step.
    pub size: f64,
    /// 1-based index of the step.
    pub step: usize,
    /// Number of steps of the curve.
    pub total: usize,
}

/// Progress sink injected into curve and batch computations.
pub trait Progress: Send + Sync {
    /// Called after each operator application.
    fn step(&self, progress: &StepProgress<'_>);

    /// Polled after each step; `true` aborts the run.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> Progress for F
where
    F: Fn(&StepProgress<'_>) + Send + Sync,
{
    fn step(&self, progress: &StepProgress<'_>) {
        self(progress)
    }
}

/// Progress sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn step(&self, _progress: &StepProgress<'_>) {}
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Wraps a sink so it reports this token's state.
    pub fn wrap<P: Progress>(&self, inner: P) -> Cancellable<P> {
        Cancellable {
            inner,
            token: self.clone(),
        }
    }
}

/// Sink forwarding to an inner sink, cancelled through a [`CancelToken`].
#[derive(Debug, Clone)]
pub struct Cancellable<P> {
    inner: P,
    token: CancelToken,
}

impl<P: Progress> Progress for Cancellable<P> {
    fn step(&self, progress: &StepProgress<'_>) {
        self.inner.step(progress)
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.inner.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: &StepProgress<'_>| seen.lock().unwrap().push((p.step, p.total));
        sink.step(&StepProgress {
            label: "a",
            size: 3.0,
            step: 1,
            total: 2,
        });
        assert!(!sink.is_cancelled());
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2)]);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let sink = token.clone().wrap(NoProgress);
        assert!(!sink.is_cancelled());
        token.cancel();
        assert!(sink.is_cancelled());
    }
}
