//! Request-scoped context.
//!
//! A `RequestContext` carries the caller's identity, deadline, cancellation
//! flag and trace id. The binder and resolver forward it by reference to the
//! catalog and the persistence engine without inspecting it; collaborators
//! decide what to do with a deadline or a cancelled request.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide counter used to derive trace ids when the caller supplies none.
static NEXT_TRACE: AtomicU64 = AtomicU64::new(1);

/// A shared cancellation flag.
///
/// Clones observe the same flag, so a caller can keep one clone and cancel
/// a request that is running on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a new, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once `cancel` has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Opaque request-scoped carrier.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Option<String>,
    trace_id: String,
    deadline: Option<Instant>,
    cancellation: CancellationFlag,
}

impl RequestContext {
    /// Creates a context with no identity, no deadline and a generated trace id.
    #[must_use]
    pub fn new() -> Self {
        let seq = NEXT_TRACE.fetch_add(1, Ordering::Relaxed);
        Self {
            identity: None,
            trace_id: format!("req-{seq:016x}"),
            deadline: None,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Sets the authenticated identity of the caller.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Sets the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Uses an existing cancellation flag.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Returns the caller identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Returns the trace id.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation flag.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Cancels the request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns true if the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
