//! Cancellation token passed to health-check and shutdown hooks.
//!
//! Tokens combine an explicit cancel flag, an optional deadline and an
//! optional parent. A token reports cancelled as soon as any of the three
//! says so. Hooks are expected to observe the token cooperatively; the
//! runtime never interrupts a running hook.

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::{Duration, Instant};

/// A token that can be used to signal cancellation to lifecycle hooks.
///
/// # Examples
///
/// ```
/// use ferrous_injector::CancellationToken;
/// use std::time::Duration;
///
/// let parent = CancellationToken::new();
/// let child = parent.child_with_timeout(Duration::from_secs(30));
///
/// assert!(!child.is_cancelled());
/// assert!(child.remaining().unwrap() <= Duration::from_secs(30));
///
/// parent.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
    deadline: Option<Instant>,
    created_at: Instant,
}

impl CancellationToken {
    /// Creates a new cancellation token without a deadline.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Creates a token that reports cancelled once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(None, Instant::now().checked_add(timeout))
    }

    /// Creates a token with an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(None, Some(deadline))
    }

    fn build(parent: Option<CancellationToken>, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                parent,
                deadline,
                created_at: Instant::now(),
            }),
        }
    }

    /// Creates a child token that is cancelled when either this token or the
    /// child itself is cancelled.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_injector::CancellationToken;
    ///
    /// let parent_token = CancellationToken::new();
    /// let child_token = parent_token.child_token();
    ///
    /// parent_token.cancel();
    /// assert!(child_token.is_cancelled());
    /// ```
    pub fn child_token(&self) -> Self {
        Self::build(Some(self.clone()), None)
    }

    /// Creates a child token that additionally expires after `timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Self::build(Some(self.clone()), Instant::now().checked_add(timeout))
    }

    /// Cancels the token, signaling that associated operations should stop.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if cancellation has been requested or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }

        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }

        if let Some(ref parent) = self.inner.parent {
            return parent.is_cancelled();
        }

        false
    }

    /// Earliest deadline of this token and its ancestors.
    pub fn deadline(&self) -> Option<Instant> {
        let parent = self.inner.parent.as_ref().and_then(|p| p.deadline());
        match (self.inner.deadline, parent) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Time left before the effective deadline, `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns an error if the token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Err` with a cancellation message if the token is cancelled.
    pub fn throw_if_cancelled(&self) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            Err(CancellationError::new("Operation was cancelled"))
        } else {
            Ok(())
        }
    }

    /// Returns a future that completes when cancellation is requested or the
    /// deadline passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_injector::CancellationToken;
    ///
    /// # async fn example() {
    /// let token = CancellationToken::new();
    ///
    /// # #[cfg(feature = "async")]
    /// tokio::select! {
    ///     _ = some_operation() => {}
    ///     _ = token.cancelled() => {}
    /// }
    /// # }
    ///
    /// # async fn some_operation() {}
    /// ```
    #[cfg(feature = "async")]
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }

            // Small delay to avoid busy waiting
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Returns the elapsed time since this token was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline())
            .finish()
    }
}

/// Error type for cancellation operations.
#[derive(Debug, Clone)]
pub struct CancellationError {
    message: String,
}

impl CancellationError {
    /// Creates a new cancellation error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CancellationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cancellation error: {}", self.message)
    }
}

impl std::error::Error for CancellationError {}
