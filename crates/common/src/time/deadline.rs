//! Racing a future against a deadline
//!
//! Network calls are bounded by racing them against a timer: whichever settles
//! first wins. When the timer wins the operation future is dropped. Dropping is
//! the only cancellation offered, so whether the underlying transport actually
//! stops work is up to the transport.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Result of [`race_deadline`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineOutcome<T> {
    /// The operation settled before the deadline
    Completed(T),
    /// The deadline fired first; the operation's result is discarded
    Elapsed(Duration),
}

impl<T> DeadlineOutcome<T> {
    /// Returns `true` if the deadline fired first
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }

    /// Convert into a `Result`, mapping an elapsed deadline with `on_elapsed`
    pub fn into_result<E>(self, on_elapsed: impl FnOnce(Duration) -> E) -> Result<T, E> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Elapsed(limit) => Err(on_elapsed(limit)),
        }
    }
}

/// Race `operation` against a deadline `limit` from now
///
/// The operation is polled first on every wake-up, so a result that is
/// ready at the same instant as the deadline still counts as completed.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// use tidepool_common::time::{race_deadline, DeadlineOutcome};
///
/// let outcome = race_deadline(async { 7 }, Duration::from_secs(1)).await;
/// assert_eq!(outcome, DeadlineOutcome::Completed(7));
/// ```
pub async fn race_deadline<F>(operation: F, limit: Duration) -> DeadlineOutcome<F::Output>
where
    F: Future,
{
    let deadline = sleep(limit);
    tokio::pin!(deadline);
    tokio::pin!(operation);

    tokio::select! {
        biased;
        output = &mut operation => DeadlineOutcome::Completed(output),
        () = &mut deadline => DeadlineOutcome::Elapsed(limit),
    }
}
