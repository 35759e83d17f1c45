//! In-flight and error bookkeeping around asynchronous operations.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::ErrorDetail;

/// Snapshot of a [`Loader`]'s state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    /// True while at least one operation is in flight.
    pub loading: bool,
    /// Message recorded from the most recent failure.
    pub error: Option<String>,
}

/// Tracks `loading` and `error` for one call site.
///
/// Clones share state, so a view can hold one clone and observe the
/// operation another clone is running. Separate loaders are independent.
///
/// # Example
///
/// ```
/// use passgate_core::{Error, Loader};
///
/// # async fn example() {
/// let loader = Loader::new();
/// let value = loader.execute(|| async { Ok::<_, Error>(42) }).await;
/// assert_eq!(value.unwrap(), 42);
/// assert!(!loader.is_loading());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    progress: Arc<Mutex<Progress>>,
}

#[derive(Debug, Default)]
struct Progress {
    in_flight: usize,
    generation: u64,
    error: Option<String>,
}

impl Loader {
    /// Create an idle loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation`, recording in-flight and failure state.
    ///
    /// Failures are recorded and then returned unchanged; the loader never
    /// swallows an error. `loading` stays true until every overlapping
    /// operation has finished, including one whose future is dropped. Only
    /// the most recently started operation records its failure.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorDetail,
    {
        let in_flight = self.begin();

        match operation().await {
            Ok(value) => Ok(value),
            Err(err) => {
                let message = err.user_message();
                let mut progress = self.lock();
                if progress.generation == in_flight.generation {
                    debug!(error = %message, "Operation failed");
                    progress.error = Some(message);
                } else {
                    debug!(error = %message, "Superseded operation failed");
                }
                Err(err)
            }
        }
    }

    /// Returns true while an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    /// Returns the message from the most recent failure.
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> OperationState {
        let progress = self.lock();
        OperationState {
            loading: progress.in_flight > 0,
            error: progress.error.clone(),
        }
    }

    fn begin(&self) -> InFlight<'_> {
        let mut progress = self.lock();
        progress.in_flight += 1;
        progress.generation += 1;
        progress.error = None;
        InFlight {
            loader: self,
            generation: progress.generation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts one operation as in flight until dropped.
struct InFlight<'a> {
    loader: &'a Loader,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut progress = self.loader.lock();
        progress.in_flight = progress.in_flight.saturating_sub(1);
    }
}
