//! Single-flight memo cell
//!
//! Every memoized value in the repository (a page record, the full entry
//! enumeration, the slug maps) lives in a `SingleFlight<T>`. The first caller
//! spawns the computation; every other caller, concurrent or later, awaits
//! the same shared future and sees the same value or the same error.
//!
//! # Guarantees
//!
//! - The initializer runs at most once per cell.
//! - Failures are terminal: there is no reset, a failed cell stays failed.
//! - The computation runs on a spawned task, so it completes even if every
//!   caller stops waiting.
//!
//! # Examples
//!
//! ```rust
//! use folio_core::utils::SingleFlight;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), folio_core::ContentError> {
//! let cell: SingleFlight<u32> = SingleFlight::new();
//! let first = cell.get_or_init(|| async { Ok(7) }).await?;
//! let second = cell.get_or_init(|| async { Ok(8) }).await?;
//! assert_eq!((*first, *second), (7, 7));
//! # Ok(())
//! # }
//! ```

use crate::error::ContentError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

type Flight<T> = Shared<BoxFuture<'static, Result<Arc<T>, ContentError>>>;

/// Observable state of a `SingleFlight` cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
    /// Nothing requested yet
    Idle,
    /// Computation started, not finished
    InFlight,
    /// Resolved with a value
    Ready,
    /// Resolved with an error
    Failed,
}

/// Mutex-guarded slot holding at most one shared computation
pub struct SingleFlight<T> {
    slot: Mutex<Option<Flight<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> std::fmt::Debug for SingleFlight<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("state", &self.state())
            .finish()
    }
}

impl<T> SingleFlight<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the memoized value, starting the computation on first use
    ///
    /// `init` is only called by the first caller; its future is spawned on
    /// the current tokio runtime.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<T>, ContentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ContentError>> + Send + 'static,
    {
        let flight = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    let task = tokio::spawn(init());
                    let flight = async move {
                        match task.await {
                            Ok(result) => result.map(Arc::new),
                            Err(join_error) => {
                                Err(ContentError::task_failed(join_error.to_string()))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Current state of the cell
    pub fn state(&self) -> FlightState {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            None => FlightState::Idle,
            Some(flight) => match flight.peek() {
                None => FlightState::InFlight,
                Some(Ok(_)) => FlightState::Ready,
                Some(Err(_)) => FlightState::Failed,
            },
        }
    }

    /// The resolved value, if the computation already succeeded
    ///
    /// Note that a finished task is only observed as resolved once some
    /// caller has awaited the shared future.
    pub fn peek(&self) -> Option<Arc<T>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref()?.peek()? {
            Ok(value) => Some(Arc::clone(value)),
            Err(_) => None,
        }
    }
}
