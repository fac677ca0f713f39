//! Memo cells backing the lazily-derived preview values.
//!
//! [`SingleFlight`] guarantees that one underlying operation serves every
//! concurrent caller. [`MemoSlot`] is the cheaper best-effort cell: racing
//! first calls may each fetch, and the last writer wins.

use crate::error::{PreviewError, PreviewResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

/// Runs `fut` until it completes or `cancel` fires.
pub(crate) async fn cancellable<T, F>(fut: F, cancel: &CancellationToken) -> PreviewResult<T>
where
    F: Future<Output = PreviewResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PreviewError::Cancelled),
        result = fut => result,
    }
}

type Flight<T> = Shared<BoxFuture<'static, PreviewResult<T>>>;

enum FlightState<T> {
    Empty,
    Pending { id: u64, flight: Flight<T> },
    Resolved(T),
}

/// Single-flight memo: `Empty -> Pending -> Resolved`, with failed flights
/// returning to `Empty` so the next caller retries.
pub struct SingleFlight<T: Clone> {
    state: Mutex<FlightState<T>>,
    next_id: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Empty),
            next_id: AtomicU64::new(0),
        }
    }

    /// A cell that starts out resolved and never runs a flight.
    pub fn resolved(value: T) -> Self {
        Self {
            state: Mutex::new(FlightState::Resolved(value)),
            next_id: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlightState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> Option<T> {
        match &*self.lock() {
            FlightState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(&*self.lock(), FlightState::Pending { .. })
    }

    /// Returns the memoized value, joins the flight in progress, or starts a
    /// new one with `start`.
    ///
    /// `cancel` only stops this caller from waiting. Cancelling the flight
    /// itself is up to the future built by `start`, and is then observed by
    /// every waiter.
    pub async fn run<F>(&self, start: F, cancel: &CancellationToken) -> PreviewResult<T>
    where
        F: FnOnce() -> BoxFuture<'static, PreviewResult<T>>,
    {
        let (id, flight) = {
            let mut state = self.lock();
            match &*state {
                FlightState::Resolved(value) => return Ok(value.clone()),
                FlightState::Pending { id, flight } => (*id, flight.clone()),
                FlightState::Empty => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let flight = start().shared();
                    *state = FlightState::Pending {
                        id,
                        flight: flight.clone(),
                    };
                    (id, flight)
                }
            }
        };

        let result = tokio::select! {
            biased;
            result = flight => result,
            _ = cancel.cancelled() => return Err(PreviewError::Cancelled),
        };

        self.settle(id, &result);
        result
    }

    fn settle(&self, id: u64, result: &PreviewResult<T>) {
        let mut state = self.lock();
        let current = match &*state {
            FlightState::Pending { id: current, .. } => *current,
            _ => return,
        };
        if current != id {
            return;
        }
        *state = match result {
            Ok(value) => FlightState::Resolved(value.clone()),
            Err(_) => FlightState::Empty,
        };
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort memo slot. Once filled it is never emptied again.
#[derive(Debug)]
pub struct MemoSlot<T> {
    value: RwLock<Option<T>>,
}

impl<T: Clone> MemoSlot<T> {
    pub fn empty() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    pub fn with(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stores `value` unless the slot is already filled, and returns
    /// whichever value the slot ends up holding.
    pub fn set_if_empty(&self, value: T) -> T {
        let mut slot = self
            .value
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.get_or_insert(value).clone()
    }

    /// Memoized value, or the result of `fetch` (stored on success only).
    /// Concurrent fetches race; the first one to finish is kept.
    pub async fn get_or_fetch<F>(&self, fetch: F, cancel: &CancellationToken) -> PreviewResult<T>
    where
        F: Future<Output = PreviewResult<T>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        let value = cancellable(fetch, cancel).await?;
        Ok(self.set_if_empty(value))
    }
}

impl<T: Clone> Default for MemoSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}
