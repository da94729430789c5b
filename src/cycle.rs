//! Load-cycle generations.
//!
//! Every parameter change starts a new load cycle. Cycles are not cancelled,
//! so a slow, superseded cycle can finish after a newer one. [`CycleGuard`]
//! numbers cycles as they start and only publishes the result of the most
//! recently started one; consumers never observe a stale snapshot.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::fetch::HttpClient;
use crate::loader::{DatasetSelection, LoadOutcome, Loader};

/// Handed out by [`CycleGuard::begin`]; identifies one load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    generation: u64,
}

impl CycleTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A published cycle result.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub generation: u64,
    pub completed_at: DateTime<Utc>,
    pub value: T,
}

pub type Published<T> = Option<Arc<Snapshot<T>>>;

#[derive(Debug)]
pub struct CycleGuard<T> {
    started: AtomicU64,
    tx: watch::Sender<Published<T>>,
}

impl<T> Default for CycleGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CycleGuard<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            started: AtomicU64::new(0),
            tx,
        }
    }

    /// Starts a cycle, superseding every cycle started before it.
    pub fn begin(&self) -> CycleTicket {
        let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Load cycle started");
        CycleTicket { generation }
    }

    /// Whether no newer cycle has started since `ticket`.
    pub fn is_current(&self, ticket: CycleTicket) -> bool {
        self.started.load(Ordering::SeqCst) == ticket.generation
    }

    /// Publishes `value` if `ticket` is still the latest cycle.
    ///
    /// Returns the stored snapshot, or `None` and drops the value when the
    /// cycle was superseded.
    pub fn publish(&self, ticket: CycleTicket, value: T) -> Published<T> {
        let snapshot = Arc::new(Snapshot {
            generation: ticket.generation,
            completed_at: Utc::now(),
            value,
        });

        let accepted = self.tx.send_if_modified(|slot| {
            let newer_published = slot
                .as_ref()
                .is_some_and(|s| s.generation > ticket.generation);
            if newer_published || !self.is_current(ticket) {
                return false;
            }
            *slot = Some(snapshot.clone());
            true
        });

        if !accepted {
            debug!(
                generation = ticket.generation,
                latest = self.started.load(Ordering::SeqCst),
                "Superseded cycle result discarded"
            );
            return None;
        }
        Some(snapshot)
    }

    /// The most recently published snapshot, if any.
    pub fn latest(&self) -> Published<T> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every accepted publish.
    pub fn subscribe(&self) -> watch::Receiver<Published<T>> {
        self.tx.subscribe()
    }
}

/// Runs one full load cycle: load `selection`, build the view from the
/// outcome, and publish it unless a newer cycle started meanwhile.
///
/// Returns the published snapshot, or `None` when the result was superseded.
pub async fn run_cycle<C, T, F>(
    guard: &CycleGuard<T>,
    loader: &Loader<C>,
    selection: DatasetSelection,
    view: F,
) -> Published<T>
where
    C: HttpClient + 'static,
    F: FnOnce(&LoadOutcome) -> T,
{
    let ticket = guard.begin();
    let outcome = loader.load(selection).await;
    guard.publish(ticket, view(&outcome))
}
