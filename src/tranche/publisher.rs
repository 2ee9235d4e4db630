// =============================================================================
// Tranche Feed — provisional levels now, confirmations later
// =============================================================================
//
// Levels are published as soon as they are computed; the confirmation scan
// runs afterwards on a tokio task and republishes a refined copy. Readers
// hold a `watch::Receiver` and only ever see whole `Arc<TrancheLevels>`
// values: a refinement replaces the Arc, it never edits the one already out.
//
// A refinement is applied only while the provisional value it started from
// is still the one published. A newer `publish` makes it stale and it is
// discarded.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::market_data::PriceSeries;
use crate::runtime_config::ConfirmationParams;
use crate::tranche::levels::TrancheLevels;

pub type TrancheSlot = Option<Arc<TrancheLevels>>;

/// Single-producer, multi-consumer channel of the latest tranche levels.
pub struct TrancheFeed {
    tx: watch::Sender<TrancheSlot>,
    params: ConfirmationParams,
    /// Bumped on every value change (publish or applied refinement).
    generation: AtomicU64,
}

impl TrancheFeed {
    pub fn new(params: ConfirmationParams) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            params,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrancheSlot> {
        self.tx.subscribe()
    }

    /// The value readers currently see.
    pub fn current(&self) -> TrancheSlot {
        self.tx.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publish a new provisional value (or `None` when no levels exist),
    /// superseding anything in flight. Returns the published Arc.
    pub fn publish(&self, levels: Option<TrancheLevels>) -> TrancheSlot {
        let slot = levels.map(Arc::new);
        self.tx.send_replace(slot.clone());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(generation, present = slot.is_some(), "tranche levels published");
        slot
    }

    /// Run the confirmation scan for the current value on a background task.
    ///
    /// The task resolves to `true` when its refined value was published and
    /// `false` when a newer value had replaced its input in the meantime.
    /// Returns `None` when there is nothing to refine.
    pub fn spawn_refinement(
        self: &Arc<Self>,
        series: Arc<PriceSeries>,
    ) -> Option<JoinHandle<bool>> {
        let provisional = self.current()?;
        let feed = Arc::clone(self);

        Some(tokio::spawn(async move {
            let refined = Arc::new(provisional.with_confirmations(&series, &feed.params));

            let applied = feed.tx.send_if_modified(|slot| {
                let still_current = slot
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &provisional));
                if still_current {
                    *slot = Some(refined);
                }
                still_current
            });

            if applied {
                let generation = feed.generation.fetch_add(1, Ordering::SeqCst) + 1;
                trace!(generation, "tranche confirmations published");
            } else {
                debug!("stale tranche refinement discarded");
            }
            applied
        }))
    }
}
