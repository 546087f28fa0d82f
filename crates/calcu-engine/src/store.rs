use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::{debug, instrument};

use calcu_core::MessageRef;

use crate::calculation::{Calculation, DisplayMode};
use crate::error::StoreError;

/// Delivered calculations, indexed by the bot's response message.
///
/// Bounded: once `capacity` entries are held, the least recently used one
/// is evicted and reactions on its message are ignored from then on.
///
/// The index lock is only held for map operations. Each entry has its own
/// async lock so work on one message (flip, edit, reconcile) serialises
/// without blocking any other message.
pub struct SessionStore {
    entries: Mutex<LruCache<MessageRef, CalculationSlot>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Track a delivered calculation.
    ///
    /// Rejects failures and calculations without a response message, and
    /// refuses to replace a live entry for the same response.
    #[instrument(skip(self, calculation), fields(calc = %calculation.id))]
    pub fn append(&self, calculation: Calculation) -> Result<(), StoreError> {
        let Some(response) = calculation.response().filter(|_| calculation.is_success()) else {
            return Err(StoreError::NotDelivered);
        };

        let mut entries = self.entries.lock().expect("session store poisoned");
        if entries.contains(&response) {
            return Err(StoreError::Duplicate(response));
        }
        let slot = CalculationSlot(Arc::new(tokio::sync::Mutex::new(calculation)));
        if let Some((evicted, _)) = entries.push(response, slot) {
            debug!(response = %evicted, "evicted oldest calculation");
        }
        Ok(())
    }

    /// Handle to the entry for `response`, marking it recently used.
    pub fn slot(&self, response: &MessageRef) -> Option<CalculationSlot> {
        self.entries
            .lock()
            .expect("session store poisoned")
            .get(response)
            .cloned()
    }

    /// Snapshot of the calculation that produced `response`.
    pub async fn find_by_response(&self, response: &MessageRef) -> Option<Calculation> {
        let slot = self.slot(response)?;
        let guard = slot.lock().await;
        Some(Calculation::clone(&guard))
    }

    /// Commit a new display mode to the calculation held by `guard`.
    ///
    /// The only way a stored display mode changes. Taking the guard keeps
    /// the commit inside the caller's critical section for that message.
    /// Returns false when the entry was evicted while it was held; the
    /// detached copy is still updated but no later reaction can reach it.
    #[instrument(skip(self, guard), fields(calc = %guard.id))]
    pub fn update_display_mode(&self, guard: &mut CalculationGuard<'_>, mode: DisplayMode) -> bool {
        guard.0.set_display_mode(mode);
        let tracked = guard.response().is_some_and(|response| {
            self.entries
                .lock()
                .expect("session store poisoned")
                .contains(&response)
        });
        if !tracked {
            debug!("display mode committed to an evicted calculation");
        }
        tracked
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("session store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().expect("session store poisoned").cap().get()
    }
}

/// Shared handle to one stored calculation.
#[derive(Clone)]
pub struct CalculationSlot(Arc<tokio::sync::Mutex<Calculation>>);

impl CalculationSlot {
    /// Exclusive access for the duration of the returned guard.
    pub async fn lock(&self) -> CalculationGuard<'_> {
        CalculationGuard(self.0.lock().await)
    }
}

/// Read access to a stored calculation. Its display mode changes only via
/// [`SessionStore::update_display_mode`].
pub struct CalculationGuard<'a>(tokio::sync::MutexGuard<'a, Calculation>);

impl Deref for CalculationGuard<'_> {
    type Target = Calculation;

    fn deref(&self) -> &Calculation {
        &self.0
    }
}
