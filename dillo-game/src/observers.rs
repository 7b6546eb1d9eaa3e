//! Listener registry notified after every successful store mutation.
//!
//! Observers run synchronously, in registration order, after the mutation
//! completes. A failing observer (an `Err` return or a panic) is logged and
//! skipped; the remaining observers still run and the store is unaffected.
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::warn;

use crate::state::GameState;

/// Handle returned by registration, used to unregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Something that wants to hear about state changes.
pub trait StateObserver {
    /// Called with read-only access to the state after a mutation.
    ///
    /// # Errors
    ///
    /// An error is logged by the registry and does not stop other observers.
    fn on_change(&mut self, state: &GameState) -> anyhow::Result<()>;
}

impl<F> StateObserver for F
where
    F: FnMut(&GameState) -> anyhow::Result<()>,
{
    fn on_change(&mut self, state: &GameState) -> anyhow::Result<()> {
        self(state)
    }
}

/// Ordered collection of registered observers.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn StateObserver>)>,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Box<dyn StateObserver>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.entries.push((id, observer));
        id
    }

    /// Unregister an observer. Returns `false` for an unknown handle.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every observer against `state`, isolating failures.
    pub fn notify_all(&mut self, state: &GameState) {
        for (id, observer) in &mut self.entries {
            match catch_unwind(AssertUnwindSafe(|| observer.on_change(state))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("{id} failed: {err:#}"),
                Err(_) => warn!("{id} panicked during notification"),
            }
        }
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = ObserverId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("next_id", &self.next_id)
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}
