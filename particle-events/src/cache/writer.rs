//! The cache's single writer task

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{EvictionVeto, Shared};
use crate::record::EventRecord;

pub(crate) enum Command {
    Insert(EventRecord),
    SetCapacity(usize),
    SetVeto(EvictionVeto),
    Clear,
    Flush(oneshot::Sender<()>),
}

pub(crate) fn allow_all() -> EvictionVeto {
    Arc::new(|_: &EventRecord| true)
}

/// Owns every mutation of the cache state
pub(crate) struct Writer {
    shared: Arc<Shared>,
    veto: EvictionVeto,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Writer {
    pub(crate) fn new(shared: Arc<Shared>, commands: mpsc::UnboundedReceiver<Command>) -> Self {
        Self {
            shared,
            veto: allow_all(),
            commands,
        }
    }

    pub(crate) async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            let changed = match command {
                Command::Insert(record) => {
                    tracing::trace!(
                        name = record.name(),
                        published_at = record.published_at_raw(),
                        "Caching event"
                    );
                    let grew = self.shared.state.write().insert(record);
                    if grew {
                        self.evict();
                    }
                    grew
                }
                Command::SetCapacity(capacity) => {
                    self.shared.state.write().capacity = capacity;
                    self.evict();
                    true
                }
                Command::SetVeto(veto) => {
                    self.veto = veto;
                    false
                }
                Command::Clear => {
                    self.shared.state.write().clear();
                    true
                }
                Command::Flush(done) => {
                    let _ = done.send(());
                    false
                }
            };

            if changed {
                self.shared.revision.send_modify(|rev| *rev += 1);
            }
        }

        tracing::debug!("Event cache writer stopped");
    }

    /// Run eviction passes until the set fits its capacity
    ///
    /// A pass that ends on a refusal grows the capacity by one. If the set is
    /// still too large afterwards (capacity was lowered by more than one),
    /// another pass starts and asks about the oldest record again.
    fn evict(&self) {
        while self.eviction_pass() {}
    }

    /// Consult the predicate. A panicking predicate counts as a refusal, so
    /// the record is kept and the writer keeps running.
    fn ask_veto(&self, victim: &EventRecord) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.veto)(victim))) {
            Ok(allowed) => allowed,
            Err(_) => {
                tracing::error!(
                    name = victim.name(),
                    published_at = victim.published_at_raw(),
                    "Eviction veto panicked, keeping record"
                );
                false
            }
        }
    }

    /// Evict oldest records until the set fits or the predicate refuses.
    /// Returns true when the pass ended on a refusal and the set is still
    /// over capacity.
    ///
    /// The veto predicate is called with no lock held. This task is the only
    /// mutator, so the victim is still cached when the decision is applied.
    fn eviction_pass(&self) -> bool {
        loop {
            let (key, victim) = {
                let state = self.shared.state.read();
                if !state.over_capacity() {
                    return false;
                }
                match state.oldest() {
                    Some(oldest) => oldest,
                    None => return false,
                }
            };

            let allowed = self.ask_veto(&victim);

            let mut state = self.shared.state.write();
            if allowed {
                state.remove(&key);
                tracing::debug!(
                    name = victim.name(),
                    published_at = victim.published_at_raw(),
                    "Evicted event"
                );
            } else {
                state.capacity += 1;
                tracing::debug!(
                    name = victim.name(),
                    published_at = victim.published_at_raw(),
                    capacity = state.capacity,
                    "Eviction refused, capacity grown"
                );
                return state.over_capacity();
            }
        }
    }
}
