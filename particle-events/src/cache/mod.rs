//! Bounded event cache
//!
//! Retains the most recent [`EventRecord`]s under a capacity bound. When the
//! set grows past its capacity the oldest record (smallest raw publication
//! timestamp) is offered for eviction; an installed veto predicate may refuse,
//! in which case the capacity grows by one instead and nothing is removed.
//!
//! ## Access model
//!
//! All mutation goes through a single writer task fed by an unbounded
//! channel. [`BoundedEventCache::insert`] and friends only enqueue a command
//! and return immediately; the change becomes visible once the writer has
//! applied it. Use [`BoundedEventCache::flush`] to wait for that point, or
//! [`BoundedEventCache::subscribe`] to be told about every change.
//!
//! Readers (`snapshot`, `len`, `capacity`) take a short read lock on the
//! published state. The writer never holds that lock while calling the veto
//! predicate, so the predicate may itself read the cache or enqueue writes.

mod state;
mod writer;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};

use crate::record::EventRecord;
use state::CacheState;
use writer::{Command, Writer};

/// Predicate consulted before a record is evicted. `true` allows eviction.
pub type EvictionVeto = Arc<dyn Fn(&EventRecord) -> bool + Send + Sync>;

/// State shared between cache handles and the writer task
pub(crate) struct Shared {
    pub(crate) state: RwLock<CacheState>,
    /// Bumped after every applied change
    pub(crate) revision: watch::Sender<u64>,
}

/// Handle to a capacity-bounded, content-deduplicated set of events
///
/// Cloning the handle is cheap; all clones address the same cache. The writer
/// task stops once every handle has been dropped.
#[derive(Clone)]
pub struct BoundedEventCache {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<Shared>,
}

impl BoundedEventCache {
    /// Create a cache with the given initial capacity
    ///
    /// Spawns the writer task, so this must be called from within a tokio
    /// runtime.
    pub fn new(capacity: usize) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            state: RwLock::new(CacheState::new(capacity)),
            revision,
        });

        tokio::spawn(Writer::new(shared.clone(), rx).run());

        Self { commands, shared }
    }

    /// Add a record unless a content-equal record is already cached
    pub fn insert(&self, record: EventRecord) {
        self.send(Command::Insert(record));
    }

    /// Change the capacity, evicting down to it if needed
    pub fn set_capacity(&self, capacity: usize) {
        self.send(Command::SetCapacity(capacity));
    }

    /// Install the eviction veto predicate
    ///
    /// The predicate runs on the writer task with no cache lock held. It may
    /// call back into the cache; writes it issues are applied after the
    /// current eviction pass. A predicate that captures a handle to this cache
    /// keeps the writer alive until the predicate is replaced.
    pub fn set_eviction_veto<F>(&self, predicate: F)
    where
        F: Fn(&EventRecord) -> bool + Send + Sync + 'static,
    {
        self.send(Command::SetVeto(Arc::new(predicate)));
    }

    /// Restore the default predicate, which allows every eviction
    pub fn clear_eviction_veto(&self) {
        self.send(Command::SetVeto(writer::allow_all()));
    }

    /// Remove every record. Capacity is left unchanged.
    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    /// Wait until every command sent before this call has been applied
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Records grouped by event name, each group newest first
    ///
    /// Ordering compares the raw `published_at` strings, which is only
    /// chronological when every timestamp uses the same fixed-width UTC form.
    ///
    /// An insert is published before its eviction pass runs, so a snapshot
    /// taken while the writer is busy may briefly hold more records than
    /// [`capacity`](Self::capacity). Call [`flush`](Self::flush) first for a
    /// settled view.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<EventRecord>> {
        self.shared.state.read().grouped()
    }

    /// Records bearing `name`, newest first
    pub fn records_named(&self, name: &str) -> Vec<EventRecord> {
        self.shared.state.read().named(name)
    }

    /// Number of cached records
    ///
    /// Like [`snapshot`](Self::snapshot), may exceed the capacity while an
    /// eviction pass is in progress.
    pub fn len(&self) -> usize {
        self.shared.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity (grows by one for every refused eviction)
    pub fn capacity(&self) -> usize {
        self.shared.state.read().capacity
    }

    /// Change notifications: the value is a revision counter
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Event cache writer has stopped, dropping command");
        }
    }
}

impl std::fmt::Debug for BoundedEventCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("BoundedEventCache")
            .field("capacity", &state.capacity)
            .field("len", &state.len())
            .finish()
    }
}
