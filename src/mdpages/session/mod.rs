//! # Session / Autosave Controller
//!
//! Wires user edits to the store. Content changes are applied in memory
//! immediately and persisted after a quiet period ([`Debouncer`]); the preview
//! recompute is debounced the same way on a shorter delay.
//!
//! The autosave timer is always bound to the id of the document that was
//! edited. Before any navigation (switch, clone, create) a pending save is
//! flushed to that same document, so edits never land on the new active one.
//! Removing a document drops its pending save.

pub mod debounce;

pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};

use crate::store::{DocumentStore, StorageBackend};
use uuid::Uuid;

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1000;
pub const DEFAULT_PREVIEW_DELAY_MS: u64 = 300;

/// What became due during a [`Session::tick`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Document that was committed to storage.
    pub saved: Option<Uuid>,
    /// Document whose preview should be recomputed.
    pub rerender: Option<Uuid>,
}

pub struct Session<B: StorageBackend, C: Clock> {
    store: DocumentStore<B>,
    clock: C,
    autosave: Debouncer<Uuid>,
    preview: Debouncer<Uuid>,
}

impl<B: StorageBackend, C: Clock> Session<B, C> {
    pub fn new(store: DocumentStore<B>, clock: C) -> Self {
        Self::with_delays(
            store,
            clock,
            DEFAULT_AUTOSAVE_DELAY_MS,
            DEFAULT_PREVIEW_DELAY_MS,
        )
    }

    pub fn with_delays(store: DocumentStore<B>, clock: C, autosave_ms: u64, preview_ms: u64) -> Self {
        Self {
            store,
            clock,
            autosave: Debouncer::new(autosave_ms),
            preview: Debouncer::new(preview_ms),
        }
    }

    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore<B> {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Document with an unsaved edit, if any.
    pub fn pending_save(&self) -> Option<&Uuid> {
        self.autosave.pending()
    }

    /// Earliest time (clock ms) at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.autosave.deadline(), self.preview.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Replace the active document's content and restart both timers.
    pub fn edit(&mut self, content: &str) -> bool {
        let id = self.store.active_id();
        if !self.store.update(&id, content) {
            return false;
        }
        let now = self.clock.now_ms();
        self.autosave.schedule(id, now);
        self.preview.schedule(id, now);
        true
    }

    /// Run whatever has come due.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now_ms();
        let saved = self.autosave.take_due(now).and_then(|id| self.save_or_rearm(id));
        let rerender = self.preview.take_due(now);
        TickOutcome { saved, rerender }
    }

    /// Commit any pending edit immediately.
    ///
    /// A failed write stays pending, so a later tick or flush retries it.
    pub fn flush(&mut self) -> Option<Uuid> {
        let id = self.autosave.cancel()?;
        self.save_or_rearm(id)
    }

    pub fn switch_to(&mut self, id: &Uuid) -> bool {
        if self.store.get(id).is_none() {
            return false;
        }
        self.flush();
        self.preview.cancel();
        self.store.set_active(id)
    }

    pub fn create(&mut self, name: Option<&str>, content: &str) -> Uuid {
        self.flush();
        self.preview.cancel();
        let id = self.store.create(name, content);
        self.store.set_active(&id);
        id
    }

    pub fn clone_active(&mut self) -> Option<Uuid> {
        self.flush();
        self.preview.cancel();
        let id = self.store.active_id();
        self.store.clone_document(&id)
    }

    pub fn rename(&mut self, id: &Uuid, name: &str) -> bool {
        self.store.rename(id, name)
    }

    pub fn remove(&mut self, id: &Uuid) -> bool {
        if self.store.get(id).is_none() {
            return false;
        }
        if self.autosave.cancel_for(id) {
            log::debug!("dropped pending save for removed document {}", id);
        } else {
            self.flush();
        }
        self.preview.cancel_for(id);
        self.store.remove(id)
    }

    fn save_or_rearm(&mut self, id: Uuid) -> Option<Uuid> {
        if self.commit(&id) {
            return Some(id);
        }
        if self.store.get(&id).is_some() {
            log::debug!("save of {} failed, will retry", id);
            self.autosave.schedule(id, self.clock.now_ms());
        }
        None
    }

    fn commit(&mut self, id: &Uuid) -> bool {
        let at = self.clock.now_utc();
        let ok = self.store.commit(id, at);
        if ok {
            log::debug!("autosaved {}", id);
        }
        ok
    }
}
