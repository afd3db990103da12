//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! The critical section that serializes input dispatch.
//!
//! A session enters it after a key has been read, marks its surface as the active one, applies
//! the key to its player, and leaves. Waiting for the key happens outside.
//!
//! Every session draws on its own channel, so nothing needs the active surface in order to
//! draw. It is kept for inspection, alongside the counters.

use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Sessions are numbered per process
pub type SessionId = u64;

/// How far a critical section reaches
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchScope {
    /// one critical section for the whole server: at most one key is dispatched at a time
    Global,
    /// one critical section per game: sessions of different games never wait for each other
    PerGame,
}

impl Default for DispatchScope {
    fn default() -> Self {
        DispatchScope::Global
    }
}

#[derive(Debug, Default)]
pub struct CriticalSection {
    /// the active surface, i.e., the session that dispatched last. The mutex is the lock.
    active: Mutex<Option<SessionId>>,
    // instrumentation: sessions inside now, most ever inside, and entries so far
    inside: AtomicUsize,
    peak: AtomicUsize,
    entries: AtomicU64,
}

pub struct Guard<'a> {
    cs: &'a CriticalSection,
    _active: MutexGuard<'a, Option<SessionId>>,
}

impl CriticalSection {
    pub fn new() -> Arc<CriticalSection> {
        Arc::new(CriticalSection::default())
    }

    /// Enter, and make `sid`'s surface the active one
    pub async fn enter(&self, sid: SessionId) -> Guard<'_> {
        let mut active = self.active.lock().await;
        *active = Some(sid);
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.entries.fetch_add(1, Ordering::Relaxed);
        Guard { cs: self, _active: active }
    }

    /// Most sessions that were ever inside at the same time
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    /// The session that dispatched last, if nobody is inside right now. For inspection only.
    pub fn active(&self) -> Option<SessionId> {
        self.active.try_lock().ok().and_then(|a| *a)
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        // runs before the lock is released
        self.cs.inside.fetch_sub(1, Ordering::SeqCst);
    }
}
