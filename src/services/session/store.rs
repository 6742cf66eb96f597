//! Time-bounded session id -> Account map.
//!
//! Responsibility:
//! - Authoritative session binding (the user index is only a projection of it)
//! - Expiry, both lazy (on `get`) and active (`purge_expired`)
//! - Removal notifications, exactly one per removed binding
//!
//! Notes:
//! - Whoever moves an entry out of the map owns its notification. The map lock
//!   is the only arbiter, so concurrent `get`/`remove`/sweep on the same id can
//!   never notify twice or not at all.
//! - Listeners run after the map lock is released. A listener may call back into
//!   the store without deadlocking.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::model::Account;
use crate::services::clock::Clock;
use crate::services::session::types::{Eviction, EvictionCause, Generation, LiveBinding};

pub type EvictionListener = Arc<dyn Fn(&Eviction) + Send + Sync>;

#[derive(Debug)]
struct Entry {
    account: Account,
    // None when `now + ttl` is past what `Instant` can represent.
    expires_at: Option<Instant>,
    generation: Generation,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    fn into_eviction(self, session_id: String, cause: EvictionCause) -> Eviction {
        Eviction {
            session_id,
            account: self.account,
            generation: self.generation,
            cause,
        }
    }
}

pub struct SessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    listener: RwLock<Option<EvictionListener>>,
    next_generation: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("len", &self.entries.lock().len())
            .finish()
    }
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            listener: RwLock::new(None),
            next_generation: AtomicU64::new(1),
            clock,
        }
    }

    /// Register the removal listener. Replaces any previous one.
    pub fn on_evicted<F>(&self, listener: F)
    where
        F: Fn(&Eviction) + Send + Sync + 'static,
    {
        *self.listener.write() = Some(Arc::new(listener));
    }

    /// Reserve the generation for a binding that is about to be `put`.
    pub fn next_generation(&self) -> Generation {
        Generation(self.next_generation.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert or replace a binding; its lifetime restarts at `ttl` from now.
    pub fn put(&self, session_id: &str, account: Account, ttl: Duration) -> Generation {
        let generation = self.next_generation();
        self.put_with_generation(session_id, account, ttl, generation);
        generation
    }

    /// `put` with a generation obtained earlier from [`Self::next_generation`].
    pub fn put_with_generation(
        &self,
        session_id: &str,
        account: Account,
        ttl: Duration,
        generation: Generation,
    ) {
        let expires_at = self.clock.now().checked_add(ttl);

        let replaced = {
            let mut entries = self.entries.lock();
            entries.insert(
                session_id.to_string(),
                Entry {
                    account,
                    expires_at,
                    generation,
                },
            )
        };

        if let Some(old) = replaced {
            self.notify(old.into_eviction(session_id.to_string(), EvictionCause::Replaced));
        }
    }

    /// Non-extending read. Unknown and expired ids both yield `None`.
    pub fn get(&self, session_id: &str) -> Option<Account> {
        let now = self.clock.now();

        let expired = {
            let mut entries = self.entries.lock();
            let entry = entries.get(session_id)?;
            if !entry.is_expired(now) {
                return Some(entry.account.clone());
            }
            entries.remove(session_id)
        };

        if let Some(entry) = expired {
            self.notify(entry.into_eviction(session_id.to_string(), EvictionCause::Expired));
        }
        None
    }

    /// Explicit invalidation. Returns whether a binding was actually removed.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.entries.lock().remove(session_id);

        match removed {
            Some(entry) => {
                self.notify(entry.into_eviction(session_id.to_string(), EvictionCause::Removed));
                true
            }
            None => false,
        }
    }

    /// Remove `session_id` only if its live binding satisfies `owned`.
    ///
    /// The check and the removal happen under one lock, so a binding that was
    /// replaced in between is never removed by mistake. An expired binding is
    /// purged as expired and reported as not removed.
    pub fn remove_if(&self, session_id: &str, owned: impl FnOnce(&Account) -> bool) -> bool {
        let now = self.clock.now();

        let (removed, cause) = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get(session_id) else {
                return false;
            };
            let cause = if entry.is_expired(now) {
                EvictionCause::Expired
            } else if owned(&entry.account) {
                EvictionCause::Removed
            } else {
                return false;
            };
            (entries.remove(session_id), cause)
        };

        match removed {
            Some(entry) => {
                self.notify(entry.into_eviction(session_id.to_string(), cause));
                cause == EvictionCause::Removed
            }
            None => false,
        }
    }

    /// Drop every expired binding. Returns how many were purged.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();

        let expired: Vec<Eviction> = {
            let mut entries = self.entries.lock();
            let ids: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(id, _)| id.clone())
                .collect();

            ids.into_iter()
                .filter_map(|id| {
                    entries
                        .remove(&id)
                        .map(|entry| entry.into_eviction(id, EvictionCause::Expired))
                })
                .collect()
        };

        let purged = expired.len();
        for eviction in &expired {
            self.notify_ref(eviction);
        }
        purged
    }

    /// Number of stored bindings, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Run `f` over the live bindings while the map is locked.
    ///
    /// No removal can happen (and so no notification can be produced) until `f`
    /// returns. `f` must not call back into the store.
    pub fn with_live_bindings<R>(&self, f: impl FnOnce(Vec<LiveBinding>) -> R) -> R {
        let now = self.clock.now();
        let entries = self.entries.lock();

        let live = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(id, entry)| LiveBinding {
                session_id: id.clone(),
                account: entry.account.clone(),
                generation: entry.generation,
            })
            .collect();

        f(live)
    }

    fn notify(&self, eviction: Eviction) {
        self.notify_ref(&eviction);
    }

    fn notify_ref(&self, eviction: &Eviction) {
        tracing::debug!(
            session_id = %eviction.session_id,
            username = %eviction.account.username,
            generation = %eviction.generation,
            cause = eviction.cause.as_str(),
            "session evicted"
        );

        // Clone the Arc so the listener runs without the listener lock held either.
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener(eviction);
        }
    }
}
