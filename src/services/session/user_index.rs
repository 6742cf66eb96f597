//! Reverse index: username -> live session ids.
//!
//! A projection of the session store. It holds nothing the store does not
//! already encode, and can be rebuilt from a store snapshot at any time.
//!
//! Each id carries the generations of the bindings that added it. The store
//! notifies every binding exactly once, and a removal only takes out its own
//! generation, so removals for a replaced binding cannot drop the live one no
//! matter how creates and notifications interleave. An id is listed while at
//! least one of its generations is still recorded.
use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::services::session::types::{Generation, LiveBinding};

type Sessions = HashMap<String, BTreeSet<Generation>>;

#[derive(Debug, Default)]
pub struct UserIndex {
    users: RwLock<HashMap<String, Sessions>>,
}

impl UserIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `session_id` as live for `username`. Idempotent.
    pub fn add(&self, username: &str, session_id: &str, generation: Generation) {
        self.users
            .write()
            .entry(username.to_string())
            .or_default()
            .entry(session_id.to_string())
            .or_default()
            .insert(generation);
    }

    /// Forget the binding `generation` of `session_id`. Unknown usernames, ids
    /// and generations are no-ops. Returns whether anything was removed.
    pub fn remove(&self, username: &str, session_id: &str, generation: Generation) -> bool {
        let mut users = self.users.write();
        let Some(sessions) = users.get_mut(username) else {
            return false;
        };

        let removed = match sessions.get_mut(session_id) {
            Some(generations) => {
                let removed = generations.remove(&generation);
                if generations.is_empty() {
                    sessions.remove(session_id);
                }
                removed
            }
            None => false,
        };

        if sessions.is_empty() {
            users.remove(username);
        }
        removed
    }

    /// Session ids currently recorded for `username`, sorted.
    pub fn list(&self, username: &str) -> Vec<String> {
        let users = self.users.read();
        let mut ids: Vec<String> = users
            .get(username)
            .map(|sessions| sessions.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn contains(&self, username: &str, session_id: &str) -> bool {
        self.users
            .read()
            .get(username)
            .is_some_and(|sessions| sessions.contains_key(session_id))
    }

    /// Total number of recorded ids across all users.
    pub fn len(&self) -> usize {
        self.users.read().values().map(HashMap::len).sum()
    }

    /// Replace the whole projection with `bindings`.
    pub fn rebuild(&self, bindings: &[LiveBinding]) {
        let mut fresh: HashMap<String, Sessions> = HashMap::new();
        for binding in bindings {
            fresh
                .entry(binding.account.username.clone())
                .or_default()
                .entry(binding.session_id.clone())
                .or_default()
                .insert(binding.generation);
        }
        *self.users.write() = fresh;
    }
}
