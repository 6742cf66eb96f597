//! Session store + user index, kept in agreement.
//!
//! Ordering rules:
//! - create: index first, then store. A session is never readable from the
//!   store while missing from the index.
//! - remove/expire: store first. The store's removal notification is the only
//!   path that removes ids from the index.
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::Account;
use crate::services::clock::Clock;
use crate::services::session::{Generation, SessionStore, UserIndex};

#[derive(Debug)]
pub struct SessionRegistry {
    store: Arc<SessionStore>,
    index: Arc<UserIndex>,
    session_ttl: Duration,
    // Held shared by creates, exclusively by index rebuilds.
    creating: RwLock<()>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>, session_ttl: Duration) -> Self {
        let store = Arc::new(SessionStore::new(clock));
        let index = Arc::new(UserIndex::new());

        let projection = Arc::clone(&index);
        store.on_evicted(move |ev| {
            projection.remove(&ev.account.username, &ev.session_id, ev.generation);
        });

        Self {
            store,
            index,
            session_ttl,
            creating: RwLock::new(()),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Issue a new server-generated session for `account` with the default TTL.
    pub fn create(&self, account: Account) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.insert(&session_id, account, self.session_ttl);
        session_id
    }

    /// Bind `session_id` to `account` in both structures.
    pub fn insert(&self, session_id: &str, account: Account, ttl: Duration) -> Generation {
        let _creating = self.creating.read();

        let generation = self.store.next_generation();
        self.index.add(&account.username, session_id, generation);
        tracing::debug!(
            session_id,
            username = %account.username,
            ttl_secs = ttl.as_secs(),
            "session created"
        );
        self.store
            .put_with_generation(session_id, account, ttl, generation);
        generation
    }

    pub fn lookup(&self, session_id: &str) -> Option<Account> {
        self.store.get(session_id)
    }

    /// Explicit invalidation (logout). Idempotent.
    pub fn invalidate(&self, session_id: &str) -> bool {
        self.store.remove(session_id)
    }

    /// Invalidate `session_id` only while it is still bound to `username`.
    pub fn invalidate_owned(&self, session_id: &str, username: &str) -> bool {
        self.store
            .remove_if(session_id, |account| account.username == username)
    }

    /// Invalidate every session currently indexed for `username`.
    pub fn invalidate_user(&self, username: &str) -> usize {
        let count = self
            .index
            .list(username)
            .iter()
            .filter(|sid| self.invalidate_owned(sid, username))
            .count();
        tracing::info!(username, count, "sessions revoked for user");
        count
    }

    pub fn sessions_of(&self, username: &str) -> Vec<String> {
        self.index.list(username)
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Recompute the user index from the store.
    ///
    /// Creates are paused and removals cannot happen while the snapshot is
    /// applied, so no notification can be lost or replayed across the rebuild.
    pub fn rebuild_index(&self) {
        let _paused = self.creating.write();
        let index = &self.index;
        self.store
            .with_live_bindings(|bindings| index.rebuild(&bindings));
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn index(&self) -> &UserIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::services::clock::ManualClock;

    fn registry() -> (SessionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let registry = SessionRegistry::new(clock.clone(), Duration::from_secs(60));
        (registry, clock)
    }

    fn alice() -> Account {
        Account::new(1, "alice", false)
    }

    /// Every live store id is indexed under its owner, and nothing else is indexed.
    fn assert_consistent(registry: &SessionRegistry, usernames: &[&str]) {
        let live: BTreeSet<(String, String)> = registry.store().with_live_bindings(|bindings| {
            bindings
                .into_iter()
                .map(|b| (b.account.username, b.session_id))
                .collect()
        });

        let indexed: BTreeSet<(String, String)> = usernames
            .iter()
            .flat_map(|user| {
                registry
                    .sessions_of(user)
                    .into_iter()
                    .map(move |sid| (user.to_string(), sid))
            })
            .collect();

        assert_eq!(live, indexed);
    }

    #[test]
    fn test_create_is_listed_immediately() {
        let (registry, _clock) = registry();

        let sid = registry.create(alice());

        assert!(registry.sessions_of("alice").contains(&sid));
        assert_eq!(registry.lookup(&sid), Some(alice()));
    }

    #[test]
    fn test_expiry_scenario_clears_index_on_get() {
        let (registry, clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));
        assert_eq!(registry.sessions_of("alice"), vec!["sid1".to_string()]);

        clock.advance(Duration::from_secs(61));
        assert_eq!(registry.lookup("sid1"), None);

        assert!(registry.sessions_of("alice").is_empty());
    }

    #[test]
    fn test_expiry_scenario_clears_index_on_sweep() {
        let (registry, clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));

        clock.advance(Duration::from_secs(61));
        assert_eq!(registry.purge_expired(), 1);

        assert!(registry.sessions_of("alice").is_empty());
    }

    #[test]
    fn test_invalidate_twice_is_idempotent() {
        let (registry, _clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));
        registry.insert("sid2", alice(), Duration::from_secs(60));

        assert!(registry.invalidate("sid1"));
        assert!(!registry.invalidate("sid1"));

        assert_eq!(registry.sessions_of("alice"), vec!["sid2".to_string()]);
    }

    #[test]
    fn test_overwrite_with_other_user_moves_index_entry() {
        let (registry, _clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));

        registry.insert("sid1", Account::new(2, "bob", true), Duration::from_secs(60));

        assert!(registry.sessions_of("alice").is_empty());
        assert_eq!(registry.sessions_of("bob"), vec!["sid1".to_string()]);
    }

    #[test]
    fn test_overwrite_same_user_keeps_index_entry() {
        let (registry, _clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));

        registry.insert("sid1", alice(), Duration::from_secs(60));

        assert_eq!(registry.sessions_of("alice"), vec!["sid1".to_string()]);
    }

    #[test]
    fn test_invalidate_user_removes_all_sessions() {
        let (registry, _clock) = registry();
        registry.insert("a", alice(), Duration::from_secs(60));
        registry.insert("b", alice(), Duration::from_secs(60));
        registry.insert("c", Account::new(2, "bob", true), Duration::from_secs(60));

        assert_eq!(registry.invalidate_user("alice"), 2);

        assert!(registry.sessions_of("alice").is_empty());
        assert_eq!(registry.sessions_of("bob"), vec!["c".to_string()]);
    }

    #[test]
    fn test_invalidate_owned_skips_id_rebound_to_other_user() {
        let (registry, _clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));
        // alice's listing is stale by the time she revokes.
        let listed = registry.sessions_of("alice");
        registry.insert("sid1", Account::new(2, "bob", true), Duration::from_secs(60));

        assert!(!registry.invalidate_owned(&listed[0], "alice"));

        assert_eq!(registry.lookup("sid1").map(|a| a.username), Some("bob".to_string()));
        assert_eq!(registry.sessions_of("bob"), vec!["sid1".to_string()]);
        assert_consistent(&registry, &["alice", "bob"]);
    }

    #[test]
    fn test_rebuild_index_restores_projection() {
        let (registry, _clock) = registry();
        registry.insert("sid1", alice(), Duration::from_secs(60));
        // Simulate a lost projection.
        registry.index().rebuild(&[]);
        assert!(registry.sessions_of("alice").is_empty());

        registry.rebuild_index();

        assert_eq!(registry.sessions_of("alice"), vec!["sid1".to_string()]);
    }

    #[test]
    fn test_random_operation_sequence_keeps_invariant() {
        let (registry, clock) = registry();
        let users = ["alice", "bob", "carol"];

        // Small deterministic LCG; keeps the test reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for _ in 0..2_000 {
            let sid = format!("sid{}", next() % 40);
            match next() % 5 {
                0 | 1 => {
                    let user = users[next() % users.len()];
                    let ttl = Duration::from_secs(1 + (next() % 30) as u64);
                    registry.insert(&sid, Account::new(0, user, false), ttl);
                }
                2 => {
                    registry.invalidate(&sid);
                }
                3 => {
                    registry.lookup(&sid);
                }
                _ => {
                    clock.advance(Duration::from_secs((next() % 10) as u64));
                    registry.purge_expired();
                }
            }
        }

        // Quiesce: expired-but-unswept ids are still indexed until purged.
        registry.purge_expired();
        assert_consistent(&registry, &users);
    }

    #[test]
    fn test_concurrent_create_and_expire_keeps_invariant() {
        let clock = Arc::new(ManualClock::new());
        let registry = Arc::new(SessionRegistry::new(clock.clone(), Duration::from_secs(60)));
        let users = ["alice", "bob"];

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let registry = registry.clone();
                let clock = clock.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let sid = format!("sid{}", i % 16);
                        let user = users[(t + i) % 2];
                        match (t + i) % 4 {
                            0 => {
                                registry.insert(&sid, Account::new(0, user, false), Duration::from_secs(5));
                            }
                            1 => {
                                registry.invalidate(&sid);
                            }
                            2 => {
                                clock.advance(Duration::from_secs(1));
                                registry.lookup(&sid);
                            }
                            _ => {
                                registry.purge_expired();
                            }
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker panicked");
        }

        registry.purge_expired();
        assert_consistent(&registry, &users);
    }
}
