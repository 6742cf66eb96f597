//! Background expiry.
//!
//! Lazy expiry in `SessionStore::get` only catches ids that are read again.
//! The sweeper purges everything else on a fixed period until shutdown.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::services::session::SessionRegistry;

pub fn spawn(
    registry: Arc<SessionRegistry>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = registry.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "expired sessions purged");
                    }
                }
            }
        }

        tracing::info!("session sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Account;
    use crate::services::clock::ManualClock;

    #[tokio::test]
    async fn test_spawn_purges_expired_and_stops_on_cancel() {
        let clock = Arc::new(ManualClock::new());
        let registry = Arc::new(SessionRegistry::new(clock.clone(), Duration::from_secs(60)));
        registry.insert("sid1", Account::new(1, "alice", false), Duration::from_secs(60));
        clock.advance(Duration::from_secs(61));

        let shutdown = CancellationToken::new();
        let handle = spawn(registry.clone(), Duration::from_millis(10), shutdown.clone());

        tokio::time::timeout(Duration::from_secs(5), async {
            while registry.store().len() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("sweeper should purge the expired session");
        assert!(registry.sessions_of("alice").is_empty());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper should stop")
            .expect("sweeper task panicked");
    }
}
