//! Synthetic record feed.
//!
//! A background task that submits records between random personas at random
//! intervals until it is told to stop. Cancellation goes through a
//! `tokio::sync::watch` channel and is observed at every iteration boundary
//! and while sleeping.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use sealedger_store::ContainerStore;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// Identities the feed picks senders and receivers from.
pub const PERSONAS: &[&str] = &[
    "Alice", "Bob", "Toto", "Jean", "Jacques", "Baptiste", "Antoine", "Yves", "Juan", "Hugo",
    "Ben", "Angelo", "Manu", "Axel", "Anais", "Lea",
];

/// Goods named in synthetic payloads.
pub const GOODS: &[&str] = &["pizzas", "pieces", "bitcoins"];

/// Largest amount in a synthetic payload.
pub const MAX_AMOUNT: u32 = 10_000;

/// Pacing of the synthetic feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_interval: Duration::from_secs(5),
        }
    }
}

impl FeedConfig {
    fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_interval <= self.min_interval {
            return self.min_interval;
        }
        rng.gen_range(self.min_interval..=self.max_interval)
    }
}

/// Counts reported when the feed stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub inserted: u64,
    pub failed: u64,
}

/// One generated entry: `(sender, receiver, payload)`.
pub fn synthetic_entry<R: Rng + ?Sized>(rng: &mut R) -> (String, String, String) {
    let sender = PERSONAS.choose(rng).copied().unwrap_or("Alice");
    let receiver = PERSONAS.choose(rng).copied().unwrap_or("Bob");
    let good = GOODS.choose(rng).copied().unwrap_or("pieces");
    let amount = rng.gen_range(0..=MAX_AMOUNT);
    (
        sender.to_string(),
        receiver.to_string(),
        format!("{amount} {good}"),
    )
}

/// Run the feed against `ledger` until `cancel` turns `true` or its sender
/// is dropped.
pub fn spawn_feed<S>(
    ledger: Arc<Ledger<S>>,
    config: FeedConfig,
    mut cancel: watch::Receiver<bool>,
) -> JoinHandle<FeedStats>
where
    S: ContainerStore + 'static,
{
    tokio::spawn(async move {
        let mut stats = FeedStats::default();

        loop {
            if *cancel.borrow() {
                break;
            }

            // thread_rng is not Send; keep it out of scope across awaits.
            let ((sender, receiver, payload), delay) = {
                let mut rng = rand::thread_rng();
                (synthetic_entry(&mut rng), config.next_delay(&mut rng))
            };

            let task_ledger = Arc::clone(&ledger);
            let submitted =
                tokio::task::spawn_blocking(move || task_ledger.submit(sender, receiver, payload))
                    .await;

            match submitted {
                Ok(Ok(receipt)) => {
                    stats.inserted += 1;
                    tracing::debug!(
                        record = %receipt.record_id,
                        container = receipt.container_index,
                        "feed inserted record"
                    );
                }
                Ok(Err(e)) => {
                    stats.failed += 1;
                    tracing::warn!(error = %e, "feed insert failed");
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(error = %e, "feed insert task panicked");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = cancel.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            inserted = stats.inserted,
            failed = stats.failed,
            "feed stopped"
        );
        stats
    })
}

/// A running feed and the means to stop it.
pub struct FeedHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<FeedStats>,
}

impl FeedHandle {
    /// Start a feed on the current tokio runtime.
    pub fn spawn<S>(ledger: Arc<Ledger<S>>, config: FeedConfig) -> Self
    where
        S: ContainerStore + 'static,
    {
        let (cancel, rx) = watch::channel(false);
        let task = spawn_feed(ledger, config, rx);
        Self { cancel, task }
    }

    /// Signal cancellation and wait for the feed to finish.
    pub async fn stop(self) -> Result<FeedStats> {
        // A closed receiver means the task already exited.
        let _ = self.cancel.send(true);
        self.task
            .await
            .map_err(|e| LedgerError::Task(e.to_string()))
    }
}

impl std::fmt::Debug for FeedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sealedger_core::{KeyAlgorithm, SealPolicy};
    use sealedger_store::{KeyStore, MemoryContainerStore};

    fn ledger() -> Arc<Ledger<MemoryContainerStore>> {
        let ledger = Ledger::new(
            MemoryContainerStore::new(),
            Arc::new(KeyStore::in_memory(KeyAlgorithm::Ed25519)),
            SealPolicy::new(10, 1).unwrap(),
        );
        ledger.reload().unwrap();
        Arc::new(ledger)
    }

    #[test]
    fn test_synthetic_entry_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let (sender, receiver, payload) = synthetic_entry(&mut rng);
            assert!(PERSONAS.contains(&sender.as_str()));
            assert!(PERSONAS.contains(&receiver.as_str()));

            let (amount, good) = payload.split_once(' ').unwrap();
            assert!(amount.parse::<u32>().unwrap() <= MAX_AMOUNT);
            assert!(GOODS.contains(&good));
        }
    }

    #[test]
    fn test_delay_within_bounds() {
        let config = FeedConfig {
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(20),
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let delay = config.next_delay(&mut rng);
            assert!(delay >= config.min_interval && delay <= config.max_interval);
        }

        let fixed = FeedConfig {
            min_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(5),
        };
        assert_eq!(fixed.next_delay(&mut rng), Duration::from_millis(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_feed_inserts_until_stopped() {
        let ledger = ledger();
        let handle = FeedHandle::spawn(
            Arc::clone(&ledger),
            FeedConfig {
                min_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
            },
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stats = handle.stop().await.unwrap();

        assert!(stats.inserted > 0);
        assert_eq!(stats.failed, 0);
        assert_eq!(ledger.record_count().unwrap() as u64, stats.inserted);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_long_sleep() {
        let ledger = ledger();
        let handle = FeedHandle::spawn(
            Arc::clone(&ledger),
            FeedConfig {
                min_interval: Duration::from_secs(3600),
                max_interval: Duration::from_secs(3600),
            },
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stats = tokio::time::timeout(Duration::from_secs(5), handle.stop())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stats.inserted, 1);
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_feed() {
        let ledger = ledger();
        let (tx, rx) = watch::channel(false);
        let task = spawn_feed(
            Arc::clone(&ledger),
            FeedConfig {
                min_interval: Duration::from_secs(3600),
                max_interval: Duration::from_secs(3600),
            },
            rx,
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(tx);
        let stats = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(stats.inserted <= 1);
    }
}
