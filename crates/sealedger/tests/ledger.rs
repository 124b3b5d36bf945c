//! End-to-end ledger behavior over both container stores.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sealedger::core::{KeyAlgorithm, PreviousDigest};
use sealedger::{
    FeedConfig, FeedHandle, KeyStore, Ledger, LedgerConfig, MemoryContainerStore, RecordId,
    SealPolicy,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn memory_ledger(policy: SealPolicy) -> Arc<Ledger<MemoryContainerStore>> {
    init_tracing();
    let ledger = Ledger::new(
        MemoryContainerStore::new(),
        Arc::new(KeyStore::in_memory(KeyAlgorithm::Ed25519)),
        policy,
    );
    ledger.reload().unwrap();
    Arc::new(ledger)
}

#[test]
fn ten_records_seal_one_container() {
    let ledger = memory_ledger(SealPolicy::default());
    let identities = ["Alice", "Bob"];

    let ids: Vec<RecordId> = (0..10)
        .map(|i| {
            let sender = identities[i % 2];
            let receiver = identities[(i + 1) % 2];
            ledger
                .submit(sender, receiver, format!("{i} pizzas"))
                .unwrap()
                .record_id
        })
        .collect();

    let containers = ledger.snapshot().unwrap();
    assert_eq!(containers.len(), 1);
    assert!(containers[0].is_full());
    assert!(containers[0].digest().to_hex().starts_with("00"));
    assert!(containers[0].is_valid());

    let recent: Vec<RecordId> = ledger
        .recent(3)
        .unwrap()
        .iter()
        .map(|r| *r.id())
        .collect();
    assert_eq!(recent, vec![ids[9], ids[8], ids[7]]);

    let fifth = ids[4];
    let report = ledger.check(&fifth).unwrap().unwrap();
    assert!(report.hash_valid);
    assert!(report.signature_valid);
    assert!(report.container_valid);

    assert!(ledger.tamper(&fifth).unwrap());
    let report = ledger.check(&fifth).unwrap().unwrap();
    assert!(!report.hash_valid);
    assert!(!report.signature_valid);
    assert!(!report.container_valid);
}

#[test]
fn reload_from_disk_reproduces_ledger() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig::new(dir.path());

    let before = {
        let ledger = Ledger::open(&config).unwrap();
        for i in 0..23 {
            ledger.submit("Alice", "Bob", format!("{i} bitcoins")).unwrap();
        }
        ledger.snapshot().unwrap()
    };

    let ledger = Ledger::open(&config).unwrap();
    let after = ledger.snapshot().unwrap();

    assert_eq!(after.len(), 3);
    assert_eq!(after, before);
    for (i, container) in after.iter().enumerate() {
        assert_eq!(container.index(), i as u64);
    }
    assert!(after[0].previous().is_genesis());
    assert_eq!(
        *after[2].previous(),
        PreviousDigest::Digest(*after[1].digest())
    );

    // Keys were loaded from disk, so signatures still verify.
    let newest = ledger.recent(1).unwrap();
    let report = ledger.check(newest[0].id()).unwrap().unwrap();
    assert!(report.hash_valid && report.signature_valid);
}

#[test]
fn reload_does_not_remine() {
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig::new(dir.path());
    {
        let ledger = Ledger::open(&config).unwrap();
        for i in 0..10 {
            ledger.submit("Alice", "Bob", format!("{i}")).unwrap();
        }
    }

    let path = dir.path().join("blocks/0.block");
    let written = std::fs::read_to_string(&path).unwrap();
    let ledger = Ledger::open(&config).unwrap();
    let container = &ledger.snapshot().unwrap()[0];

    assert_eq!(container.to_text(), written);
    assert!(container.is_valid());
}

#[test]
fn edited_block_file_loads_but_fails_checks() {
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig::new(dir.path());
    let target = {
        let ledger = Ledger::open(&config).unwrap();
        let ids: Vec<RecordId> = (0..10)
            .map(|i| {
                ledger
                    .submit("Alice", "Bob", format!("{i} pieces"))
                    .unwrap()
                    .record_id
            })
            .collect();
        ids[2]
    };

    let path = dir.path().join("blocks/0.block");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replacen("\"2 pieces\"", "\"2000 pieces\"", 1)).unwrap();

    let ledger = Ledger::open(&config).unwrap();
    let report = ledger.check(&target).unwrap().unwrap();
    assert!(!report.hash_valid);
    assert!(!report.signature_valid);
    assert!(!report.container_valid);
    assert!(!ledger.audit().unwrap().is_clean());
}

#[test]
fn malformed_block_aborts_open() {
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig::new(dir.path());
    {
        let ledger = Ledger::open(&config).unwrap();
        ledger.submit("Alice", "Bob", "1 pizzas").unwrap();
    }

    let path = dir.path().join("blocks/0.block");
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace("\"sender\"", "\"from\"")).unwrap();

    assert!(Ledger::open(&config).is_err());
}

#[test]
fn concurrent_inserts_are_not_lost() {
    let ledger = memory_ledger(SealPolicy::new(4, 1).unwrap());
    let threads = 4;
    let per_thread = 15;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|i| {
                        ledger
                            .submit(format!("user-{t}"), "Bob", format!("{i} pieces"))
                            .unwrap()
                            .record_id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut submitted = HashSet::new();
    for handle in handles {
        submitted.extend(handle.join().unwrap());
    }

    let total = threads * per_thread;
    let recent: HashSet<RecordId> = ledger
        .recent(total)
        .unwrap()
        .iter()
        .map(|r| *r.id())
        .collect();
    assert_eq!(submitted.len(), total);
    assert_eq!(recent, submitted);

    let containers = ledger.snapshot().unwrap();
    for pair in containers.windows(2) {
        assert!(pair[0].is_full());
        assert!(pair[0].is_valid());
        assert_eq!(
            *pair[1].previous(),
            PreviousDigest::Digest(*pair[0].digest())
        );
    }
}

#[test]
fn tampered_predecessor_keeps_captured_link() {
    let ledger = memory_ledger(SealPolicy::new(3, 1).unwrap());
    let ids: Vec<RecordId> = (0..5)
        .map(|i| ledger.submit("Alice", "Bob", format!("{i}")).unwrap().record_id)
        .collect();
    let link_before = *ledger.snapshot().unwrap()[1].previous();

    ledger.tamper(&ids[0]).unwrap();

    let containers = ledger.snapshot().unwrap();
    assert_eq!(*containers[1].previous(), link_before);
    assert!(!containers[0].is_valid());

    // Records in the later container are unaffected.
    let report = ledger.check(&ids[4]).unwrap().unwrap();
    assert!(report.hash_valid && report.signature_valid);
}

#[test]
fn unknown_ids_are_not_found() {
    let ledger = memory_ledger(SealPolicy::default());
    ledger.submit("Alice", "Bob", "1 pizzas").unwrap();

    let unknown = RecordId::generate();
    assert!(ledger.check(&unknown).unwrap().is_none());
    assert!(!ledger.tamper(&unknown).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn feed_and_foreground_share_ledger() {
    let ledger = memory_ledger(SealPolicy::new(5, 1).unwrap());
    let feed = FeedHandle::spawn(
        Arc::clone(&ledger),
        FeedConfig {
            min_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(3),
        },
    );

    let foreground = {
        let ledger = Arc::clone(&ledger);
        tokio::task::spawn_blocking(move || {
            (0..20)
                .map(|i| {
                    ledger
                        .submit("Alice", "Bob", format!("{i} pizzas"))
                        .unwrap()
                        .record_id
                })
                .collect::<Vec<_>>()
        })
        .await
        .unwrap()
    };

    let stats = feed.stop().await.unwrap();
    let total = foreground.len() + stats.inserted as usize;

    assert_eq!(stats.failed, 0);
    assert_eq!(ledger.record_count().unwrap(), total);

    let recent: HashSet<RecordId> = ledger
        .recent(total)
        .unwrap()
        .iter()
        .map(|r| *r.id())
        .collect();
    assert!(foreground.iter().all(|id| recent.contains(id)));
    assert!(ledger.audit().unwrap().is_clean());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn recent_is_newest_first_prefix(
        capacity in 1usize..=4,
        inserts in 0usize..=12,
        n in 0usize..=16,
    ) {
        let ledger = memory_ledger(SealPolicy::new(capacity, 0).unwrap());
        let ids: Vec<RecordId> = (0..inserts)
            .map(|i| ledger.submit("Alice", "Bob", format!("{i}")).unwrap().record_id)
            .collect();

        let got: Vec<RecordId> = ledger.recent(n).unwrap().iter().map(|r| *r.id()).collect();
        let want: Vec<RecordId> = ids.iter().rev().take(n).copied().collect();
        prop_assert_eq!(got, want);

        let expected_containers = if inserts == 0 { 1 } else { (inserts + capacity - 1) / capacity };
        prop_assert_eq!(ledger.container_count().unwrap(), expected_containers);
    }
}
