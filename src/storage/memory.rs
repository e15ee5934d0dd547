//! In-memory record store with optional JSON-file persistence.
//!
//! With a persistence path set, every mutation rewrites the snapshot
//! through a temporary file that is renamed over the target, so the file
//! on disk is always a complete snapshot.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::storage::records::{Mirrored, Participants, PayoutRecord, StakeRecord, StoreStats};
use crate::storage::{GameStore, StoreError, StoreResult};

/// On-disk layout, records in insertion order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    stakes: Vec<StakeRecord>,
    #[serde(default)]
    pay_winners: Vec<PayoutRecord>,
}

/// A thread-safe store keyed by insertion sequence.
#[derive(Clone, Default)]
pub struct MemoryStore {
    stakes: Arc<DashMap<u64, StakeRecord>>,
    payouts: Arc<DashMap<u64, PayoutRecord>>,
    seq: Arc<AtomicU64>,
    persistence_path: Option<String>,
    /// Serializes snapshot writers sharing the temporary file.
    write_lock: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from file if it exists; otherwise start empty with that path.
    pub fn load_from_file(path: &str) -> StoreResult<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let file = File::open(path)?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;

            for record in snapshot.stakes {
                store.stakes.insert(store.next_seq(), record);
            }
            for record in snapshot.pay_winners {
                store.payouts.insert(store.next_seq(), record);
            }
            tracing::info!(
                stakes = store.stakes.len(),
                pay_winners = store.payouts.len(),
                path = %path,
                "Loaded records from file"
            );
        }
        Ok(store)
    }

    /// Write every record to the persistence path, if one is set.
    ///
    /// Returns only once the bytes are flushed and synced and the
    /// temporary file has replaced the previous snapshot.
    pub fn save_to_file(&self) -> StoreResult<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("snapshot writer poisoned".into()))?;

        let snapshot = Snapshot {
            stakes: ordered(&self.stakes),
            pay_winners: ordered(&self.payouts),
        };
        let tmp_path = format!("{}.tmp", path);
        let file = write_snapshot(File::create(&tmp_path)?, &snapshot)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        tracing::debug!(
            stakes = snapshot.stakes.len(),
            pay_winners = snapshot.pay_winners.len(),
            path = %path,
            "Saved records to file"
        );
        Ok(())
    }

    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }

    pub fn payout_count(&self) -> usize {
        self.payouts.len()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Write-through after a mutation. On error the change stays in memory
    /// and lands with the next successful write.
    async fn persist(&self) -> StoreResult<()> {
        if self.persistence_path.is_none() {
            return Ok(());
        }
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save_to_file())
            .await
            .map_err(|e| StoreError::Unavailable(format!("snapshot task failed: {}", e)))?
    }
}

/// Serialize through a buffer and surface the final flush error.
fn write_snapshot<W: Write>(writer: W, snapshot: &Snapshot) -> StoreResult<W> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, snapshot)?;
    writer.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}

fn set_status<T: Mirrored>(map: &DashMap<u64, T>, digest: &str, status: &str) -> usize {
    let mut matched = 0;
    for mut entry in map.iter_mut() {
        if entry.transaction_digest() == digest {
            entry.set_status(status);
            matched += 1;
        }
    }
    matched
}

fn ordered<T: Clone>(map: &DashMap<u64, T>) -> Vec<T> {
    let mut entries: Vec<(u64, T)> = map.iter().map(|r| (*r.key(), r.value().clone())).collect();
    entries.sort_by_key(|(seq, _)| *seq);
    entries.into_iter().map(|(_, v)| v).collect()
}

/// Newest first by timestamp, ties broken by later insertion first.
fn recent<T>(map: &DashMap<u64, T>, address: &str, limit: usize) -> Vec<T>
where
    T: Clone + Participants,
{
    let mut matches: Vec<(u64, T)> = map
        .iter()
        .filter(|r| r.value().involves(address))
        .map(|r| (*r.key(), r.value().clone()))
        .collect();
    matches.sort_by(|(sa, a), (sb, b)| b.timestamp().cmp(&a.timestamp()).then(sb.cmp(sa)));
    matches.truncate(limit);
    matches.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_stake(&self, record: StakeRecord) -> StoreResult<()> {
        self.stakes.insert(self.next_seq(), record);
        self.persist().await
    }

    async fn insert_payout(&self, record: PayoutRecord) -> StoreResult<()> {
        self.payouts.insert(self.next_seq(), record);
        self.persist().await
    }

    async fn recent_stakes(&self, address: &str, limit: usize) -> StoreResult<Vec<StakeRecord>> {
        Ok(recent(&self.stakes, address, limit))
    }

    async fn recent_payouts(&self, address: &str, limit: usize) -> StoreResult<Vec<PayoutRecord>> {
        Ok(recent(&self.payouts, address, limit))
    }

    async fn update_stake_status(&self, transaction_digest: &str, status: &str) -> StoreResult<usize> {
        let matched = set_status(&self.stakes, transaction_digest, status);
        if matched > 0 {
            self.persist().await?;
        }
        Ok(matched)
    }

    async fn update_payout_status(&self, transaction_digest: &str, status: &str) -> StoreResult<usize> {
        let matched = set_status(&self.payouts, transaction_digest, status);
        if matched > 0 {
            self.persist().await?;
        }
        Ok(matched)
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let mut players: HashSet<String> = HashSet::new();
        for r in self.stakes.iter() {
            players.insert(r.requester().to_string());
            players.insert(r.accepter().to_string());
        }
        for r in self.payouts.iter() {
            players.insert(r.requester().to_string());
            players.insert(r.accepter().to_string());
        }
        Ok(StoreStats {
            stakes: self.stakes.len(),
            payouts: self.payouts.len(),
            players: players.len(),
        })
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("stakes", &self.stakes.len())
            .field("pay_winners", &self.payouts.len())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::STATUS_COMPLETED;

    fn stake(id: &str, requester: &str, accepter: &str, timestamp: i64) -> StakeRecord {
        StakeRecord {
            id: id.to_string(),
            requester_coin_id: "0xc1".into(),
            accepter_coin_id: "0xc2".into(),
            requester_address: requester.into(),
            accepter_address: accepter.into(),
            stake_amount: 1_000,
            status: STATUS_COMPLETED.into(),
            timestamp,
            transaction_digest: format!("digest-{}", id),
        }
    }

    #[tokio::test]
    async fn test_recent_stakes_order_and_filter() {
        let store = MemoryStore::new(None);
        store.insert_stake(stake("s1", "0xa", "0xb", 100)).await.unwrap();
        store.insert_stake(stake("s2", "0xc", "0xa", 300)).await.unwrap();
        store.insert_stake(stake("s3", "0xc", "0xd", 400)).await.unwrap();
        store.insert_stake(stake("s4", "0xa", "0xd", 300)).await.unwrap();

        let ids: Vec<String> = store
            .recent_stakes("0xa", 50)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        // s2 and s4 share a timestamp; the later insert comes first.
        assert_eq!(ids, vec!["s4", "s2", "s1"]);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let store = MemoryStore::new(None);
        for i in 0..5 {
            store
                .insert_stake(stake(&format!("s{}", i), "0xa", "0xb", i))
                .await
                .unwrap();
        }
        let records = store.recent_stakes("0xb", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "s4");
        assert!(store.recent_stakes("0xzz", 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_round_trip_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let path = path.to_str().unwrap();

        let store = MemoryStore::load_from_file(path).unwrap();
        store.insert_stake(stake("s1", "0xa", "0xb", 10)).await.unwrap();
        store.insert_stake(stake("s2", "0xa", "0xb", 10)).await.unwrap();
        store
            .insert_payout(PayoutRecord {
                id: "p1".into(),
                requester_address: "0xa".into(),
                accepter_address: "0xb".into(),
                requester_score: 7,
                accepter_score: 3,
                stake_amount: 1_000,
                status: STATUS_COMPLETED.into(),
                timestamp: 20,
                transaction_digest: "digest-p1".into(),
            })
            .await
            .unwrap();
        store.save_to_file().unwrap();

        let reloaded = MemoryStore::load_from_file(path).unwrap();
        assert_eq!(reloaded.stake_count(), 2);
        assert_eq!(reloaded.payout_count(), 1);
        let ids: Vec<String> = reloaded
            .recent_stakes("0xa", 50)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = MemoryStore::load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, crate::storage::StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_insert_writes_through_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let path = path.to_str().unwrap();

        let store = MemoryStore::load_from_file(path).unwrap();
        store.insert_stake(stake("s1", "0xa", "0xb", 10)).await.unwrap();

        // No explicit save: the insert already reached disk.
        let reloaded = MemoryStore::load_from_file(path).unwrap();
        assert_eq!(reloaded.stake_count(), 1);
        assert!(!Path::new(&format!("{}.tmp", path)).exists());
    }

    #[derive(Debug)]
    struct RejectingWriter;

    impl Write for RejectingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_buffered_write_failure_is_reported() {
        // Small enough to sit in the buffer until the final flush.
        let snapshot = Snapshot {
            stakes: vec![stake("s1", "0xa", "0xb", 10)],
            pay_winners: Vec::new(),
        };
        let err = write_snapshot(RejectingWriter, &snapshot).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(err.to_string().contains("no space left"));
    }

    #[tokio::test]
    async fn test_failed_write_through_surfaces_and_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("records.json");
        let store = MemoryStore::new(Some(path.to_str().unwrap().to_string()));

        let err = store.insert_stake(stake("s1", "0xa", "0xb", 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.stake_count(), 1);
        assert!(store.save_to_file().is_err());
    }

    #[tokio::test]
    async fn test_update_status_by_digest() {
        let store = MemoryStore::new(None);
        store.insert_stake(stake("s1", "0xa", "0xb", 10)).await.unwrap();
        store.insert_stake(stake("s2", "0xa", "0xb", 20)).await.unwrap();

        assert_eq!(store.update_stake_status("digest-s1", "refunded").await.unwrap(), 1);
        assert_eq!(store.update_stake_status("digest-none", "refunded").await.unwrap(), 0);
        assert_eq!(store.update_payout_status("digest-s1", "refunded").await.unwrap(), 0);

        let records = store.recent_stakes("0xa", 50).await.unwrap();
        assert_eq!(records[0].status, STATUS_COMPLETED);
        assert_eq!(records[1].status, "refunded");
    }

    #[tokio::test]
    async fn test_stats_counts_distinct_players() {
        let store = MemoryStore::new(None);
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        store.insert_stake(stake("s1", "0xa", "0xb", 10)).await.unwrap();
        store.insert_stake(stake("s2", "0xb", "0xc", 20)).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.stakes, 2);
        assert_eq!(stats.payouts, 0);
        assert_eq!(stats.players, 3);
    }
}
