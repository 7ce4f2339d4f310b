/// `MempoolView` (spec §2 "the mempool tracker"): read side of the poller
/// that tracks unconfirmed transactions. `MempoolState` is the concrete
/// adapter, keeping the teacher's `RwLock<HashMap<String, _>>` snapshot
/// shape and polling loop, extended with an address→outpoint-touch index so
/// `Worker::build_address` can answer "does this address have mempool
/// activity" without re-decoding every unconfirmed tx per request.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cache::TxCache;
use crate::chain::ChainParser;
use crate::errors::WorkerError;
use crate::rpc::NodeClient;
use crate::types::{AddrDesc, MempoolEntry, MempoolTouch};

pub trait MempoolView: Send + Sync {
    fn size(&self) -> usize;
    /// Insertion order, first-seen wins on duplicates (spec §5 "mempool txs:
    /// insertion order ... duplicates suppressed by first-seen").
    fn txids(&self) -> Vec<String>;
    fn entry(&self, txid: &str) -> Option<MempoolEntry>;
    fn touches_for_address(&self, addr_desc: &AddrDesc) -> Vec<MempoolTouch>;
}

struct MempoolTxRecord {
    entry: MempoolEntry,
    order: usize,
}

/// Shared mempool state, populated by `run_mempool_monitor`. Plain
/// `std::sync::RwLock` rather than `tokio::sync::RwLock`: the collaborators
/// feeding it (`NodeClient`, `TxCache`) are synchronous, and the critical
/// sections here never hold the lock across an `.await`.
pub struct MempoolState {
    transactions: RwLock<HashMap<String, MempoolTxRecord>>,
    addr_index: RwLock<HashMap<AddrDesc, Vec<MempoolTouch>>>,
    next_order: std::sync::atomic::AtomicUsize,
}

impl MempoolState {
    pub fn new() -> Self {
        MempoolState {
            transactions: RwLock::new(HashMap::new()),
            addr_index: RwLock::new(HashMap::new()),
            next_order: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Reconciles the tracked set with a fresh `getrawmempool` snapshot:
    /// drops confirmed/evicted txids, decodes and indexes newly seen ones.
    pub fn reconcile(&self, current_txids: Vec<String>, tx_cache: &dyn TxCache, parser: &dyn ChainParser, now_unix: i64) {
        let current: std::collections::HashSet<String> = current_txids.iter().cloned().collect();

        let removed: Vec<String> = {
            let txs = self.transactions.read().unwrap();
            txs.keys().filter(|txid| !current.contains(*txid)).cloned().collect()
        };
        if !removed.is_empty() {
            let mut txs = self.transactions.write().unwrap();
            for txid in &removed {
                txs.remove(txid);
            }
            let mut index = self.addr_index.write().unwrap();
            for touches in index.values_mut() {
                touches.retain(|t| !removed.contains(&t.txid));
            }
            index.retain(|_, touches| !touches.is_empty());
        }

        let new_txids: Vec<String> = {
            let txs = self.transactions.read().unwrap();
            current_txids.into_iter().filter(|txid| !txs.contains_key(txid)).collect()
        };

        for txid in new_txids {
            let order = self.next_order.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.transactions
                .write()
                .unwrap()
                .insert(txid.clone(), MempoolTxRecord { entry: MempoolEntry { txid: txid.clone(), first_seen: now_unix }, order });

            let Ok(parsed) = tx_cache.get_transaction(&txid) else { continue };

            for (idx, vout) in parsed.vout.iter().enumerate() {
                if !parser.classify(&vout.script_pubkey).is_indexable() {
                    continue;
                }
                let desc = parser.addr_desc_for_script(&vout.script_pubkey);
                self.addr_index
                    .write()
                    .unwrap()
                    .entry(desc)
                    .or_default()
                    .push(MempoolTouch { txid: txid.clone(), vout: idx as u32 });
            }

            for vin in &parsed.vin {
                let Some((prev_txid, prev_vout)) = &vin.prevout else { continue };
                let Ok(prev_tx) = tx_cache.get_transaction(prev_txid) else { continue };
                let Some(out) = prev_tx.vout.get(*prev_vout as usize) else { continue };
                if !parser.classify(&out.script_pubkey).is_indexable() {
                    continue;
                }
                let desc = parser.addr_desc_for_script(&out.script_pubkey);
                self.addr_index
                    .write()
                    .unwrap()
                    .entry(desc)
                    .or_default()
                    .push(MempoolTouch { txid: txid.clone(), vout: *prev_vout });
            }
        }
    }
}

impl MempoolView for MempoolState {
    fn size(&self) -> usize {
        self.transactions.read().unwrap().len()
    }

    fn txids(&self) -> Vec<String> {
        let txs = self.transactions.read().unwrap();
        let mut ordered: Vec<&MempoolTxRecord> = txs.values().collect();
        ordered.sort_by_key(|r| r.order);
        ordered.into_iter().map(|r| r.entry.txid.clone()).collect()
    }

    fn entry(&self, txid: &str) -> Option<MempoolEntry> {
        self.transactions.read().unwrap().get(txid).map(|r| r.entry.clone())
    }

    fn touches_for_address(&self, addr_desc: &AddrDesc) -> Vec<MempoolTouch> {
        self.addr_index.read().unwrap().get(addr_desc).cloned().unwrap_or_default()
    }
}

/// Background poller: refreshes `MempoolState` from `NodeClient` on a fixed
/// interval. Mirrors the teacher's loop structure; the eviction/index work
/// is now in `MempoolState::reconcile`. Runs the blocking RPC + reconcile
/// step via `spawn_blocking` since both `NodeClient` and `TxCache` are
/// synchronous.
pub async fn run_mempool_monitor(
    mempool_state: Arc<MempoolState>,
    node: Arc<dyn NodeClient>,
    tx_cache: Arc<dyn TxCache>,
    parser: Arc<dyn ChainParser>,
    poll_interval_secs: u64,
) -> Result<(), WorkerError> {
    loop {
        tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;

        let state = mempool_state.clone();
        let node = node.clone();
        let tx_cache = tx_cache.clone();
        let parser = parser.clone();

        let result = tokio::task::spawn_blocking(move || -> Result<(), WorkerError> {
            let txids = node.get_mempool_txids()?;
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64;
            state.reconcile(txids, tx_cache.as_ref(), parser.as_ref(), now);
            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to refresh mempool snapshot"),
            Err(e) => tracing::warn!(error = %e, "mempool refresh task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ParsedTx;
    use crate::chain::{Network, PivxParser};

    struct FakeTxCache {
        txs: HashMap<String, Arc<ParsedTx>>,
    }

    impl TxCache for FakeTxCache {
        fn get_transaction(&self, txid: &str) -> Result<Arc<ParsedTx>, WorkerError> {
            self.txs.get(txid).cloned().ok_or_else(|| WorkerError::not_found(txid))
        }
        fn invalidate(&self, _txid: &str) {}
    }

    fn p2pkh_script(byte: u8) -> Vec<u8> {
        let mut s = vec![0x76, 0xa9, 0x14];
        s.extend_from_slice(&[byte; 20]);
        s.push(0x88);
        s.push(0xac);
        s
    }

    #[test]
    fn reconcile_indexes_new_tx_outputs_and_evicts_on_confirmation() {
        let state = MempoolState::new();
        let parser = PivxParser::new(Network::Main);

        let mut txs = HashMap::new();
        txs.insert(
            "tx1".to_string(),
            Arc::new(ParsedTx {
                txid: "tx1".into(),
                version: 1,
                lock_time: 0,
                hex: String::new(),
                vin: Vec::new(),
                vout: vec![crate::cache::ParsedVout { value_sat: 10, script_pubkey: p2pkh_script(0xAB) }],
            }),
        );
        let cache = FakeTxCache { txs };

        state.reconcile(vec!["tx1".to_string()], &cache, &parser, 1000);
        assert_eq!(state.size(), 1);
        assert_eq!(state.txids(), vec!["tx1".to_string()]);

        let desc = parser.addr_desc_for_script(&p2pkh_script(0xAB));
        assert_eq!(state.touches_for_address(&desc).len(), 1);

        state.reconcile(vec![], &cache, &parser, 1001);
        assert_eq!(state.size(), 0);
        assert!(state.touches_for_address(&desc).is_empty());
    }
}
