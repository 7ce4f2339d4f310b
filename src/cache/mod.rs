/// `TxCache`: memoizing fetcher over `NodeClient` (spec §2, §4.1 "cached
/// transaction fetcher"). Grounded in the teacher's `CacheManager` — same
/// `lru::LruCache` shape, specialized to one kind of entry instead of the
/// teacher's five parallel caches, since the Worker only ever needs decoded
/// transactions through this seam. `NodeClient` is a blocking interface (the
/// teacher's RPC clients are `reqwest::blocking`/synchronous), so this cache
/// is synchronous too, guarded by a `std::sync::Mutex` rather than the
/// teacher's `tokio::sync::RwLock`.
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::errors::WorkerError;
use crate::rpc::NodeClient;

#[derive(Debug, Clone)]
pub struct ParsedVin {
    pub prevout: Option<(String, u32)>,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub coinbase: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct ParsedVout {
    pub value_sat: i64,
    pub script_pubkey: Vec<u8>,
}

/// Decoded transaction as the Worker needs it. Legacy fields (version,
/// locktime, inputs, outputs) always decode; PIVX's sapling extension
/// (tx version >= 3) is carried only as raw hex, never interpreted, matching
/// the shielded-pool exclusion of the Worker's own scope.
#[derive(Debug, Clone)]
pub struct ParsedTx {
    pub txid: String,
    pub version: i32,
    pub lock_time: u32,
    pub hex: String,
    pub vin: Vec<ParsedVin>,
    pub vout: Vec<ParsedVout>,
}

pub trait TxCache: Send + Sync {
    fn get_transaction(&self, txid: &str) -> Result<Arc<ParsedTx>, WorkerError>;
    fn invalidate(&self, txid: &str);
}

pub struct LruTxCache {
    node: Arc<dyn NodeClient>,
    entries: Mutex<LruCache<String, Arc<ParsedTx>>>,
}

impl LruTxCache {
    pub fn new(node: Arc<dyn NodeClient>, capacity: usize) -> Self {
        LruTxCache { node, entries: Mutex::new(LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap())) }
    }
}

impl TxCache for LruTxCache {
    fn get_transaction(&self, txid: &str) -> Result<Arc<ParsedTx>, WorkerError> {
        if let Some(cached) = self.entries.lock().unwrap().get(txid).cloned() {
            return Ok(cached);
        }
        let hex_str = self.node.get_raw_transaction_hex(txid)?;
        let parsed = Arc::new(decode_raw_transaction(txid, &hex_str)?);
        self.entries.lock().unwrap().put(txid.to_string(), parsed.clone());
        Ok(parsed)
    }

    fn invalidate(&self, txid: &str) {
        self.entries.lock().unwrap().pop(txid);
    }
}

/// Decodes the Bitcoin-legacy portion of a raw tx (everything PIVX v1/v2
/// shares with Bitcoin) via the `bitcoin` crate's consensus codec. Extra
/// bytes past the legacy body (PIVX v3 sapling data) are left undecoded.
fn decode_raw_transaction(txid: &str, hex_str: &str) -> Result<ParsedTx, WorkerError> {
    let raw = hex::decode(hex_str).map_err(|e| WorkerError::internal_msg(e.to_string()))?;
    let (tx, _consumed): (bitcoin::Transaction, usize) =
        bitcoin::consensus::deserialize_partial(&raw).map_err(|e| WorkerError::internal_msg(e.to_string()))?;

    let vin = tx
        .input
        .iter()
        .map(|input| {
            let is_coinbase = input.previous_output.txid == bitcoin::Txid::default();
            ParsedVin {
                prevout: if is_coinbase {
                    None
                } else {
                    Some((input.previous_output.txid.to_string(), input.previous_output.vout))
                },
                script_sig: input.script_sig.as_bytes().to_vec(),
                sequence: input.sequence,
                coinbase: if is_coinbase { Some(input.script_sig.as_bytes().to_vec()) } else { None },
            }
        })
        .collect();

    let vout = tx
        .output
        .iter()
        .map(|output| ParsedVout { value_sat: output.value as i64, script_pubkey: output.script_pubkey.as_bytes().to_vec() })
        .collect();

    Ok(ParsedTx {
        txid: txid.to_string(),
        version: tx.version,
        lock_time: tx.lock_time,
        hex: hex_str.to_string(),
        vin,
        vout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNode {
        hex: String,
        calls: AtomicUsize,
    }

    impl NodeClient for CountingNode {
        fn get_block_by_height(&self, _height: i32) -> Result<crate::rpc::RawBlock, WorkerError> {
            unimplemented!()
        }
        fn get_block_by_hash(&self, _hash: &str) -> Result<crate::rpc::RawBlock, WorkerError> {
            unimplemented!()
        }
        fn get_raw_transaction_hex(&self, _txid: &str) -> Result<String, WorkerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hex.clone())
        }
        fn get_mempool_txids(&self) -> Result<Vec<String>, WorkerError> {
            Ok(Vec::new())
        }
        fn get_chain_info(&self) -> Result<crate::rpc::ChainInfo, WorkerError> {
            unimplemented!()
        }
        fn send_raw_transaction(&self, _hex: &str) -> Result<String, WorkerError> {
            unimplemented!()
        }
    }

    fn sample_tx_hex() -> String {
        // One input (coinbase), one output paying 50 PIV, locktime 0.
        "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff00ffffffff01005039278c0400001976a914000000000000000000000000000000000000000088ac00000000".to_string()
    }

    #[test]
    fn caches_decoded_transaction_across_calls() {
        let node = Arc::new(CountingNode { hex: sample_tx_hex(), calls: AtomicUsize::new(0) });
        let cache = LruTxCache::new(node.clone(), 4);

        let first = cache.get_transaction("abc").unwrap();
        let second = cache.get_transaction("abc").unwrap();

        assert_eq!(first.vout.len(), 1);
        assert_eq!(second.vout[0].value_sat, first.vout[0].value_sat);
        assert_eq!(node.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let node = Arc::new(CountingNode { hex: sample_tx_hex(), calls: AtomicUsize::new(0) });
        let cache = LruTxCache::new(node.clone(), 4);

        cache.get_transaction("abc").unwrap();
        cache.invalidate("abc");
        cache.get_transaction("abc").unwrap();

        assert_eq!(node.calls.load(Ordering::SeqCst), 2);
    }
}
