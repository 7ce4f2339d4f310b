//! End-to-end Worker tests against in-memory/fake collaborators: the real
//! `PivxParser`/`MempoolState` plus an `InMemoryIndexStore` and a scripted
//! `NodeClient` fake, wired together exactly as `main.rs` wires the real
//! ones.

use std::sync::Arc;

use pivx_explorer_worker::address::hash_to_address;
use pivx_explorer_worker::cache::LruTxCache;
use pivx_explorer_worker::chain::{Network, PivxParser};
use pivx_explorer_worker::errors::WorkerError;
use pivx_explorer_worker::index::InMemoryIndexStore;
use pivx_explorer_worker::mempool::MempoolState;
use pivx_explorer_worker::rpc::{ChainInfo, NodeClient, RawBlock};
use pivx_explorer_worker::types::{AddrBalance, AddressFilter, BlockInfo, DetailLevel, IndexedUtxo, VoutFilter};
use pivx_explorer_worker::Worker;

const P2PKH_VERSION: u8 = 30;

/// `76a914` <20-byte hash> `88ac` — a standard P2PKH output script.
fn p2pkh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![0x76, 0xa9, 0x14];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

/// A one-input-one-output legacy transaction paying `value_sat` to `hash`.
fn coinbase_tx_hex(hash: &[u8; 20], value_sat: u64) -> String {
    let script = p2pkh_script(hash);
    let mut raw = hex::decode(
        "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff00ffffffff01",
    )
    .unwrap();
    raw.extend_from_slice(&value_sat.to_le_bytes());
    raw.push(script.len() as u8);
    raw.extend_from_slice(&script);
    raw.extend_from_slice(&[0, 0, 0, 0]);
    hex::encode(raw)
}

struct ScriptedNode {
    tx_hex: std::collections::HashMap<String, String>,
    chain_info: ChainInfo,
}

impl NodeClient for ScriptedNode {
    fn get_block_by_height(&self, _height: i32) -> Result<RawBlock, WorkerError> {
        Err(WorkerError::not_found("no block"))
    }

    fn get_block_by_hash(&self, hash: &str) -> Result<RawBlock, WorkerError> {
        Ok(RawBlock {
            hash: hash.to_string(),
            version: 1,
            height: 10,
            time: 1_700_000_000,
            bits: "1e0ffff0".to_string(),
            difficulty: 0.0,
            nonce: "0".to_string(),
            merkle_root: "0".repeat(64),
            previous_hash: Some("prevhash".to_string()),
            next_hash: None,
            size: 250,
            tx_ids: self.tx_hex.keys().cloned().collect(),
            tx_hex: self.tx_hex.values().cloned().collect(),
        })
    }

    fn get_raw_transaction_hex(&self, txid: &str) -> Result<String, WorkerError> {
        self.tx_hex.get(txid).cloned().ok_or_else(|| WorkerError::not_found(format!("{} unknown", txid)))
    }

    fn get_mempool_txids(&self) -> Result<Vec<String>, WorkerError> {
        Ok(Vec::new())
    }

    fn get_chain_info(&self) -> Result<ChainInfo, WorkerError> {
        Ok(self.chain_info.clone())
    }

    fn send_raw_transaction(&self, _hex: &str) -> Result<String, WorkerError> {
        Err(WorkerError::Unsupported("sendrawtransaction".into()))
    }
}

fn build_worker(node: ScriptedNode) -> (Worker, Arc<InMemoryIndexStore>) {
    let index = Arc::new(InMemoryIndexStore::new());
    *index.best.write().unwrap() = (10, "tip-hash".to_string());
    *index.synced.write().unwrap() = true;

    let node: Arc<dyn NodeClient> = Arc::new(node);
    let tx_cache = Arc::new(LruTxCache::new(node.clone(), 16));
    let mempool = Arc::new(MempoolState::new());
    let parser = Arc::new(PivxParser::new(Network::Main));

    let worker = Worker::new(index.clone(), tx_cache, node, mempool, parser);
    (worker, index)
}

#[tokio::test]
async fn build_tx_assembles_confirmed_coinbase_payment() {
    let hash = [7u8; 20];
    let txid = "a".repeat(64);
    let mut tx_hex = std::collections::HashMap::new();
    tx_hex.insert(txid.clone(), coinbase_tx_hex(&hash, 5_000_000_000));

    let (worker, _index) = build_worker(ScriptedNode { tx_hex, chain_info: ChainInfo::default() });

    let tx = worker.build_tx(&txid, false).await.expect("build_tx");
    assert_eq!(tx.txid, txid);
    assert_eq!(tx.vout.len(), 1);
    assert_eq!(tx.vout[0].value_sat, 5_000_000_000);
    assert_eq!(tx.confirmations, 0);
}

#[tokio::test]
async fn build_address_reports_balance_from_index() {
    let hash = [9u8; 20];
    let address = hash_to_address(&hash, P2PKH_VERSION);
    let (worker, index) = build_worker(ScriptedNode { tx_hex: Default::default(), chain_info: ChainInfo::default() });

    {
        index.balances.write().unwrap().insert(
            hex::encode(hash),
            AddrBalance {
                tx_count: 2,
                sent_sat: 1_000,
                received_sat: 6_000,
                balance_sat: 5_000,
                utxos: vec![IndexedUtxo { txid: "b".repeat(64), vout: 0, height: 9, value_sat: 5_000 }],
            },
        );
    }

    let page = worker
        .build_address(&address, 0, 50, DetailLevel::Balance, &AddressFilter { vout: VoutFilter::Off, ..Default::default() })
        .await
        .expect("build_address");

    assert_eq!(page.address, address);
    assert_eq!(page.balance_sat, 5_000);
    assert_eq!(page.tx_count, 2);
}

#[tokio::test]
async fn build_block_pages_transactions_and_resolves_hash_or_height() {
    let hash = [3u8; 20];
    let txid = "c".repeat(64);
    let mut tx_hex = std::collections::HashMap::new();
    tx_hex.insert(txid.clone(), coinbase_tx_hex(&hash, 1_000_000));

    let (worker, index) = build_worker(ScriptedNode { tx_hex, chain_info: ChainInfo::default() });

    {
        index.height_to_hash.write().unwrap().insert(10, "block-hash".to_string());
        index.blocks_by_height.write().unwrap().insert(
            10,
            BlockInfo {
                hash: "block-hash".to_string(),
                height: 10,
                time: 1_700_000_000,
                size: 250,
                bits: "1e0ffff0".to_string(),
                difficulty: 0.0,
                merkle_root: "0".repeat(64),
                nonce: "0".to_string(),
                txids: vec![txid.clone()],
                prev_hash: Some("prevhash".to_string()),
                next_hash: None,
            },
        );
    }

    let resolved = worker.resolve_block_hash("10").await.expect("resolve by height");
    assert_eq!(resolved, "block-hash");

    let detail = worker.build_block("block-hash", 0, 50).await.expect("build_block");
    assert_eq!(detail.info.height, 10);
    assert_eq!(detail.txs.len(), 1);
}

#[tokio::test]
async fn build_system_info_reports_sync_and_supply() {
    let (worker, _index) = build_worker(ScriptedNode {
        tx_hex: Default::default(),
        chain_info: ChainInfo { money_supply: Some(21_000_000.0), zerocoin_supply: Some(0.0), ..Default::default() },
    });

    let info = worker.build_system_info(false).await.expect("build_system_info");
    assert_eq!(info.best_height, 10);
    assert!(info.in_sync);
    assert!(info.money_supply.is_some());
    assert!(info.money_supply_v2.is_some());
}
