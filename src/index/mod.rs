/// `IndexStore`: persistent, range-scannable mapping the Worker reads from
/// (spec §2, §6). Modeled as a trait so the Worker can run against an
/// in-memory fake in tests and against `RocksIndexStore` in production,
/// mirroring the column-family layout (`blocks`/`transactions`/`addr_index`/
/// `chain_metadata`/`chain_state`) the teacher's writer populates.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use byteorder::{BigEndian, ByteOrder};

use crate::errors::WorkerError;
use crate::types::{AddrBalance, BlockInfo, ScanControl, ScanItem, TxAddresses};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncState {
    pub in_sync: bool,
    pub best_height: i32,
}

/// Detail requested of `get_addr_desc_balance` (spec §6): `NoUtxo` skips
/// materializing the UTXO list when the caller only needs totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDetail {
    NoUtxo,
    Utxo,
}

pub trait IndexStore: Send + Sync {
    fn get_tx_addresses(&self, txid: &str) -> Result<Option<TxAddresses>, WorkerError>;

    /// Scans an address's tx history over `[from_height, to_height]`
    /// (`to_height == 0` means unbounded), newest first, invoking `cb` for
    /// each touched tx. `cb` returning `ScanControl::Stop` ends the scan
    /// without it being treated as an error (spec §9 "StopIteration").
    fn scan_addr_desc_transactions(
        &self,
        addr_desc: &[u8],
        from_height: i32,
        to_height: i32,
        cb: &mut dyn FnMut(ScanItem) -> ScanControl,
    ) -> Result<(), WorkerError>;

    fn get_addr_desc_balance(
        &self,
        addr_desc: &[u8],
        detail: BalanceDetail,
    ) -> Result<Option<AddrBalance>, WorkerError>;

    fn get_block_hash(&self, height: i32) -> Result<Option<String>, WorkerError>;
    fn get_block_info(&self, height: i32) -> Result<Option<BlockInfo>, WorkerError>;
    fn get_best_block(&self) -> Result<(i32, String), WorkerError>;
    fn sync_state(&self) -> Result<SyncState, WorkerError>;

    /// Approximate on-disk size in bytes, summed across column families
    /// (spec §6 `GetSystemInfo(includeInternal)` "column statistics, DB
    /// size"). `None` when the backend can't report it.
    fn db_size_bytes(&self) -> Result<Option<u64>, WorkerError> {
        Ok(None)
    }
}

// ------------------------------------------------------------------
// In-memory fake, used by Worker unit/integration tests.
// ------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryIndexStore {
    pub tx_addresses: RwLock<HashMap<String, TxAddresses>>,
    /// addr_desc (hex) -> tx history, newest-first.
    pub addr_history: RwLock<HashMap<String, Vec<ScanItem>>>,
    pub balances: RwLock<HashMap<String, AddrBalance>>,
    pub blocks_by_height: RwLock<HashMap<i32, BlockInfo>>,
    pub height_to_hash: RwLock<HashMap<i32, String>>,
    pub best: RwLock<(i32, String)>,
    pub synced: RwLock<bool>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn addr_key(addr_desc: &[u8]) -> String {
    hex::encode(addr_desc)
}

impl IndexStore for InMemoryIndexStore {
    fn get_tx_addresses(&self, txid: &str) -> Result<Option<TxAddresses>, WorkerError> {
        Ok(self.tx_addresses.read().unwrap().get(txid).cloned())
    }

    fn scan_addr_desc_transactions(
        &self,
        addr_desc: &[u8],
        from_height: i32,
        to_height: i32,
        cb: &mut dyn FnMut(ScanItem) -> ScanControl,
    ) -> Result<(), WorkerError> {
        let history = self.addr_history.read().unwrap();
        let Some(items) = history.get(&addr_key(addr_desc)) else {
            return Ok(());
        };
        let upper = if to_height == 0 { i32::MAX } else { to_height };
        for item in items.iter() {
            if item.height < from_height || item.height > upper {
                continue;
            }
            if cb(item.clone()) == ScanControl::Stop {
                break;
            }
        }
        Ok(())
    }

    fn get_addr_desc_balance(
        &self,
        addr_desc: &[u8],
        _detail: BalanceDetail,
    ) -> Result<Option<AddrBalance>, WorkerError> {
        Ok(self.balances.read().unwrap().get(&addr_key(addr_desc)).cloned())
    }

    fn get_block_hash(&self, height: i32) -> Result<Option<String>, WorkerError> {
        Ok(self.height_to_hash.read().unwrap().get(&height).cloned())
    }

    fn get_block_info(&self, height: i32) -> Result<Option<BlockInfo>, WorkerError> {
        Ok(self.blocks_by_height.read().unwrap().get(&height).cloned())
    }

    fn get_best_block(&self) -> Result<(i32, String), WorkerError> {
        Ok(self.best.read().unwrap().clone())
    }

    fn sync_state(&self) -> Result<SyncState, WorkerError> {
        let (height, _) = self.best.read().unwrap().clone();
        Ok(SyncState { in_sync: *self.synced.read().unwrap(), best_height: height })
    }
}

// ------------------------------------------------------------------
// RocksDB-backed store
// ------------------------------------------------------------------

/// Column families the Worker reads from. Matches the teacher's writer
/// layout so the Worker can run against the same database the indexer
/// populates; `pubkey` is writer-internal and unused here.
pub const COLUMN_FAMILIES: [&str; 4] = ["blocks", "transactions", "addr_index", "chain_state"];

pub struct RocksIndexStore {
    db: Arc<rocksdb::DB>,
}

impl RocksIndexStore {
    pub fn new(db: Arc<rocksdb::DB>) -> Result<Self, WorkerError> {
        for cf in COLUMN_FAMILIES.iter() {
            if db.cf_handle(cf).is_none() {
                return Err(WorkerError::internal_msg(format!("{} column family not found", cf)));
            }
        }
        Ok(RocksIndexStore { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, WorkerError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WorkerError::internal_msg(format!("{} column family not found", name)))
    }

    /// Address-history keys are `'t' + addr_desc + !height_be(4) + txid(32)`;
    /// inverting the height makes ascending byte order equal descending
    /// height order, giving newest-first iteration for free (spec §5
    /// "Address tx-history: deterministic height-descending order").
    fn history_prefix(addr_desc: &[u8]) -> Vec<u8> {
        let mut key = vec![b't'];
        key.extend_from_slice(addr_desc);
        key
    }

    fn history_key(addr_desc: &[u8], height: i32, txid: &str) -> Vec<u8> {
        let mut key = Self::history_prefix(addr_desc);
        let mut height_buf = [0u8; 4];
        BigEndian::write_u32(&mut height_buf, !(height as u32));
        key.extend_from_slice(&height_buf);
        key.extend_from_slice(txid.as_bytes());
        key
    }

    fn balance_key(addr_desc: &[u8]) -> Vec<u8> {
        let mut key = vec![b'b'];
        key.extend_from_slice(addr_desc);
        key
    }

    /// Used by the writer (out of Worker scope) to populate `addr_index`;
    /// kept here because the key layout is part of this store's contract.
    pub fn put_addr_history(
        &self,
        addr_desc: &[u8],
        item: &ScanItem,
    ) -> Result<(), WorkerError> {
        let cf = self.cf("addr_index")?;
        let key = Self::history_key(addr_desc, item.height, &item.txid);
        let touches: Vec<i32> = item.touches.iter().map(|t| t.encode()).collect();
        let value = bincode::serialize(&touches).map_err(WorkerError::internal)?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }
}

impl IndexStore for RocksIndexStore {
    fn get_tx_addresses(&self, txid: &str) -> Result<Option<TxAddresses>, WorkerError> {
        let cf = self.cf("transactions")?;
        match self.db.get_cf(cf, txid.as_bytes())? {
            Some(bytes) => {
                let ta: TxAddresses = bincode::deserialize(&bytes).map_err(WorkerError::internal)?;
                Ok(Some(ta))
            }
            None => Ok(None),
        }
    }

    fn scan_addr_desc_transactions(
        &self,
        addr_desc: &[u8],
        from_height: i32,
        to_height: i32,
        cb: &mut dyn FnMut(ScanItem) -> ScanControl,
    ) -> Result<(), WorkerError> {
        use crate::types::AddrIndexTouch;

        let cf = self.cf("addr_index")?;
        let prefix = Self::history_prefix(addr_desc);
        let upper = if to_height == 0 { i32::MAX } else { to_height };

        let iter = self
            .db
            .iterator_cf(cf, rocksdb::IteratorMode::From(&prefix, rocksdb::Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let height_field = &key[prefix.len()..prefix.len() + 4];
            let height = !BigEndian::read_u32(height_field) as i32;
            if height < from_height || height > upper {
                continue;
            }
            let txid = String::from_utf8_lossy(&key[prefix.len() + 4..]).to_string();
            let raw_touches: Vec<i32> = bincode::deserialize(&value).map_err(WorkerError::internal)?;
            let touches = raw_touches.into_iter().map(AddrIndexTouch::decode).collect();

            if cb(ScanItem { txid, height, touches }) == ScanControl::Stop {
                break;
            }
        }
        Ok(())
    }

    fn get_addr_desc_balance(
        &self,
        addr_desc: &[u8],
        _detail: BalanceDetail,
    ) -> Result<Option<AddrBalance>, WorkerError> {
        let cf = self.cf("addr_index")?;
        match self.db.get_cf(cf, Self::balance_key(addr_desc))? {
            Some(bytes) => {
                let balance: AddrBalance = bincode::deserialize(&bytes).map_err(WorkerError::internal)?;
                Ok(Some(balance))
            }
            None => Ok(None),
        }
    }

    fn get_block_hash(&self, height: i32) -> Result<Option<String>, WorkerError> {
        match self.get_block_info(height)? {
            Some(info) => Ok(Some(info.hash)),
            None => Ok(None),
        }
    }

    fn get_block_info(&self, height: i32) -> Result<Option<BlockInfo>, WorkerError> {
        let cf = self.cf("blocks")?;
        let key = height.to_be_bytes();
        match self.db.get_cf(cf, key)? {
            Some(bytes) => {
                let info: BlockInfo = bincode::deserialize(&bytes).map_err(WorkerError::internal)?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    fn get_best_block(&self) -> Result<(i32, String), WorkerError> {
        let cf = self.cf("chain_state")?;
        let height = match self.db.get_cf(cf, b"sync_height")? {
            Some(bytes) if bytes.len() >= 4 => i32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            _ => 0,
        };
        let hash = self.get_block_hash(height)?.unwrap_or_default();
        Ok((height, hash))
    }

    fn sync_state(&self) -> Result<SyncState, WorkerError> {
        let cf = self.cf("chain_state")?;
        let (best_height, _) = self.get_best_block()?;
        let network_height = match self.db.get_cf(cf, b"network_height")? {
            Some(bytes) if bytes.len() >= 4 => Some(i32::from_le_bytes(bytes[0..4].try_into().unwrap())),
            _ => None,
        };
        let in_sync = network_height.map(|nh| best_height >= nh - 2).unwrap_or(true);
        Ok(SyncState { in_sync, best_height })
    }

    fn db_size_bytes(&self) -> Result<Option<u64>, WorkerError> {
        let mut total = 0u64;
        for cf_name in COLUMN_FAMILIES.iter() {
            let cf = self.cf(cf_name)?;
            if let Some(size) = self.db.property_int_value_cf(cf, "rocksdb.total-sst-files-size")? {
                total += size;
            }
        }
        Ok(Some(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddrIndexTouch, TxAddressesInput, TxAddressesOutput};

    fn sample_tx_addresses() -> TxAddresses {
        TxAddresses {
            height: 100,
            inputs: vec![TxAddressesInput { value_sat: 10, addr_desc: None, addresses: Vec::new(), searchable: false }],
            outputs: vec![TxAddressesOutput { value_sat: 10, addr_desc: None, addresses: Vec::new(), searchable: false, spent: false }],
        }
    }

    #[test]
    fn in_memory_store_round_trips_tx_addresses() {
        let store = InMemoryIndexStore::new();
        store.tx_addresses.write().unwrap().insert("abc".into(), sample_tx_addresses());
        let found = store.get_tx_addresses("abc").unwrap().unwrap();
        assert_eq!(found.height, 100);
    }

    #[test]
    fn scan_respects_height_range_and_stop_signal() {
        let store = InMemoryIndexStore::new();
        let addr = vec![1u8, 2, 3];
        let key = addr_key(&addr);
        store.addr_history.write().unwrap().insert(
            key,
            vec![
                ScanItem { txid: "tx3".into(), height: 30, touches: vec![AddrIndexTouch::Output(0)] },
                ScanItem { txid: "tx2".into(), height: 20, touches: vec![AddrIndexTouch::Output(0)] },
                ScanItem { txid: "tx1".into(), height: 10, touches: vec![AddrIndexTouch::Output(0)] },
            ],
        );

        let mut seen = Vec::new();
        store
            .scan_addr_desc_transactions(&addr, 15, 0, &mut |item| {
                seen.push(item.txid);
                ScanControl::Continue
            })
            .unwrap();
        assert_eq!(seen, vec!["tx3", "tx2"]);

        let mut seen_one = Vec::new();
        store
            .scan_addr_desc_transactions(&addr, 0, 0, &mut |item| {
                seen_one.push(item.txid);
                ScanControl::Stop
            })
            .unwrap();
        assert_eq!(seen_one, vec!["tx3"]);
    }

    #[test]
    fn rocks_store_requires_all_column_families() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        let bare_db = Arc::new(rocksdb::DB::open(&opts, dir.path()).unwrap());
        assert!(RocksIndexStore::new(bare_db).is_err());

        let mut cf_opts = rocksdb::Options::default();
        cf_opts.create_if_missing(true);
        cf_opts.create_missing_column_families(true);
        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|cf| rocksdb::ColumnFamilyDescriptor::new(cf.to_string(), rocksdb::Options::default()))
            .collect::<Vec<_>>();
        let dir2 = tempfile::tempdir().unwrap();
        let full_db = Arc::new(rocksdb::DB::open_cf_descriptors(&cf_opts, dir2.path(), descriptors).unwrap());
        assert!(RocksIndexStore::new(full_db).is_ok());
    }
}
