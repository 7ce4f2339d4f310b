/// The Query Worker (spec §2): composes the five collaborators behind
/// `IndexStore`/`TxCache`/`NodeClient`/`MempoolView`/`ChainParser` and fans
/// reads across them. Every public method is a free-standing `async fn` on
/// `&self` — the Worker holds no mutable state of its own and spawns no
/// background tasks (spec §5 "the Worker itself spawns no background
/// tasks").
pub mod address;
pub mod block;
pub mod fee_stats;
pub mod tx;
pub mod utxo;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TxCache;
use crate::chain::ChainParser;
use crate::errors::WorkerError;
use crate::index::IndexStore;
use crate::mempool::MempoolView;
use crate::rpc::NodeClient;
use crate::types::{MasternodeInfo, MoneySupply, MoneySupplyV2, SystemInfo};

#[derive(Clone)]
pub struct Worker {
    pub(crate) index: Arc<dyn IndexStore>,
    pub(crate) tx_cache: Arc<dyn TxCache>,
    pub(crate) node: Arc<dyn NodeClient>,
    pub(crate) mempool: Arc<dyn MempoolView>,
    pub(crate) parser: Arc<dyn ChainParser>,
}

impl Worker {
    pub fn new(
        index: Arc<dyn IndexStore>,
        tx_cache: Arc<dyn TxCache>,
        node: Arc<dyn NodeClient>,
        mempool: Arc<dyn MempoolView>,
        parser: Arc<dyn ChainParser>,
    ) -> Self {
        Worker { index, tx_cache, node, mempool, parser }
    }

    /// Polls `IndexStore::sync_state` up to 30×100ms (spec §5
    /// `waitForBackendSync`), used before UTXO queries to shrink the window
    /// where a just-spent coin still shows as unspent.
    pub async fn wait_for_backend_sync(&self) {
        for _ in 0..30 {
            match self.index.sync_state() {
                Ok(state) if state.in_sync => return,
                _ => {}
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub async fn build_system_info(&self, include_internal: bool) -> Result<SystemInfo, WorkerError> {
        let sync = self.index.sync_state()?;
        let (best_height, best_hash) = self.index.get_best_block()?;

        let mut money_supply = None;
        let mut money_supply_v2 = None;
        let mut masternodes = None;

        if let Ok(chain_info) = self.node.get_chain_info() {
            if let Some(supply) = chain_info.money_supply {
                money_supply = Some(MoneySupply { money_supply: supply, zerocoin_supply: chain_info.zerocoin_supply.unwrap_or(0.0) });
                money_supply_v2 = Some(MoneySupplyV2 { transparent_supply: supply, shield_supply: 0.0, money_supply: supply });
            }
            if let (Some(total), Some(enabled)) = (chain_info.masternodes_total, chain_info.masternodes_enabled) {
                masternodes = Some(MasternodeInfo { total, enabled });
            }
        }

        let db_size_bytes = if include_internal { self.index.db_size_bytes()? } else { None };

        Ok(SystemInfo {
            best_height,
            best_hash,
            in_sync: sync.in_sync,
            mempool_size: self.mempool.size(),
            money_supply,
            money_supply_v2,
            masternodes,
            db_size_bytes,
        })
    }
}

/// Paging utility (spec §4.6). `page0` is zero-based on entry; returns the
/// half-open `[from, to)` slice bounds plus the 1-based page/total-pages the
/// API reports. `count < 0` signals "unknown" and yields `total_pages = -1`
/// with the full range left unclamped by count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub from: usize,
    pub to: usize,
    pub page: u32,
    pub total_pages: i32,
}

pub fn page_window(count: i64, page0: i64, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    if count < 0 {
        let from = (page0.max(0) as usize) * page_size;
        return PageWindow { from, to: from + page_size, page: page0.max(0) as u32 + 1, total_pages: -1 };
    }

    let total_pages = if count == 0 { 0 } else { (count - 1) / page_size as i64 };
    let mut page0 = page0.max(0);
    if page0 * page_size as i64 >= count {
        page0 = total_pages;
    }
    let from = (page0 * page_size as i64) as usize;
    let to = (((page0 + 1) * page_size as i64).min(count)) as usize;
    PageWindow { from, to, page: page0 as u32 + 1, total_pages: total_pages as i32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_matches_scenario_5_from_spec() {
        let w = page_window(250, 0, 100);
        assert_eq!((w.from, w.to, w.page, w.total_pages), (0, 100, 1, 3));

        let w = page_window(250, 2, 100);
        assert_eq!((w.from, w.to, w.page, w.total_pages), (200, 250, 3, 3));
    }

    #[test]
    fn page_zero_clamps_to_one() {
        let w = page_window(10, -1, 5);
        assert_eq!(w.page, 1);
        assert_eq!(w.from, 0);
    }

    #[test]
    fn page_beyond_total_clamps_to_last() {
        let w = page_window(10, 50, 5);
        assert_eq!(w.page, 2);
        assert_eq!((w.from, w.to), (5, 10));
    }

    #[test]
    fn empty_count_yields_zero_total_pages() {
        let w = page_window(0, 0, 10);
        assert_eq!(w.total_pages, 0);
        assert_eq!((w.from, w.to), (0, 0));
    }

    #[test]
    fn unknown_count_yields_negative_one_sentinel() {
        let w = page_window(-1, 0, 20);
        assert_eq!(w.total_pages, -1);
        assert_eq!((w.from, w.to), (0, 20));
    }
}
