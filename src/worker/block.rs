/// Block & Blocks assembly (spec §4.4). `buildBlock` accepts either a
/// height or a hash; `buildBlocks` pages block summaries from the best
/// height downward.
use crate::errors::WorkerError;
use crate::types::{BlockDetail, BlockInfo};

use super::{page_window, Worker};

impl Worker {
    /// Resolves a path parameter that may be either a height or a hash to
    /// the block's hash (spec §6 `/block-index/{hashOrHeight}`, and the
    /// first step of `buildBlock`).
    pub async fn resolve_block_hash(&self, hash_or_height: &str) -> Result<String, WorkerError> {
        let (best_height, _) = self.index.get_best_block()?;
        match hash_or_height.parse::<i32>() {
            Ok(height) if height >= 0 && height <= best_height => {
                self.index.get_block_hash(height)?.ok_or_else(|| WorkerError::not_found(format!("no block at height {}", height)))
            }
            _ => Ok(hash_or_height.to_string()),
        }
    }

    pub async fn build_block(&self, hash_or_height: &str, page0: i64, page_size: usize) -> Result<BlockDetail, WorkerError> {
        let timer = crate::metrics::Timer::new();
        let result = self.build_block_inner(hash_or_height, page0, page_size).await;
        crate::metrics::record_worker_query("build_block", timer.elapsed_secs());
        result
    }

    async fn build_block_inner(&self, hash_or_height: &str, page0: i64, page_size: usize) -> Result<BlockDetail, WorkerError> {
        let (best_height, _) = self.index.get_best_block()?;
        let hash = self.resolve_block_hash(hash_or_height).await?;

        let raw = self.node.get_block_by_hash(&hash)?;
        let window = page_window(raw.tx_ids.len() as i64, page0, page_size);
        let page_txids = &raw.tx_ids[window.from.min(raw.tx_ids.len())..window.to.min(raw.tx_ids.len())];

        let mut txs = Vec::with_capacity(page_txids.len());
        for txid in page_txids {
            txs.push(self.build_block_tx(txid, raw.height, best_height).await?);
        }

        let (prev_hash, next_hash) = match self.index.get_block_info(raw.height)? {
            Some(indexed) => (
                raw.previous_hash.clone().or(indexed.prev_hash),
                raw.next_hash.clone().or(indexed.next_hash),
            ),
            None => (raw.previous_hash.clone(), raw.next_hash.clone()),
        };

        let info = BlockInfo {
            hash: raw.hash.clone(),
            height: raw.height,
            time: raw.time,
            size: raw.size,
            bits: raw.bits.clone(),
            difficulty: raw.difficulty,
            merkle_root: raw.merkle_root.clone(),
            nonce: raw.nonce.clone(),
            txids: raw.tx_ids.clone(),
            prev_hash,
            next_hash,
        };

        Ok(BlockDetail { info, items_on_page: txs.len() as u32, page: window.page, total_pages: window.total_pages, txs })
    }

    pub async fn build_blocks(&self, page0: i64, page_size: usize) -> Result<Vec<BlockInfo>, WorkerError> {
        let (best_height, _) = self.index.get_best_block()?;
        let total = (best_height + 1).max(0) as i64;
        let window = page_window(total, page0, page_size);

        let mut blocks = Vec::new();
        for idx in window.from..window.to {
            let height = best_height - idx as i32;
            if height < 0 {
                break;
            }
            if let Some(info) = self.index.get_block_info(height)? {
                blocks.push(info);
            }
        }
        Ok(blocks)
    }

    /// Per-txid light reconstruction within a block page (spec §4.1/§4.4):
    /// prefers `TxAddresses`, falls back to full assembly when missing.
    async fn build_block_tx(&self, txid: &str, height: i32, best_height: i32) -> Result<crate::types::Tx, WorkerError> {
        let Some(ta) = self.index.get_tx_addresses(txid)? else {
            return self.build_tx(txid, false).await;
        };
        let Some(block) = self.index.get_block_info(height)? else {
            return self.build_tx(txid, false).await;
        };
        Ok(super::address::light_tx_from_index(txid, &ta, &block, best_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_page_window_tracks_best_height_plus_one() {
        let w = page_window(101, 0, 50);
        assert_eq!((w.from, w.to, w.total_pages), (0, 50, 2));
    }
}
