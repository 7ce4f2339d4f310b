/// Address assembly (spec §4.2): paged view over an address's confirmed
/// history plus mempool touches plus balance. The vout filter and the
/// "stop collecting at `(page+1)*pageSize`" early-termination both ride on
/// the index store's callback-driven scan.
use std::collections::HashSet;

use crate::errors::WorkerError;
use crate::index::BalanceDetail;
use crate::types::{
    AddrIndexTouch, AddressFilter, AddressPage, BlockInfo, DetailLevel, ScanControl, ScanItem, Tx, TxAddresses,
    Vin, Vout, VoutFilter,
};

use super::{page_window, Worker};

fn vout_filter_matches(filter: &VoutFilter, touches: &[AddrIndexTouch]) -> bool {
    match filter {
        VoutFilter::Off => true,
        VoutFilter::Inputs => touches.iter().any(|t| matches!(t, AddrIndexTouch::Input(_))),
        VoutFilter::Outputs => touches.iter().any(|t| matches!(t, AddrIndexTouch::Output(_))),
        VoutFilter::Index(n) => touches.iter().any(|t| match t {
            AddrIndexTouch::Output(i) | AddrIndexTouch::Input(i) => *i as i32 == *n,
        }),
    }
}

impl Worker {
    pub async fn build_address(
        &self,
        address: &str,
        page0: i64,
        page_size: usize,
        detail: DetailLevel,
        filter: &AddressFilter,
    ) -> Result<AddressPage, WorkerError> {
        let timer = crate::metrics::Timer::new();
        let result = self.build_address_inner(address, page0, page_size, detail, filter).await;
        crate::metrics::record_worker_query("build_address", timer.elapsed_secs());
        result
    }

    async fn build_address_inner(
        &self,
        address: &str,
        page0: i64,
        page_size: usize,
        detail: DetailLevel,
        filter: &AddressFilter,
    ) -> Result<AddressPage, WorkerError> {
        if self.parser.chain_type() != crate::types::ChainType::Utxo {
            return Err(WorkerError::Unsupported("account-chain address assembly".into()));
        }
        if detail == DetailLevel::Tokens {
            return Err(WorkerError::Unsupported("token listing on a UTXO chain".into()));
        }

        let addr_desc = self.parser.normalize_address(address)?;
        let balance = self.index.get_addr_desc_balance(&addr_desc.0, BalanceDetail::NoUtxo)?;

        let (balance_sat, received_sat, sent_sat, tx_count) = match &balance {
            Some(b) => (b.balance_sat, b.received_sat, b.sent_sat, b.tx_count),
            None => (0, 0, 0, 0),
        };

        let no_filter_active =
            filter.vout == VoutFilter::Off && filter.from_height == 0 && filter.to_height == 0 && filter.contract.is_none();
        let count_for_paging = if no_filter_active { tx_count as i64 } else { -1 };
        let window = page_window(count_for_paging, page0, page_size);
        let page1 = window.page == 1;

        let mut unconfirmed_balance_sat: i64 = 0;
        let mut unconfirmed_txids: Vec<String> = Vec::new();

        if filter.to_height == 0 && !filter.only_confirmed {
            let touches = self.mempool.touches_for_address(&addr_desc);
            let mut seen: HashSet<String> = HashSet::new();
            for touch in touches {
                if !seen.insert(touch.txid.clone()) {
                    continue;
                }
                let Ok(parsed) = self.tx_cache.get_transaction(&touch.txid) else { continue };

                for vout in &parsed.vout {
                    if self.parser.addr_desc_for_script(&vout.script_pubkey) == addr_desc {
                        unconfirmed_balance_sat += vout.value_sat;
                    }
                }
                for vin in &parsed.vin {
                    let Some((prev_txid, prev_vout)) = &vin.prevout else { continue };
                    let Ok(prev_tx) = self.tx_cache.get_transaction(prev_txid) else { continue };
                    let Some(src_out) = prev_tx.vout.get(*prev_vout as usize) else { continue };
                    if self.parser.addr_desc_for_script(&src_out.script_pubkey) == addr_desc {
                        unconfirmed_balance_sat -= src_out.value_sat;
                    }
                }
                unconfirmed_txids.push(touch.txid);
            }
        }

        let mut matched: Vec<ScanItem> = Vec::new();
        self.index.scan_addr_desc_transactions(&addr_desc.0, filter.from_height, filter.to_height, &mut |item| {
            if vout_filter_matches(&filter.vout, &item.touches) {
                matched.push(item);
            }
            if matched.len() >= window.to {
                ScanControl::Stop
            } else {
                ScanControl::Continue
            }
        })?;

        let page_ids: Vec<String> = if window.from < matched.len() {
            matched[window.from..matched.len().min(window.to)].iter().map(|i| i.txid.clone()).collect()
        } else {
            Vec::new()
        };

        let (best_height, _) = self.index.get_best_block()?;

        let mut txids = Vec::new();
        let mut txs = Vec::new();

        if page1 {
            txids.extend(unconfirmed_txids.iter().cloned());
        }

        match detail {
            DetailLevel::TxidsOnly => {
                txids.extend(page_ids);
            }
            DetailLevel::Basic | DetailLevel::Balance => {
                // Summary only: counts and totals, no per-tx payload.
            }
            DetailLevel::LightHistory => {
                if page1 {
                    for txid in &unconfirmed_txids {
                        if let Ok(tx) = self.build_tx(txid, false).await {
                            txs.push(tx);
                        }
                    }
                }
                for txid in page_ids {
                    txs.push(self.build_light_address_tx(&txid, best_height).await?);
                }
            }
            DetailLevel::FullHistory => {
                if page1 {
                    for txid in &unconfirmed_txids {
                        if let Ok(tx) = self.build_tx(txid, true).await {
                            txs.push(tx);
                        }
                    }
                }
                for txid in page_ids {
                    txs.push(self.build_tx(&txid, true).await?);
                }
            }
            DetailLevel::Tokens => unreachable!(),
        }

        Ok(AddressPage {
            address: address.to_string(),
            balance_sat,
            total_received_sat: received_sat,
            total_sent_sat: sent_sat,
            tx_count,
            unconfirmed_balance_sat,
            unconfirmed_tx_count: unconfirmed_txids.len() as u64,
            items_on_page: (txs.len().max(txids.len())) as u32,
            page: window.page,
            total_pages: window.total_pages,
            txids,
            txs,
        })
    }

    /// Reconstructs a tx from `TxAddresses` + `BlockInfo` alone, skipping the
    /// raw-tx decode (spec §4.2 step 6 "prefer reconstruction ... no raw-tx
    /// decode"). Falls back to the full builder when either is missing.
    async fn build_light_address_tx(&self, txid: &str, best_height: i32) -> Result<Tx, WorkerError> {
        let Some(ta) = self.index.get_tx_addresses(txid)? else {
            return self.build_tx(txid, false).await;
        };
        let Some(block) = self.index.get_block_info(ta.height)? else {
            return self.build_tx(txid, false).await;
        };
        Ok(light_tx_from_index(txid, &ta, &block, best_height))
    }
}

pub(super) fn light_tx_from_index(txid: &str, ta: &TxAddresses, block: &BlockInfo, best_height: i32) -> Tx {
    let vin: Vec<Vin> = ta
        .inputs
        .iter()
        .map(|input| Vin {
            txid: None,
            vout: None,
            sequence: 0,
            script_sig_hex: None,
            coinbase_hex: None,
            addr_desc: input.addr_desc.clone(),
            addresses: input.addresses.clone(),
            searchable: input.searchable,
            value_sat: input.value_sat,
        })
        .collect();

    let vout: Vec<Vout> = ta
        .outputs
        .iter()
        .enumerate()
        .map(|(n, output)| Vout {
            n: n as u32,
            value_sat: output.value_sat,
            script_hex: String::new(),
            addresses: output.addresses.clone(),
            searchable: output.searchable,
            spent: output.spent,
            spent_txid: None,
            spent_height: None,
            spent_index: None,
        })
        .collect();

    let value_in_sat: i64 = ta.inputs.iter().map(|i| i.value_sat).sum();
    let value_out_sat: i64 = ta.outputs.iter().map(|o| o.value_sat).sum();
    let fees_sat = (value_in_sat - value_out_sat).max(0);

    Tx {
        txid: txid.to_string(),
        version: 0,
        lock_time: 0,
        hex: String::new(),
        blockhash: Some(block.hash.clone()),
        blockheight: ta.height,
        blocktime: block.time,
        confirmations: (best_height - ta.height + 1).max(0),
        vin,
        vout,
        fees_sat,
        value_in_sat,
        value_out_sat,
        token_transfers: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddrDesc, TxAddressesInput, TxAddressesOutput};

    #[test]
    fn vout_filter_index_matches_either_role() {
        let touches = vec![AddrIndexTouch::Input(2)];
        assert!(vout_filter_matches(&VoutFilter::Index(2), &touches));
        assert!(!vout_filter_matches(&VoutFilter::Index(3), &touches));
        assert!(vout_filter_matches(&VoutFilter::Inputs, &touches));
        assert!(!vout_filter_matches(&VoutFilter::Outputs, &touches));
    }

    #[test]
    fn light_tx_reconstruction_computes_fee_from_index_only() {
        let ta = TxAddresses {
            height: 50,
            inputs: vec![TxAddressesInput {
                value_sat: 100,
                addr_desc: Some(AddrDesc(vec![1, 2, 3])),
                addresses: vec!["Dsrc".into()],
                searchable: true,
            }],
            outputs: vec![TxAddressesOutput {
                value_sat: 90,
                addr_desc: Some(AddrDesc(vec![4, 5, 6])),
                addresses: vec!["Ddst".into()],
                searchable: true,
                spent: false,
            }],
        };
        let block = BlockInfo {
            hash: "h".into(),
            height: 50,
            time: 1000,
            size: 0,
            bits: String::new(),
            difficulty: 0.0,
            merkle_root: String::new(),
            nonce: String::new(),
            txids: Vec::new(),
            prev_hash: None,
            next_hash: None,
        };
        let tx = light_tx_from_index("abc", &ta, &block, 55);
        assert_eq!(tx.fees_sat, 10);
        assert_eq!(tx.confirmations, 6);
        assert_eq!(tx.hex, "");
    }
}
