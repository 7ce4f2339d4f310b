/// UTXO-set assembly (spec §4.3): mempool-aware unspent-output listing for
/// a single address. Confirmed UTXOs are read in reverse (newest first)
/// from `AddrBalance.Utxos`; mempool spends are tracked so a coin spent by
/// an unconfirmed tx doesn't show twice.
use std::collections::HashSet;

use crate::errors::WorkerError;
use crate::index::BalanceDetail;
use crate::types::UtxoView;

use super::Worker;

impl Worker {
    pub async fn build_utxo_set(&self, address: &str, only_confirmed: bool) -> Result<Vec<UtxoView>, WorkerError> {
        let timer = crate::metrics::Timer::new();
        let result = self.build_utxo_set_inner(address, only_confirmed).await;
        crate::metrics::record_worker_query("build_utxo_set", timer.elapsed_secs());
        result
    }

    async fn build_utxo_set_inner(&self, address: &str, only_confirmed: bool) -> Result<Vec<UtxoView>, WorkerError> {
        self.wait_for_backend_sync().await;

        let addr_desc = self.parser.normalize_address(address)?;
        let (best_height, _) = self.index.get_best_block()?;

        let mut spent_in_mempool: HashSet<(String, u32)> = HashSet::new();
        let mut result = Vec::new();

        if !only_confirmed {
            let touches = self.mempool.touches_for_address(&addr_desc);
            let mut seen_txids: HashSet<String> = HashSet::new();
            for touch in &touches {
                seen_txids.insert(touch.txid.clone());
            }

            for txid in &seen_txids {
                let Ok(parsed) = self.tx_cache.get_transaction(txid) else { continue };
                for vin in &parsed.vin {
                    if let Some((prev_txid, prev_vout)) = &vin.prevout {
                        spent_in_mempool.insert((prev_txid.clone(), *prev_vout));
                    }
                }
            }

            for txid in &seen_txids {
                let Ok(parsed) = self.tx_cache.get_transaction(txid) else { continue };
                for (n, vout) in parsed.vout.iter().enumerate() {
                    if self.parser.addr_desc_for_script(&vout.script_pubkey) != addr_desc {
                        continue;
                    }
                    if spent_in_mempool.contains(&(txid.clone(), n as u32)) {
                        continue;
                    }
                    result.push(UtxoView {
                        txid: txid.clone(),
                        vout: n as u32,
                        value_sat: vout.value_sat,
                        height: 0,
                        confirmations: 0,
                        locktime: Some(parsed.lock_time),
                        stake_contract: None,
                    });
                }
            }
        }

        let balance = self.index.get_addr_desc_balance(&addr_desc.0, BalanceDetail::Utxo)?;
        if let Some(balance) = balance {
            let mut running = balance.balance_sat;

            for utxo in balance.utxos.iter().rev() {
                if spent_in_mempool.contains(&(utxo.txid.clone(), utxo.vout)) {
                    continue;
                }

                let stake_contract = self.stake_contract_flag(&utxo.txid, utxo.vout);

                result.push(UtxoView {
                    txid: utxo.txid.clone(),
                    vout: utxo.vout,
                    value_sat: utxo.value_sat,
                    height: utxo.height,
                    confirmations: (best_height - utxo.height + 1).max(0),
                    locktime: None,
                    stake_contract,
                });
                running -= utxo.value_sat;
            }

            if running != 0 {
                tracing::warn!(address = %address, residue = running, "DB inconsistency: UTXO checksum did not reach zero");
            }
        }

        Ok(result)
    }

    /// Stake-contract flag (spec §9 open question): set when the source
    /// output pays more than one address, matching the simplest reading of
    /// the ambiguous upstream rule (multi-address output ⇒ cold-stake).
    fn stake_contract_flag(&self, txid: &str, vout: u32) -> Option<bool> {
        let ta = self.index.get_tx_addresses(txid).ok().flatten()?;
        let output = ta.outputs.get(vout as usize)?;
        Some(stake_contract_from_addresses(&output.addresses))
    }
}

fn stake_contract_from_addresses(addresses: &[String]) -> bool {
    addresses.len() > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_contract_heuristic_triggers_on_multi_address_output() {
        assert!(stake_contract_from_addresses(&["SStaker".into(), "DOwner".into()]));
        assert!(!stake_contract_from_addresses(&["D1".into()]));
    }
}
