/// Transaction assembly (spec §4.1): the most involved builder. Each input
/// is resolved against the index first, then the Tx Cache, then the parser's
/// unknown-input fallback; each output is classified and, on request,
/// resolved to its spending tx via the bitwise-complement address-index
/// scan.
use crate::errors::WorkerError;
use crate::types::{AddrDesc, AddrIndexTouch, ScanControl, Tx, Vin, Vout};

use super::Worker;

struct ResolvedInput {
    value_sat: i64,
    addr_desc: AddrDesc,
    addresses: Vec<String>,
    searchable: bool,
}

impl Worker {
    pub async fn build_tx(&self, txid: &str, with_spending_txs: bool) -> Result<Tx, WorkerError> {
        let timer = crate::metrics::Timer::new();
        let result = self.build_tx_inner(txid, with_spending_txs).await;
        crate::metrics::record_worker_query("build_tx", timer.elapsed_secs());
        result
    }

    async fn build_tx_inner(&self, txid: &str, with_spending_txs: bool) -> Result<Tx, WorkerError> {
        let parsed = self.tx_cache.get_transaction(txid)?;
        let ta = self.index.get_tx_addresses(txid)?;

        let (height, blockhash, blocktime, confirmations) = match &ta {
            Some(ta) => {
                let blockhash = self.index.get_block_hash(ta.height)?;
                let (best_height, _) = self.index.get_best_block()?;
                let confirmations = (best_height - ta.height + 1).max(0);
                let blocktime = blockhash
                    .as_deref()
                    .and_then(|_| self.index.get_block_info(ta.height).ok().flatten())
                    .map(|info| info.time)
                    .unwrap_or(0);
                (ta.height, blockhash, blocktime, confirmations)
            }
            None => {
                let first_seen = self.mempool.entry(txid).map(|e| e.first_seen).unwrap_or(0);
                (0, None, first_seen, 0)
            }
        };

        let mut value_in_sat: i64 = 0;
        let mut vin = Vec::with_capacity(parsed.vin.len());

        for input in &parsed.vin {
            match &input.prevout {
                None => {
                    vin.push(Vin {
                        txid: None,
                        vout: None,
                        sequence: input.sequence,
                        script_sig_hex: None,
                        coinbase_hex: input.coinbase.as_ref().map(hex::encode),
                        addr_desc: None,
                        addresses: Vec::new(),
                        searchable: false,
                        value_sat: 0,
                    });
                }
                Some((src_txid, src_vout)) => {
                    let resolved = self.resolve_input_value(src_txid, *src_vout, &input.script_sig)?;
                    value_in_sat += resolved.value_sat;
                    vin.push(Vin {
                        txid: Some(src_txid.clone()),
                        vout: Some(*src_vout),
                        sequence: input.sequence,
                        script_sig_hex: Some(hex::encode(&input.script_sig)),
                        coinbase_hex: None,
                        addr_desc: Some(resolved.addr_desc.clone()),
                        addresses: resolved.addresses,
                        searchable: resolved.searchable,
                        value_sat: resolved.value_sat,
                    });
                }
            }
        }

        let mut value_out_sat: i64 = 0;
        let mut vout = Vec::with_capacity(parsed.vout.len());

        for (n, output) in parsed.vout.iter().enumerate() {
            value_out_sat += output.value_sat;
            let classification = self.parser.classify(&output.script_pubkey);
            let addresses = classification.addresses();
            let searchable = classification.searchable();

            let spent = ta.as_ref().and_then(|ta| ta.outputs.get(n)).map(|o| o.spent).unwrap_or(false);

            let (spent_txid, spent_height, spent_index) = if spent && with_spending_txs {
                let output_addr_desc = self.parser.addr_desc_for_script(&output.script_pubkey);
                match self.find_spending_tx(txid, n as u32, height, &output_addr_desc, output.value_sat)? {
                    Some((spend_txid, idx)) => {
                        let spend_height =
                            self.index.get_tx_addresses(&spend_txid)?.map(|ta| ta.height).unwrap_or(0);
                        (Some(spend_txid), Some(spend_height), Some(idx))
                    }
                    None => (None, None, None),
                }
            } else {
                (None, None, None)
            };

            vout.push(Vout {
                n: n as u32,
                value_sat: output.value_sat,
                script_hex: hex::encode(&output.script_pubkey),
                addresses,
                searchable,
                spent,
                spent_txid,
                spent_height,
                spent_index,
            });
        }

        let fees_sat = if vin.iter().all(|v| v.txid.is_none()) {
            0
        } else {
            (value_in_sat - value_out_sat).max(0)
        };

        Ok(Tx {
            txid: parsed.txid.clone(),
            version: parsed.version,
            lock_time: parsed.lock_time,
            hex: parsed.hex.clone(),
            blockhash,
            blockheight: height,
            blocktime,
            confirmations,
            vin,
            vout,
            fees_sat,
            value_in_sat,
            value_out_sat,
            token_transfers: None,
        })
    }

    /// `GetSpendingTxid` (spec §6 public surface): resolves the tx+input
    /// index that spends `(txid, vout)`, or `None` if unspent/unindexed.
    pub async fn get_spending_txid(&self, txid: &str, vout_index: u32) -> Result<Option<(String, i32)>, WorkerError> {
        let Some(ta) = self.index.get_tx_addresses(txid)? else { return Ok(None) };
        let Some(output) = ta.outputs.get(vout_index as usize) else { return Ok(None) };
        if !output.spent {
            return Ok(None);
        }
        let Some(addr_desc) = &output.addr_desc else { return Ok(None) };
        self.find_spending_tx(txid, vout_index, ta.height, addr_desc, output.value_sat)
    }

    /// Input resolution chain (spec §4.1 step 3): index hit, Tx Cache miss
    /// fallback, then the parser's unknown-input recovery (zerocoin-spend
    /// denomination) when the source tx is unknown to both.
    fn resolve_input_value(&self, src_txid: &str, src_vout: u32, script_sig: &[u8]) -> Result<ResolvedInput, WorkerError> {
        if let Some(ta) = self.index.get_tx_addresses(src_txid)? {
            if let Some(output) = ta.outputs.get(src_vout as usize) {
                return Ok(ResolvedInput {
                    value_sat: output.value_sat,
                    addr_desc: output.addr_desc.clone().unwrap_or_else(|| AddrDesc(Vec::new())),
                    addresses: output.addresses.clone(),
                    searchable: output.searchable,
                });
            }
        }

        match self.tx_cache.get_transaction(src_txid) {
            Ok(parsed) => match parsed.vout.get(src_vout as usize) {
                Some(output) => {
                    let classification = self.parser.classify(&output.script_pubkey);
                    Ok(ResolvedInput {
                        value_sat: output.value_sat,
                        addr_desc: self.parser.addr_desc_for_script(&output.script_pubkey),
                        addresses: classification.addresses(),
                        searchable: classification.searchable(),
                    })
                }
                None => Ok(ResolvedInput {
                    value_sat: self.parser.value_sat_for_unknown_input(script_sig),
                    addr_desc: self.parser.addr_desc_for_unknown_input(script_sig),
                    addresses: Vec::new(),
                    searchable: false,
                }),
            },
            Err(_) => Ok(ResolvedInput {
                value_sat: self.parser.value_sat_for_unknown_input(script_sig),
                addr_desc: self.parser.addr_desc_for_unknown_input(script_sig),
                addresses: Vec::new(),
                searchable: false,
            }),
        }
    }

    fn find_spending_tx(
        &self,
        source_txid: &str,
        source_vout: u32,
        source_height: i32,
        output_addr_desc: &AddrDesc,
        output_value_sat: i64,
    ) -> Result<Option<(String, i32)>, WorkerError> {
        let mut found: Option<(String, i32)> = None;
        let mut scan_err: Option<WorkerError> = None;

        self.index.scan_addr_desc_transactions(&output_addr_desc.0, source_height, 0, &mut |item| {
            for touch in &item.touches {
                let AddrIndexTouch::Input(idx) = touch else { continue };
                let idx = *idx as usize;

                let candidate_ta = match self.index.get_tx_addresses(&item.txid) {
                    Ok(ta) => ta,
                    Err(e) => {
                        scan_err = Some(e);
                        return ScanControl::Stop;
                    }
                };
                let Some(ta) = candidate_ta else { continue };
                let Some(candidate_input) = ta.inputs.get(idx) else { continue };
                if candidate_input.value_sat != output_value_sat {
                    continue;
                }

                let parsed = match self.tx_cache.get_transaction(&item.txid) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                let Some(vin) = parsed.vin.get(idx) else { continue };
                if vin.prevout.as_ref().map(|(t, v)| t == source_txid && *v == source_vout) == Some(true) {
                    found = Some((item.txid.clone(), idx as i32));
                    return ScanControl::Stop;
                }
            }
            ScanControl::Continue
        })?;

        if let Some(e) = scan_err {
            return Err(e);
        }
        Ok(found)
    }
}
