use serde::Serialize;
use serde::Deserialize;
use std::fmt;

/// Output of the script classification decision tree (spec §4.5).
///
/// One enum covers both the visible address list a script maps to and the
/// bookkeeping the Worker needs (searchable flag, sentinel markers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ScriptClassification {
    P2PKH(String),
    P2SH(String),
    P2PK(String),
    ColdStake { staker: String, owner: String },
    ZerocoinMint,
    ZerocoinSpend,
    OpReturn,
    Coinbase,
    Coinstake,
    Nonstandard,
}

impl ScriptClassification {
    /// Addresses this classification contributes to the address index.
    /// Zerocoin, OP_RETURN, and the coinbase/coinstake sentinels are
    /// intentionally unindexed (spec §4.5 "Indexability rule").
    pub fn addresses(&self) -> Vec<String> {
        match self {
            ScriptClassification::P2PKH(a) | ScriptClassification::P2SH(a) | ScriptClassification::P2PK(a) => {
                vec![a.clone()]
            }
            ScriptClassification::ColdStake { staker, owner } => vec![staker.clone(), owner.clone()],
            _ => Vec::new(),
        }
    }

    pub fn searchable(&self) -> bool {
        matches!(
            self,
            ScriptClassification::P2PKH(_)
                | ScriptClassification::P2SH(_)
                | ScriptClassification::P2PK(_)
                | ScriptClassification::ColdStake { .. }
        )
    }

    pub fn is_indexable(&self) -> bool {
        !matches!(
            self,
            ScriptClassification::ZerocoinMint
                | ScriptClassification::ZerocoinSpend
                | ScriptClassification::OpReturn
                | ScriptClassification::Coinbase
                | ScriptClassification::Coinstake
                | ScriptClassification::Nonstandard
        )
    }
}

// ---------------------------------------------------------------------
// Worker domain model (spec §3)
// ---------------------------------------------------------------------

/// Opaque byte string derived from an output script; the canonical index
/// key for addresses. Two human addresses normalize to the same descriptor
/// only if the chain parser considers them equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AddrDesc(pub Vec<u8>);

impl AddrDesc {
    pub fn from_script(script: &[u8]) -> Self {
        AddrDesc(script.to_vec())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for AddrDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Whether the coin's ledger model is UTXO or account-based (spec §9
/// "polymorphic chain behavior"). Only `Utxo` has a concrete implementation
/// here; `Account` is modeled so `Worker` methods can reject it with
/// `WorkerError::Unsupported` rather than silently doing the wrong thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    Utxo,
    Account,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vin {
    pub txid: Option<String>,
    pub vout: Option<u32>,
    pub sequence: u32,
    pub script_sig_hex: Option<String>,
    pub coinbase_hex: Option<String>,
    pub addr_desc: Option<AddrDesc>,
    pub addresses: Vec<String>,
    pub searchable: bool,
    pub value_sat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vout {
    pub n: u32,
    pub value_sat: i64,
    pub script_hex: String,
    pub addresses: Vec<String>,
    pub searchable: bool,
    pub spent: bool,
    pub spent_txid: Option<String>,
    pub spent_height: Option<i32>,
    pub spent_index: Option<i32>,
}

/// Per-contract token transfer, present only on account-chain transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub contract: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
}

/// Full transaction view object (spec §3 `Tx`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tx {
    pub txid: String,
    pub version: i32,
    pub lock_time: u32,
    pub hex: String,
    pub blockhash: Option<String>,
    pub blockheight: i32,
    pub blocktime: i64,
    pub confirmations: i32,
    pub vin: Vec<Vin>,
    pub vout: Vec<Vout>,
    pub fees_sat: i64,
    pub value_in_sat: i64,
    pub value_out_sat: i64,
    pub token_transfers: Option<Vec<TokenTransfer>>,
}

/// Compact per-tx index record (spec §3 `TxAddresses`).
/// `addresses`/`searchable` are cached alongside `addr_desc` rather than
/// recomputed from it: `addr_desc` is a bare address hash (spec §3, shared
/// between plain and cold-stake addresses so a staker can be queried across
/// every owner it's paired with), which on its own doesn't carry enough to
/// re-render a human address or know whether it was P2PKH/P2SH/staker/owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxAddressesInput {
    pub value_sat: i64,
    pub addr_desc: Option<AddrDesc>,
    pub addresses: Vec<String>,
    pub searchable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxAddressesOutput {
    pub value_sat: i64,
    pub addr_desc: Option<AddrDesc>,
    pub addresses: Vec<String>,
    pub searchable: bool,
    pub spent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxAddresses {
    pub height: i32,
    pub inputs: Vec<TxAddressesInput>,
    pub outputs: Vec<TxAddressesOutput>,
}

/// A single entry of an address's UTXO set as stored in the index
/// (spec §3 `AddrBalance.Utxos`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedUtxo {
    pub txid: String,
    pub vout: u32,
    pub height: i32,
    pub value_sat: i64,
}

/// Per-address aggregate (spec §3 `AddrBalance`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddrBalance {
    pub tx_count: u64,
    pub sent_sat: i64,
    pub received_sat: i64,
    pub balance_sat: i64,
    pub utxos: Vec<IndexedUtxo>,
}

/// Block header + supply summary (spec §3 `BlockInfo`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    pub hash: String,
    pub height: i32,
    pub time: i64,
    pub size: u32,
    pub bits: String,
    pub difficulty: f64,
    pub merkle_root: String,
    pub nonce: String,
    pub txids: Vec<String>,
    pub prev_hash: Option<String>,
    pub next_hash: Option<String>,
}

/// UTXO view object returned by `GetAddressUtxo` (spec §3 "UTXO view").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoView {
    pub txid: String,
    pub vout: u32,
    pub value_sat: i64,
    pub height: i32,
    pub confirmations: i32,
    pub locktime: Option<u32>,
    /// Set when this output pays a cold-stake script with more than one
    /// address; see spec §9's open question on the exact trigger rule.
    pub stake_contract: Option<bool>,
}

/// Generic paged-response envelope (spec §6: "all paged responses carry
/// `{ItemsOnPage, Page, TotalPages}`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items_on_page: u32,
    pub page: u32,
    pub total_pages: i32,
    pub items: Vec<T>,
}

/// Detail level requested of `buildAddress` (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    Basic,
    Balance,
    Tokens,
    TxidsOnly,
    LightHistory,
    FullHistory,
}

/// Vout selector used to filter an address's tx history (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoutFilter {
    Off,
    Inputs,
    Outputs,
    Index(i32),
}

#[derive(Debug, Clone)]
pub struct AddressFilter {
    pub vout: VoutFilter,
    pub from_height: i32,
    /// 0 means unbounded ("treated as +infinity", spec §8 boundary cases).
    pub to_height: i32,
    pub contract: Option<String>,
    pub only_confirmed: bool,
}

impl Default for AddressFilter {
    fn default() -> Self {
        AddressFilter {
            vout: VoutFilter::Off,
            from_height: 0,
            to_height: 0,
            contract: None,
            only_confirmed: false,
        }
    }
}

/// Result of resolving a single per-tx touch from the address index
/// (spec §6 "on-wire format of indices[]": positive = output index,
/// bitwise-complement = input index).
#[derive(Debug, Clone, Copy)]
pub enum AddrIndexTouch {
    Output(u32),
    Input(u32),
}

impl AddrIndexTouch {
    pub fn decode(raw: i32) -> Self {
        if raw < 0 {
            AddrIndexTouch::Input(!raw as u32)
        } else {
            AddrIndexTouch::Output(raw as u32)
        }
    }

    pub fn encode(self) -> i32 {
        match self {
            AddrIndexTouch::Output(n) => n as i32,
            AddrIndexTouch::Input(n) => !(n as i32),
        }
    }
}

/// Item handed to the `IndexStore::scan_addr_desc_transactions` callback.
#[derive(Debug, Clone)]
pub struct ScanItem {
    pub txid: String,
    pub height: i32,
    pub touches: Vec<AddrIndexTouch>,
}

/// Early-termination signal from a scan callback (spec §9, replaces
/// `StopIteration`): not an error, just a request to end the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolEntry {
    pub txid: String,
    pub first_seen: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolTouch {
    pub txid: String,
    pub vout: u32,
}

/// Two divergent chain-info supply schemas exist in the wild (spec §9 open
/// question); both are carried until the node version reporting them can be
/// disambiguated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MoneySupply {
    pub money_supply: f64,
    pub zerocoin_supply: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MoneySupplyV2 {
    pub transparent_supply: f64,
    pub shield_supply: f64,
    pub money_supply: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MasternodeInfo {
    pub total: u32,
    pub enabled: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub best_height: i32,
    pub best_hash: String,
    pub in_sync: bool,
    pub mempool_size: usize,
    pub money_supply: Option<MoneySupply>,
    pub money_supply_v2: Option<MoneySupplyV2>,
    pub masternodes: Option<MasternodeInfo>,
    /// Present only when the caller asked for internal diagnostics
    /// (`GetSystemInfo(includeInternal)`, spec §6).
    pub db_size_bytes: Option<u64>,
}

/// `GetBlock` response: header/summary plus one page of its transactions
/// (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDetail {
    pub info: BlockInfo,
    pub items_on_page: u32,
    pub page: u32,
    pub total_pages: i32,
    pub txs: Vec<Tx>,
}

/// Paged response of `GetAddress` (spec §4.2, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressPage {
    pub address: String,
    pub balance_sat: i64,
    pub total_received_sat: i64,
    pub total_sent_sat: i64,
    pub tx_count: u64,
    pub unconfirmed_balance_sat: i64,
    pub unconfirmed_tx_count: u64,
    pub items_on_page: u32,
    pub page: u32,
    pub total_pages: i32,
    pub txids: Vec<String>,
    pub txs: Vec<Tx>,
}

/// One decile bucket of `ComputeFeeStats` (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStats {
    pub from_height: i32,
    pub to_height: i32,
    pub tx_count: usize,
    /// Ascending-sorted fee at each decile boundary, indices `round(i*n/10)`
    /// for `i` in `0..=10`.
    pub decile_fees_sat: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_index_touch_round_trips() {
        for n in [0u32, 1, 5, 255, 1 << 20] {
            let out = AddrIndexTouch::Output(n);
            assert_eq!(out.encode(), n as i32);
            match AddrIndexTouch::decode(out.encode()) {
                AddrIndexTouch::Output(m) => assert_eq!(m, n),
                AddrIndexTouch::Input(_) => panic!("expected output"),
            }

            let inp = AddrIndexTouch::Input(n);
            let encoded = inp.encode();
            assert!(encoded < 0);
            match AddrIndexTouch::decode(encoded) {
                AddrIndexTouch::Input(m) => assert_eq!(m, n),
                AddrIndexTouch::Output(_) => panic!("expected input"),
            }
        }
    }

    #[test]
    fn script_classification_indexability() {
        assert!(ScriptClassification::P2PKH("D1".into()).is_indexable());
        assert!(!ScriptClassification::ZerocoinMint.is_indexable());
        assert!(!ScriptClassification::ZerocoinSpend.is_indexable());
        assert!(!ScriptClassification::OpReturn.is_indexable());
        assert!(!ScriptClassification::Coinbase.is_indexable());
        assert!(!ScriptClassification::Coinstake.is_indexable());
    }

    #[test]
    fn cold_stake_yields_two_addresses() {
        let c = ScriptClassification::ColdStake { staker: "SStaker".into(), owner: "DOwner".into() };
        assert_eq!(c.addresses(), vec!["SStaker".to_string(), "DOwner".to_string()]);
        assert!(c.searchable());
    }
}
