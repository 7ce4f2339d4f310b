use std::net::SocketAddr;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, Options, DB};

use pivx_explorer_worker::api::build_router;
use pivx_explorer_worker::cache::LruTxCache;
use pivx_explorer_worker::chain::{Network, PivxParser};
use pivx_explorer_worker::config::{get_global_config, init_global_config};
use pivx_explorer_worker::index::RocksIndexStore;
use pivx_explorer_worker::mempool::{run_mempool_monitor, MempoolState};
use pivx_explorer_worker::rpc::PivxNodeClient;
use pivx_explorer_worker::telemetry::{init_tracing, TelemetryConfig};
use pivx_explorer_worker::Worker;

const COLUMN_FAMILIES: [&str; 7] =
    ["blocks", "transactions", "addr_index", "utxo", "chain_metadata", "pubkey", "chain_state"];

fn open_index_db(db_path: &str) -> Result<Arc<DB>, Box<dyn std::error::Error>> {
    let mut cf_descriptors = vec![ColumnFamilyDescriptor::new("default", Options::default())];
    for cf in COLUMN_FAMILIES.iter() {
        cf_descriptors.push(ColumnFamilyDescriptor::new(cf.to_string(), Options::default()));
    }

    let mut db_options = Options::default();
    db_options.create_if_missing(true);
    db_options.create_missing_column_families(true);
    db_options.set_write_buffer_size(256 * 1024 * 1024);
    db_options.set_max_write_buffer_number(4);
    db_options.set_min_write_buffer_number_to_merge(2);
    db_options.set_target_file_size_base(256 * 1024 * 1024);
    db_options.set_level_zero_file_num_compaction_trigger(8);
    db_options.set_max_background_jobs(8);
    db_options.set_compression_type(rocksdb::DBCompressionType::Lz4);
    db_options.increase_parallelism(8);

    Ok(Arc::new(DB::open_cf_descriptors(&db_options, db_path, cf_descriptors)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_global_config()?;
    let config = get_global_config();

    init_tracing(TelemetryConfig::default())?;
    pivx_explorer_worker::metrics::init_metrics()?;

    let db_path = config.get_string("paths.db_path").map_err(|_| "missing paths.db_path in config")?;
    let network = match config.get_string("network").unwrap_or_else(|_| "main".to_string()).as_str() {
        "test" | "testnet" => Network::Test,
        _ => Network::Main,
    };

    let db = open_index_db(&db_path)?;
    let index = Arc::new(RocksIndexStore::new(Arc::clone(&db))?);
    let node = Arc::new(PivxNodeClient::from_global_config()?);
    let tx_cache = Arc::new(LruTxCache::new(node.clone(), 10_000));
    let mempool_state = Arc::new(MempoolState::new());
    let parser = Arc::new(PivxParser::new(network));

    let worker = Arc::new(Worker::new(index, tx_cache.clone(), node.clone(), mempool_state.clone(), parser.clone()));

    let monitor_node = node.clone();
    let monitor_tx_cache = tx_cache.clone();
    let monitor_parser = parser.clone();
    let monitor_mempool = mempool_state.clone();
    tokio::spawn(async move {
        if let Err(e) = run_mempool_monitor(monitor_mempool, monitor_node, monitor_tx_cache, monitor_parser, 10).await {
            tracing::error!(error = %e, "mempool monitor exited");
        }
    });

    let app = build_router(worker);
    let listen_addr = config.get_string("server.listen_addr").unwrap_or_else(|_| "0.0.0.0:3005".to_string());
    let addr: SocketAddr = listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}