pub mod address;
pub mod api;
pub mod cache;
pub mod chain;
pub mod config;
pub mod errors;
pub mod index;
pub mod mempool;
pub mod metrics;
pub mod rpc;
pub mod script_utils;
pub mod telemetry;
pub mod types;
pub mod worker;

pub use errors::WorkerError;
pub use worker::Worker;
