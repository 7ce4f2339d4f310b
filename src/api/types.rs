// API Type Definitions
//
// Request query parameters and the Blockbook-compatible error envelope.
// Response bodies are the Worker's own `crate::types` structs (`Tx`,
// `AddressPage`, `UtxoView`, `BlockDetail`, `SystemInfo`), serialized
// straight through rather than remapped into parallel API-layer shapes.

use serde::{Deserialize, Serialize};

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    1000
}

fn default_details() -> String {
    "txids".to_string()
}

// Custom deserializer for `from` that accepts "-Infinity" (blockbook clients
// send this to mean "from the beginning").
fn deserialize_from_param<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(s) if s == "-Infinity" => Ok(Some(0)),
        Some(s) => s.parse::<u32>().map(Some).map_err(|_| D::Error::custom(format!("invalid 'from' parameter: {}", s))),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AddressQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(default, deserialize_with = "deserialize_from_param")]
    pub from: Option<u32>,
    pub to: Option<u32>,
    #[serde(default = "default_details")]
    pub details: String,
    pub contract: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UtxoQuery {
    #[serde(default)]
    pub confirmed: bool,
}

/// Blockbook-compatible error response wrapper.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BlockbookError {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}

impl BlockbookError {
    pub fn new(message: impl Into<String>) -> Self {
        BlockbookError { error: ErrorDetail { message: message.into() } }
    }
}

impl From<&crate::errors::WorkerError> for BlockbookError {
    fn from(e: &crate::errors::WorkerError) -> Self {
        BlockbookError::new(e.to_string())
    }
}
