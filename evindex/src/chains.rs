/// Represents the network ID for an EVM Chain
/// For example, `ChainId::Mainnet`, `ChainId::Polygon`, etc.
pub type ChainId = ethers::types::Chain;

/// Represents an EVM chain network
#[derive(Clone, Debug)]
pub struct Chain {
    pub id: ChainId,
    /// HTTP JSON-RPC endpoint used by scanners and the reorg resolver
    pub json_rpc_url: String,
    /// WebSocket JSON-RPC endpoint used by the live subscription
    pub ws_url: String,
}

impl Chain {
    /// Builds the chain network
    ///
    ///
    /// # Example
    /// ```
    /// use evindex::{Chain, ChainId};
    ///
    /// Chain::new(
    ///     ChainId::Polygon,
    ///     "https://polygon-mainnet.g.alchemy.com/v2/...",
    ///     "wss://polygon-mainnet.g.alchemy.com/v2/...",
    /// );
    /// ```
    pub fn new(id: ChainId, json_rpc_url: &str, ws_url: &str) -> Self {
        Self {
            id,
            json_rpc_url: json_rpc_url.to_string(),
            ws_url: ws_url.to_string(),
        }
    }
}
