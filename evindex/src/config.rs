use crate::chains::Chain;
use crate::contracts::Contract;
use crate::EvindexRepo;

pub enum ConfigError {
    NoContract,
    NoChain,
}

impl std::fmt::Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoContract => {
                write!(f, "At least one contract is required")
            }
            ConfigError::NoChain => {
                write!(f, "At least one chain is required")
            }
        }
    }
}

/// Builder for everything the indexer needs at startup: the repo,
/// the chains to follow, the contracts to index and the tuning knobs
/// for scanning and reorg recovery.
///
/// # Example
/// ```ignore
/// use evindex::{Chain, ChainId, Config, Contract, PostgresRepo};
///
/// let config = Config::new(PostgresRepo::new(&database_url))
///     .add_chain(Chain::new(
///         ChainId::Mainnet,
///         "https://eth.llamarpc.com",
///         "wss://eth.llamarpc.com",
///     ))
///     .add_contract(usd_coin_contract);
/// ```
#[derive(Clone)]
pub struct Config {
    pub repo: EvindexRepo,
    pub chains: Vec<Chain>,
    pub contracts: Vec<Contract>,
    pub blocks_per_batch: u64,
    pub scan_interval_ms: u64,
    pub reorg_window: u64,
    pub retry_limit: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    pub reorg_queue_size: usize,
    pub rpc_timeout_ms: u64,
}

impl Config {
    pub fn new(repo: EvindexRepo) -> Self {
        Self {
            repo,
            chains: vec![],
            contracts: vec![],
            blocks_per_batch: 100,
            scan_interval_ms: 5_000,
            reorg_window: 50,
            retry_limit: 10,
            backoff_base_ms: 1_000,
            max_backoff_ms: 60_000,
            reorg_queue_size: 1_000,
            rpc_timeout_ms: 10_000,
        }
    }

    pub fn add_chain(mut self, chain: Chain) -> Self {
        self.chains.push(chain);

        self
    }

    pub fn add_contract(mut self, contract: Contract) -> Self {
        self.contracts.push(contract);

        self
    }

    /// Maximum block span fetched per scanner tick.
    pub fn with_blocks_per_batch(mut self, blocks_per_batch: u64) -> Self {
        self.blocks_per_batch = blocks_per_batch;

        self
    }

    pub fn with_scan_interval_ms(mut self, scan_interval_ms: u64) -> Self {
        self.scan_interval_ms = scan_interval_ms;

        self
    }

    /// Page size for the descending fork-point walk over stored logs.
    pub fn with_reorg_window(mut self, reorg_window: u64) -> Self {
        self.reorg_window = reorg_window;

        self
    }

    /// How many times a reorg task or a full-queue enqueue is retried
    /// before it gets dropped.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;

        self
    }

    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;

        self
    }

    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff_ms = max_backoff_ms;

        self
    }

    pub fn with_reorg_queue_size(mut self, reorg_queue_size: usize) -> Self {
        self.reorg_queue_size = reorg_queue_size;

        self
    }

    pub fn with_rpc_timeout_ms(mut self, rpc_timeout_ms: u64) -> Self {
        self.rpc_timeout_ms = rpc_timeout_ms;

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contracts.is_empty() {
            Err(ConfigError::NoContract)
        } else if self.chains.is_empty() {
            Err(ConfigError::NoChain)
        } else {
            Ok(())
        }
    }
}
