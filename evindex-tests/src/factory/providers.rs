use ethers::providers::ProviderError;
use ethers::types::{Block, Filter, Log, TxHash, U64};
use evindex::Provider;

use crate::factory::stub_block_hash;

pub fn empty_provider() -> impl Provider {
    #[derive(Clone)]
    struct StubProvider;
    #[async_trait::async_trait]
    impl Provider for StubProvider {
        async fn get_block_number(&self) -> Result<U64, ProviderError> {
            Ok(U64::from(0))
        }

        async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, ProviderError> {
            Ok(vec![])
        }

        async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
            Ok(Block {
                number: Some(block_number),
                hash: Some(stub_block_hash(block_number.as_u64())),
                timestamp: (block_number.as_u64() * 12).into(),
                ..Default::default()
            })
        }
    }

    StubProvider
}

#[macro_export]
macro_rules! provider_with_logs {
    ($contract_address:expr) => {{
        use $crate::provider_with_logs;

        provider_with_logs!($contract_address, 18_116_038)
    }};
    ($contract_address:expr, $current_block_number:expr) => {{
        use ethers::providers::ProviderError;
        use ethers::types::{Block, Filter, Log, TxHash, U64};
        use evindex::Provider;
        use $crate::factory::{stub_block_hash, transfer_log};

        #[derive(Clone)]
        struct StubProvider;
        #[async_trait::async_trait]
        impl Provider for StubProvider {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from($current_block_number))
            }

            async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                Ok(vec![transfer_log($contract_address)])
            }

            async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
                Ok(Block {
                    number: Some(block_number),
                    hash: Some(stub_block_hash(block_number.as_u64())),
                    timestamp: (block_number.as_u64() * 12).into(),
                    ..Default::default()
                })
            }
        }

        StubProvider
    }};
}

#[macro_export]
macro_rules! provider_with_empty_logs {
    ($current_block_number:expr) => {{
        use ethers::providers::ProviderError;
        use ethers::types::{Block, Filter, Log, TxHash, U64};
        use evindex::Provider;
        use $crate::factory::stub_block_hash;

        #[derive(Clone)]
        struct StubProvider;
        #[async_trait::async_trait]
        impl Provider for StubProvider {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from($current_block_number))
            }

            async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                Ok(vec![])
            }

            async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
                Ok(Block {
                    number: Some(block_number),
                    hash: Some(stub_block_hash(block_number.as_u64())),
                    timestamp: (block_number.as_u64() * 12).into(),
                    ..Default::default()
                })
            }
        }

        StubProvider
    }};
}

#[macro_export]
macro_rules! provider_with_filter_stubber {
    ($current_block_number:expr, $filter_stubber:expr) => {{
        use ethers::providers::ProviderError;
        use ethers::types::{Block, Filter, Log, TxHash, U64};
        use evindex::Provider;
        use $crate::factory::stub_block_hash;

        #[derive(Clone)]
        struct StubProvider;
        #[async_trait::async_trait]
        impl Provider for StubProvider {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from($current_block_number))
            }

            async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                let filter_stubber = $filter_stubber;

                filter_stubber(filter);

                Ok(vec![])
            }

            async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
                Ok(Block {
                    number: Some(block_number),
                    hash: Some(stub_block_hash(block_number.as_u64())),
                    timestamp: (block_number.as_u64() * 12).into(),
                    ..Default::default()
                })
            }
        }

        StubProvider
    }};
}

/// Stubs the canonical chain's block hashes with `$get_block_hash`,
/// for driving fork-point walks against stored rows
#[macro_export]
macro_rules! provider_with_block_hashes {
    ($current_block_number:expr, $get_block_hash:expr) => {{
        use ethers::providers::ProviderError;
        use ethers::types::{Block, Filter, Log, TxHash, U64};
        use evindex::Provider;

        #[derive(Clone)]
        struct StubProvider;
        #[async_trait::async_trait]
        impl Provider for StubProvider {
            async fn get_block_number(&self) -> Result<U64, ProviderError> {
                Ok(U64::from($current_block_number))
            }

            async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, ProviderError> {
                Ok(vec![])
            }

            async fn get_block(&self, block_number: U64) -> Result<Block<TxHash>, ProviderError> {
                let get_block_hash = $get_block_hash;

                Ok(Block {
                    number: Some(block_number),
                    hash: Some(get_block_hash(block_number.as_u64())),
                    timestamp: (block_number.as_u64() * 12).into(),
                    ..Default::default()
                })
            }
        }

        StubProvider
    }};
}
