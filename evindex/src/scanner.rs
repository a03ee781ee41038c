use std::cmp::min;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use ethers::types::{Address, Filter as EthersFilter, U64};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::checkpoints::UnsavedCheckpoint;
use crate::commit::{self, CommitParams};
use crate::contracts::{ContractAddress, ContractEventTopic};
use crate::decoders::DecoderRegistry;
use crate::events;
use crate::providers::{self, Provider, ProviderError};
use crate::{Config, EvindexRepo, EvindexRepoConn, Repo, RepoError};

#[derive(Debug, Display)]
pub enum ScannerError {
    #[display("repo not connected")]
    RepoConnectionError,
    Provider(ProviderError),
    GenericError(String),
}

impl From<RepoError> for ScannerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotConnected => ScannerError::RepoConnectionError,
            RepoError::Unknown(error) => ScannerError::GenericError(error),
        }
    }
}

impl From<ProviderError> for ScannerError {
    fn from(value: ProviderError) -> Self {
        ScannerError::Provider(value)
    }
}

/// Spawns one scan loop per contract address. Each loop ticks at
/// `scan_interval_ms` until the token cancels, finishing the tick in
/// flight first.
pub(crate) fn start(
    config: &Config,
    registry: &Arc<DecoderRegistry>,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let json_rpc_urls_by_chain_id: HashMap<i64, String> = config
        .chains
        .iter()
        .map(|chain| (chain.id as i64, chain.json_rpc_url.clone()))
        .collect();

    let mut handles = vec![];

    for contract in &config.contracts {
        let topics = contract.get_event_topics();

        for contract_address in &contract.addresses {
            let Some(json_rpc_url) = json_rpc_urls_by_chain_id.get(&contract_address.chain_id)
            else {
                error!(
                    chain_id = contract_address.chain_id,
                    address = %contract_address.address,
                    "skipping contract address, its chain is not configured"
                );
                continue;
            };

            handles.push(start_for_contract_address(
                config,
                json_rpc_url,
                contract_address,
                topics.clone(),
                registry.clone(),
                cancel.clone(),
            ));
        }
    }

    handles
}

fn start_for_contract_address(
    config: &Config,
    json_rpc_url: &str,
    contract_address: &ContractAddress,
    topics: Vec<ContractEventTopic>,
    registry: Arc<DecoderRegistry>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let config = config.clone();
    let json_rpc_url = json_rpc_url.to_string();
    let contract_address = contract_address.clone();

    tokio::spawn(async move {
        let provider = providers::get(&json_rpc_url);
        let mut interval = interval(Duration::from_millis(config.scan_interval_ms));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(scanner_error) =
                        sync_once(&provider, &contract_address, &topics, &registry, &config).await
                    {
                        error!(
                            chain_id = contract_address.chain_id,
                            address = %contract_address.address,
                            %scanner_error,
                            "scan tick failed, retrying next tick"
                        );
                    }
                }
            }
        }
    })
}

async fn sync_once(
    provider: &Arc<impl Provider>,
    contract_address: &ContractAddress,
    topics: &[ContractEventTopic],
    registry: &DecoderRegistry,
    config: &Config,
) -> Result<(), ScannerError> {
    let pool = config.repo.get_pool(1).await?;
    let mut conn = EvindexRepo::get_conn(&pool).await?;

    sync_logs(&mut conn, provider, contract_address, topics, registry, config).await
}

/// One scan tick: compute the unscanned range, fetch its logs, decode
/// them and commit rows plus the advanced checkpoint atomically. Fails
/// as a whole; the checkpoint only moves when everything landed.
pub async fn sync_logs<'a>(
    conn: &mut EvindexRepoConn<'a>,
    provider: &Arc<impl Provider>,
    contract_address: &ContractAddress,
    topics: &[ContractEventTopic],
    registry: &DecoderRegistry,
    Config {
        blocks_per_batch,
        rpc_timeout_ms,
        ..
    }: &Config,
) -> Result<(), ScannerError> {
    let rpc_timeout = Duration::from_millis(*rpc_timeout_ms);

    let checkpoint = EvindexRepo::get_checkpoint(
        conn,
        contract_address.chain_id,
        &contract_address.address,
    )
    .await?;

    let current_block_number =
        providers::with_timeout(rpc_timeout, provider.get_block_number()).await?;

    let (from_block, to_block) = get_block_range(
        checkpoint.map(|checkpoint| checkpoint.block_number),
        contract_address.start_block_number,
        current_block_number.as_u64(),
        *blocks_per_batch,
    );

    if from_block > to_block {
        info!(
            chain_id = contract_address.chain_id,
            address = %contract_address.address,
            "no new blocks"
        );
        return Ok(());
    }

    let filter = build_filter(contract_address, topics, from_block, to_block);
    let logs = providers::with_timeout(rpc_timeout, provider.get_logs(&filter)).await?;

    let checkpoint_block =
        providers::with_timeout(rpc_timeout, provider.get_block(U64::from(to_block))).await?;
    let checkpoint_block_hash = providers::get_block_hash(&checkpoint_block)?;

    let blocks_by_number =
        providers::with_timeout(rpc_timeout, provider.get_blocks_by_number(&logs)).await?;
    let event_logs = events::get(&logs, contract_address, registry, &blocks_by_number);

    let checkpoint = UnsavedCheckpoint::new(
        contract_address.chain_id,
        &contract_address.address,
        to_block as i64,
        &checkpoint_block_hash,
    );

    commit::run(conn, CommitParams::new(checkpoint, event_logs)).await?;

    Ok(())
}

fn get_block_range(
    checkpoint_block_number: Option<i64>,
    start_block_number: i64,
    current_block_number: u64,
    blocks_per_batch: u64,
) -> (u64, u64) {
    let from_block = match checkpoint_block_number {
        Some(block_number) => block_number as u64 + 1,
        None => start_block_number as u64,
    };
    let to_block = min(from_block + blocks_per_batch, current_block_number);

    (from_block, to_block)
}

fn build_filter(
    contract_address: &ContractAddress,
    topics: &[ContractEventTopic],
    from_block: u64,
    to_block: u64,
) -> EthersFilter {
    let filter = EthersFilter::new()
        .address(contract_address.address.parse::<Address>().unwrap())
        .from_block(from_block)
        .to_block(to_block);

    if topics.is_empty() {
        filter
    } else {
        filter.topic0(topics.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ethers::types::H256;
    use ethers::utils::keccak256;

    use crate::ChainId;
    use crate::Contract;

    fn usdc_address() -> ContractAddress {
        Contract::new("UsdCoin")
            .add_address(
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                &ChainId::Mainnet,
                6_082_465,
            )
            .addresses
            .first()
            .cloned()
            .unwrap()
    }

    #[test]
    fn scans_from_start_block_without_a_checkpoint() {
        let (from_block, to_block) = get_block_range(None, 6_082_465, 6_090_000, 100);

        assert_eq!(from_block, 6_082_465);
        assert_eq!(to_block, 6_082_565);
    }

    #[test]
    fn resumes_from_the_block_after_the_checkpoint() {
        let (from_block, to_block) = get_block_range(Some(6_082_565), 6_082_465, 6_090_000, 100);

        assert_eq!(from_block, 6_082_566);
        assert_eq!(to_block, 6_082_666);
    }

    #[test]
    fn clamps_the_range_to_the_chain_head() {
        let (from_block, to_block) = get_block_range(Some(6_082_565), 6_082_465, 6_082_600, 100);

        assert_eq!(from_block, 6_082_566);
        assert_eq!(to_block, 6_082_600);
    }

    #[test]
    fn produces_an_empty_range_when_the_head_was_already_scanned() {
        let (from_block, to_block) = get_block_range(Some(6_082_600), 6_082_465, 6_082_600, 100);

        assert!(from_block > to_block);
    }

    #[test]
    fn filters_on_the_contract_signature_topics() {
        let topic = H256::from(keccak256("Transfer(address,address,uint256)"));

        let filter = build_filter(&usdc_address(), &[topic], 10, 20);

        assert_eq!(filter.get_from_block(), Some(10.into()));
        assert_eq!(filter.get_to_block(), Some(20.into()));
        assert!(filter.topics[0].is_some());
    }

    #[test]
    fn leaves_topics_unfiltered_for_contracts_without_decoders() {
        let filter = build_filter(&usdc_address(), &[], 10, 20);

        assert!(filter.topics[0].is_none());
    }
}
