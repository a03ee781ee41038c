use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use ethers::types::{Address, Log, U64};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::chains::Chain;
use crate::checkpoints::Checkpoint;
use crate::contracts::{self, ContractAddress};
use crate::hashes::Hashes;
use crate::providers::ws::{self, Notification, WsProvider};
use crate::providers::{self, Provider, ProviderError};
use crate::reorg::{self, ReorgTask};
use crate::{Config, EvindexRepo, Repo, RepoError};

#[derive(Debug, Display)]
pub enum SubscriptionError {
    #[display("repo not connected")]
    RepoConnectionError,
    Provider(ProviderError),
    GenericError(String),
}

impl From<RepoError> for SubscriptionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotConnected => SubscriptionError::RepoConnectionError,
            RepoError::Unknown(error) => SubscriptionError::GenericError(error),
        }
    }
}

impl From<ProviderError> for SubscriptionError {
    fn from(value: ProviderError) -> Self {
        SubscriptionError::Provider(value)
    }
}

/// Spawns one watch loop per chain that has addresses to cover. Each
/// loop holds a WebSocket subscription open and turns divergence
/// signals into reorg tasks; it never writes storage itself.
pub(crate) fn start(
    config: &Config,
    sender: &mpsc::Sender<ReorgTask>,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut addresses_by_chain_id = contracts::group_addresses_by_chain_id(&config.contracts);

    let mut handles = vec![];

    for chain in &config.chains {
        let Some(addresses) = addresses_by_chain_id.remove(&(chain.id as i64)) else {
            continue;
        };

        handles.push(start_for_chain(
            config,
            chain,
            addresses,
            sender.clone(),
            cancel.clone(),
        ));
    }

    handles
}

fn start_for_chain(
    config: &Config,
    chain: &Chain,
    addresses: Vec<ContractAddress>,
    sender: mpsc::Sender<ReorgTask>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let config = config.clone();
    let chain = chain.clone();

    tokio::spawn(async move {
        let chain_id = chain.id as i64;
        let http_provider = providers::get(&chain.json_rpc_url);
        let backoff_base = Duration::from_millis(config.backoff_base_ms);
        let max_backoff = Duration::from_millis(config.max_backoff_ms);
        let mut backoff = backoff_base;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match ws::get(&chain.ws_url).await {
                Ok(ws_provider) => {
                    backoff = backoff_base;

                    if let Err(subscription_error) = watch(
                        &ws_provider,
                        &http_provider,
                        chain_id,
                        &addresses,
                        &sender,
                        &config,
                        &cancel,
                    )
                    .await
                    {
                        warn!(
                            chain_id,
                            %subscription_error,
                            "chain watch interrupted, reconnecting"
                        );
                    }
                }
                Err(provider_error) => {
                    warn!(chain_id, %provider_error, "websocket connect failed, retrying");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(backoff) => {}
            }
            backoff = reorg::next_backoff(backoff, max_backoff);
        }
    })
}

/// Consumes one subscription until it dies or the token cancels. Every
/// header triggers a checkpoint verification sweep; removed logs map
/// to reorg tasks directly.
async fn watch(
    ws_provider: &impl WsProvider,
    http_provider: &Arc<impl Provider>,
    chain_id: i64,
    addresses: &[ContractAddress],
    sender: &mpsc::Sender<ReorgTask>,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(), SubscriptionError> {
    let ethers_addresses = addresses
        .iter()
        .map(|contract_address| contract_address.address.parse::<Address>().unwrap())
        .collect();
    let mut notifications = ws_provider.subscribe(ethers_addresses).await?;

    loop {
        let notification = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            notification = notifications.next() => match notification {
                Some(notification) => notification,
                None => {
                    return Err(SubscriptionError::GenericError(
                        "notification stream ended".to_string(),
                    ))
                }
            },
        };

        match notification {
            Notification::NewHeader(_) => {
                if let Err(subscription_error) =
                    verify_checkpoints(http_provider, chain_id, addresses, sender, config, cancel)
                        .await
                {
                    warn!(
                        chain_id,
                        %subscription_error,
                        "checkpoint verification sweep failed, next header retries"
                    );
                }
            }
            Notification::Log(log) => {
                handle_log(&log, chain_id, sender, config, cancel).await;
            }
        }
    }
}

/// Compares every tracked address's checkpoint hash against the hash
/// the canonical chain now reports for that height. A mismatch means
/// the block the checkpoint vouched for was reorged away.
async fn verify_checkpoints(
    http_provider: &Arc<impl Provider>,
    chain_id: i64,
    addresses: &[ContractAddress],
    sender: &mpsc::Sender<ReorgTask>,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<(), SubscriptionError> {
    let rpc_timeout = Duration::from_millis(config.rpc_timeout_ms);
    let backoff_base = Duration::from_millis(config.backoff_base_ms);
    let max_backoff = Duration::from_millis(config.max_backoff_ms);

    let pool = config.repo.get_pool(1).await?;
    let mut conn = EvindexRepo::get_conn(&pool).await?;

    let checkpoints = EvindexRepo::get_checkpoints(&mut conn, chain_id).await?;
    let checkpoints_by_address: HashMap<&str, &Checkpoint> = checkpoints
        .iter()
        .map(|checkpoint| (checkpoint.address.as_str(), checkpoint))
        .collect();

    for contract_address in addresses {
        let Some(checkpoint) = checkpoints_by_address.get(contract_address.address.as_str())
        else {
            continue;
        };

        let canonical_block = providers::with_timeout(
            rpc_timeout,
            http_provider.get_block(U64::from(checkpoint.get_block_number())),
        )
        .await?;

        if providers::get_block_hash(&canonical_block)? != checkpoint.block_hash {
            warn!(
                chain_id,
                address = %checkpoint.address,
                block_number = checkpoint.block_number,
                "checkpoint hash diverged from the canonical chain"
            );

            reorg::enqueue(
                sender,
                ReorgTask::new(
                    chain_id,
                    &checkpoint.address,
                    checkpoint.block_number,
                    backoff_base,
                ),
                config.retry_limit,
                max_backoff,
                cancel,
            )
            .await;
        }
    }

    Ok(())
}

/// Removed logs are the node telling us a block we may have ingested
/// left the canonical chain. Live logs are skipped: the scanner owns
/// forward ingestion.
async fn handle_log(
    log: &Log,
    chain_id: i64,
    sender: &mpsc::Sender<ReorgTask>,
    config: &Config,
    cancel: &CancellationToken,
) {
    if log.removed != Some(true) {
        debug!(chain_id, "skipping live log notification");
        return;
    }

    let Some(block_number) = log.block_number else {
        debug!(chain_id, "removed log carries no block number, skipping");
        return;
    };

    let address = Hashes::h160_to_string(&log.address);
    warn!(
        chain_id,
        address = %address,
        block_number = block_number.as_u64(),
        "node removed a log, queueing rollback check"
    );

    reorg::enqueue(
        sender,
        ReorgTask::new(
            chain_id,
            &address,
            block_number.as_u64() as i64,
            Duration::from_millis(config.backoff_base_ms),
        ),
        config.retry_limit,
        Duration::from_millis(config.max_backoff_ms),
        cancel,
    )
    .await;
}
