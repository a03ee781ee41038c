use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use ethers::types::U64;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::checkpoints::UnsavedCheckpoint;
use crate::commit::{self, CommitParams};
use crate::contracts;
use crate::providers::{self, Provider, ProviderError};
use crate::{Config, EvindexRepo, EvindexRepoConn, Repo, RepoError};

#[derive(Debug, Display)]
pub enum ReorgError {
    #[display("repo not connected")]
    RepoConnectionError,
    Provider(ProviderError),
    GenericError(String),
}

impl From<RepoError> for ReorgError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotConnected => ReorgError::RepoConnectionError,
            RepoError::Unknown(error) => ReorgError::GenericError(error),
        }
    }
}

impl From<ProviderError> for ReorgError {
    fn from(value: ProviderError) -> Self {
        ReorgError::Provider(value)
    }
}

/// A suspicion that the logs stored for an address at and above some
/// block no longer sit on the canonical chain
#[derive(Clone, Debug, PartialEq)]
pub struct ReorgTask {
    pub chain_id: i64,
    pub address: String,
    pub block_number: i64,
    pub retries: u32,
    pub backoff: Duration,
}

impl ReorgTask {
    pub fn new(chain_id: i64, address: &str, block_number: i64, backoff_base: Duration) -> Self {
        Self {
            chain_id,
            address: address.to_lowercase(),
            block_number,
            retries: 0,
            backoff: backoff_base,
        }
    }

    /// True once the task burned through its retry budget
    pub fn is_exhausted(&self, retry_limit: u32) -> bool {
        self.retries > retry_limit
    }
}

pub fn queue(capacity: usize) -> (mpsc::Sender<ReorgTask>, mpsc::Receiver<ReorgTask>) {
    mpsc::channel(capacity)
}

/// Queues a task without ever blocking the caller. When the queue
/// stays full through `retry_limit` backed-off attempts the task is
/// dropped; the next divergent header re-detects the same fork.
pub async fn enqueue(
    sender: &mpsc::Sender<ReorgTask>,
    mut task: ReorgTask,
    retry_limit: u32,
    max_backoff: Duration,
    cancel: &CancellationToken,
) {
    let mut retries = 0;

    loop {
        match sender.try_send(task) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("reorg queue closed, dropping task");
                return;
            }
            Err(mpsc::error::TrySendError::Full(returned_task)) => {
                task = returned_task;

                if retries == retry_limit {
                    error!(
                        chain_id = task.chain_id,
                        address = %task.address,
                        block_number = task.block_number,
                        "reorg queue stayed full, dropping task"
                    );
                    return;
                }
                retries += 1;

                warn!(
                    chain_id = task.chain_id,
                    address = %task.address,
                    "reorg queue full, retrying shortly"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = sleep(task.backoff) => {}
                }
                task.backoff = next_backoff(task.backoff, max_backoff);
            }
        }
    }
}

/// Spawns the single consumer draining the reorg queue serially, so
/// recoveries for different addresses never interleave their commits.
pub(crate) fn start(
    config: &Config,
    sender: mpsc::Sender<ReorgTask>,
    mut receiver: mpsc::Receiver<ReorgTask>,
    cancel: &CancellationToken,
) -> JoinHandle<()> {
    let config = config.clone();
    let cancel = cancel.clone();

    tokio::spawn(async move {
        let json_rpc_urls_by_chain_id: HashMap<i64, String> = config
            .chains
            .iter()
            .map(|chain| (chain.id as i64, chain.json_rpc_url.clone()))
            .collect();
        let start_blocks_by_address = contracts::group_start_blocks_by_address(&config.contracts);
        let max_backoff = Duration::from_millis(config.max_backoff_ms);

        loop {
            let task = tokio::select! {
                _ = cancel.cancelled() => break,
                task = receiver.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            if task.is_exhausted(config.retry_limit) {
                error!(
                    chain_id = task.chain_id,
                    address = %task.address,
                    retries = task.retries,
                    "dropping reorg task, retry limit exhausted"
                );
                continue;
            }

            let Some(json_rpc_url) = json_rpc_urls_by_chain_id.get(&task.chain_id) else {
                error!(
                    chain_id = task.chain_id,
                    address = %task.address,
                    "dropping reorg task, its chain is not configured"
                );
                continue;
            };
            let provider = providers::get(json_rpc_url);

            if let Err(reorg_error) =
                handle_task(&provider, &task, &start_blocks_by_address, &config).await
            {
                error!(
                    chain_id = task.chain_id,
                    address = %task.address,
                    %reorg_error,
                    "reorg recovery failed, requeueing"
                );

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(task.backoff) => {}
                }

                let mut task = task;
                task.retries += 1;
                task.backoff = next_backoff(task.backoff, max_backoff);
                enqueue(&sender, task, config.retry_limit, max_backoff, &cancel).await;
            }
        }
    })
}

async fn handle_task(
    provider: &Arc<impl Provider>,
    task: &ReorgTask,
    start_blocks_by_address: &HashMap<(i64, String), i64>,
    config: &Config,
) -> Result<(), ReorgError> {
    let pool = config.repo.get_pool(1).await?;
    let mut conn = EvindexRepo::get_conn(&pool).await?;

    rollback(&mut conn, provider, task, start_blocks_by_address, config).await
}

/// Rolls the address back to the newest stored block whose hash still
/// matches the canonical chain, or to its start block when no stored
/// block does. The rollback itself is one commit that deletes every
/// log above the fork point and rewrites the checkpoint.
pub async fn rollback<'a>(
    conn: &mut EvindexRepoConn<'a>,
    provider: &Arc<impl Provider>,
    task: &ReorgTask,
    start_blocks_by_address: &HashMap<(i64, String), i64>,
    Config {
        reorg_window,
        rpc_timeout_ms,
        ..
    }: &Config,
) -> Result<(), ReorgError> {
    let rpc_timeout = Duration::from_millis(*rpc_timeout_ms);

    let fork_point = find_fork_point(conn, provider, task, *reorg_window, rpc_timeout).await?;

    let (block_number, block_hash) = match fork_point {
        Some(fork_point) => fork_point,
        None => {
            let start_block_number = start_blocks_by_address
                .get(&(task.chain_id, task.address.clone()))
                .copied()
                .unwrap_or(0);

            warn!(
                chain_id = task.chain_id,
                address = %task.address,
                start_block_number,
                "no stored block matches the canonical chain, starting the address over"
            );

            let start_block = providers::with_timeout(
                rpc_timeout,
                provider.get_block(U64::from(start_block_number as u64)),
            )
            .await?;

            (start_block_number, providers::get_block_hash(&start_block)?)
        }
    };

    warn!(
        chain_id = task.chain_id,
        address = %task.address,
        suspect_block_number = task.block_number,
        fork_block_number = block_number,
        "rolling back to fork point"
    );

    let checkpoint =
        UnsavedCheckpoint::new(task.chain_id, &task.address, block_number, &block_hash);

    commit::run(conn, CommitParams::new(checkpoint, vec![])).await?;

    Ok(())
}

/// Walks stored logs newest-first in `reorg_window`-row pages, asking
/// the node for each distinct block's canonical hash. The first stored
/// block that still matches is the fork point. `None` once a short
/// page runs out without a match: everything stored is off-chain.
async fn find_fork_point<'a>(
    conn: &mut EvindexRepoConn<'a>,
    provider: &Arc<impl Provider>,
    task: &ReorgTask,
    reorg_window: u64,
    rpc_timeout: Duration,
) -> Result<Option<(i64, String)>, ReorgError> {
    let per_page = reorg_window as i64;
    let mut page = 0;

    loop {
        let event_logs = EvindexRepo::get_event_logs_page_desc(
            conn,
            task.chain_id,
            &task.address,
            task.block_number,
            page,
            per_page,
        )
        .await?;

        // rows come ordered by block descending, so one block's logs are adjacent
        let mut last_checked_block_number = None;

        for event_log in &event_logs {
            let block_number = event_log.get_block_number() as i64;
            if last_checked_block_number == Some(block_number) {
                continue;
            }
            last_checked_block_number = Some(block_number);

            let canonical_block = providers::with_timeout(
                rpc_timeout,
                provider.get_block(U64::from(block_number as u64)),
            )
            .await?;

            if providers::get_block_hash(&canonical_block)? == event_log.block_hash {
                return Ok(Some((block_number, event_log.block_hash.clone())));
            }
        }

        if (event_logs.len() as i64) < per_page {
            return Ok(None);
        }

        page += 1;
    }
}

pub(crate) fn next_backoff(backoff: Duration, max_backoff: Duration) -> Duration {
    (backoff * 2).min(max_backoff)
}
