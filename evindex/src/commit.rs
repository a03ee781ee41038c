use futures_util::FutureExt;

use crate::checkpoints::UnsavedCheckpoint;
use crate::events::EventLog;
use crate::repos::{Repo, RepoError};
use crate::{EvindexRepo, EvindexRepoConn};

/// A batch of rows destined for one `(chain, address)` pair together
/// with the checkpoint that vouches for them. An empty batch with a
/// lower checkpoint is how reorg recovery rolls an address back.
#[derive(Clone, Debug)]
pub struct CommitParams {
    pub checkpoint: UnsavedCheckpoint,
    pub event_logs: Vec<EventLog>,
}

impl CommitParams {
    pub fn new(checkpoint: UnsavedCheckpoint, event_logs: Vec<EventLog>) -> Self {
        Self {
            checkpoint,
            event_logs,
        }
    }
}

/// Applies a batch and its checkpoint in one transaction.
///
/// The checkpoint row is locked first so concurrent scan and reorg
/// commits for the same pair serialize. Logs above the new checkpoint
/// are deleted before the batch lands, which both rolls reorged blocks
/// back and clears partial state a failed earlier commit may have left.
pub async fn run<'a>(
    conn: &mut EvindexRepoConn<'a>,
    params: CommitParams,
) -> Result<(), RepoError> {
    EvindexRepo::run_in_transaction(conn, move |transaction_conn| {
        async move {
            let CommitParams {
                checkpoint,
                event_logs,
            } = params;

            EvindexRepo::get_checkpoint_for_update(
                transaction_conn,
                checkpoint.chain_id,
                &checkpoint.address,
            )
            .await?;

            EvindexRepo::delete_event_logs_above(
                transaction_conn,
                checkpoint.chain_id,
                &checkpoint.address,
                checkpoint.block_number,
            )
            .await?;

            if !event_logs.is_empty() {
                EvindexRepo::create_event_logs(transaction_conn, &event_logs).await?;
            }

            EvindexRepo::upsert_checkpoint(transaction_conn, &checkpoint).await
        }
        .boxed()
    })
    .await
}
