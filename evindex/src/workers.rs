use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::decoders::DecoderRegistry;
use crate::{reorg, scanner, subscription, Config};

/// Handles to every background task the indexer runs: one scanner per
/// contract address, one subscription per chain and the reorg
/// consumer, all under one cancellation token.
pub struct Workers {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Cancels every worker and waits for each to wind down. Loops
    /// observe the token around their sleeps and receives, so the tick
    /// or queue item in flight finishes first.
    pub async fn stop(self) {
        self.cancel.cancel();

        for handle in self.handles {
            if let Err(join_error) = handle.await {
                warn!(%join_error, "worker ended abnormally");
            }
        }

        info!("all workers stopped");
    }
}

pub(crate) fn spawn(config: &Config, registry: Arc<DecoderRegistry>) -> Workers {
    let cancel = CancellationToken::new();

    let (sender, receiver) = reorg::queue(config.reorg_queue_size);

    let mut handles = scanner::start(config, &registry, &cancel);
    handles.extend(subscription::start(config, &sender, &cancel));
    handles.push(reorg::start(config, sender, receiver, &cancel));

    info!(workers = handles.len(), "workers started");

    Workers { cancel, handles }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn stop_cancels_and_joins_every_worker() {
        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn({
                let cancel = cancel.clone();
                async move { cancel.cancelled().await }
            }),
            tokio::spawn({
                let cancel = cancel.clone();
                async move { cancel.cancelled().await }
            }),
        ];
        let workers = Workers { cancel, handles };

        tokio::time::timeout(Duration::from_secs(5), workers.stop()).await.unwrap();
    }
}
