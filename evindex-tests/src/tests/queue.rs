#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::factory::USDC_CONTRACT_ADDRESS;
    use evindex::reorg::{self, ReorgTask};

    fn task_at(block_number: i64) -> ReorgTask {
        ReorgTask::new(1, USDC_CONTRACT_ADDRESS, block_number, Duration::from_millis(1))
    }

    #[tokio::test]
    pub async fn delivers_queued_tasks_in_order() {
        let (sender, mut receiver) = reorg::queue(10);
        let cancel = CancellationToken::new();

        let first = task_at(50);
        let second = task_at(60);
        reorg::enqueue(&sender, first.clone(), 2, Duration::from_millis(2), &cancel).await;
        reorg::enqueue(&sender, second.clone(), 2, Duration::from_millis(2), &cancel).await;

        assert_eq!(receiver.recv().await, Some(first));
        assert_eq!(receiver.recv().await, Some(second));
    }

    #[tokio::test]
    pub async fn drops_tasks_when_the_queue_stays_full() {
        let (sender, mut receiver) = reorg::queue(1);
        let cancel = CancellationToken::new();

        let filler = task_at(50);
        reorg::enqueue(&sender, filler.clone(), 2, Duration::from_millis(2), &cancel).await;
        reorg::enqueue(&sender, task_at(60), 2, Duration::from_millis(2), &cancel).await;

        assert_eq!(receiver.try_recv().ok(), Some(filler));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    pub async fn stops_retrying_into_a_full_queue_once_cancelled() {
        let (sender, mut receiver) = reorg::queue(1);
        let cancel = CancellationToken::new();

        let filler = task_at(50);
        reorg::enqueue(&sender, filler.clone(), 5, Duration::from_secs(60), &cancel).await;
        cancel.cancel();

        let slow = ReorgTask::new(1, USDC_CONTRACT_ADDRESS, 60, Duration::from_secs(60));
        tokio::time::timeout(
            Duration::from_secs(1),
            reorg::enqueue(&sender, slow, 5, Duration::from_secs(60), &cancel),
        )
        .await
        .unwrap();

        assert_eq!(receiver.try_recv().ok(), Some(filler));
    }

    #[tokio::test]
    pub async fn drops_tasks_once_the_queue_closes() {
        let (sender, receiver) = reorg::queue(1);
        let cancel = CancellationToken::new();
        drop(receiver);

        tokio::time::timeout(
            Duration::from_secs(1),
            reorg::enqueue(&sender, task_at(50), 2, Duration::from_millis(2), &cancel),
        )
        .await
        .unwrap();
    }
}
