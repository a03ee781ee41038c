#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures_util::FutureExt;

    use crate::factory::{
        event_log_at, stub_block_hash, stub_block_hash_string, DAI_CONTRACT_ADDRESS,
        USDC_CONTRACT_ADDRESS,
    };
    use crate::test_runner;
    use evindex::commit::{self, CommitParams};
    use evindex::{ChainId, DecodedEvent, EvindexRepo, Repo, RepoError, UnsavedCheckpoint};

    #[tokio::test]
    pub async fn persists_rows_together_with_their_checkpoint() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let chain_id = ChainId::Mainnet as i64;
            let event_log =
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 100, stub_block_hash(100));
            let checkpoint = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                100,
                &stub_block_hash_string(100),
            );

            commit::run(&mut conn, CommitParams::new(checkpoint, vec![event_log])).await.unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            assert_eq!(event_logs.len(), 1);

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                chain_id,
                &USDC_CONTRACT_ADDRESS.to_lowercase(),
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(checkpoint.block_number, 100);
            assert_eq!(checkpoint.block_hash, stub_block_hash_string(100));
        })
        .await;
    }

    #[tokio::test]
    pub async fn upserts_rows_sharing_a_natural_key() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let chain_id = ChainId::Mainnet as i64;
            let event_log =
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 100, stub_block_hash(100));

            let checkpoint = || {
                UnsavedCheckpoint::new(
                    chain_id,
                    USDC_CONTRACT_ADDRESS,
                    100,
                    &stub_block_hash_string(100),
                )
            };

            commit::run(&mut conn, CommitParams::new(checkpoint(), vec![event_log.clone()]))
                .await
                .unwrap();

            let mut updated_event_log = event_log;
            updated_event_log.set_decoded_event(&DecodedEvent::new(
                "Transfer",
                HashMap::from([("value".to_string(), "1661".to_string())]),
            ));

            commit::run(&mut conn, CommitParams::new(checkpoint(), vec![updated_event_log]))
                .await
                .unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            assert_eq!(event_logs.len(), 1);

            let decoded_event = event_logs.first().unwrap().get_decoded_event().unwrap();
            assert_eq!(decoded_event.event_name, "Transfer");
        })
        .await;
    }

    #[tokio::test]
    pub async fn deletes_rows_above_the_new_checkpoint() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let chain_id = ChainId::Mainnet as i64;
            let event_logs = vec![
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 10, stub_block_hash(10)),
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 20, stub_block_hash(20)),
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 30, stub_block_hash(30)),
            ];
            let checkpoint = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                30,
                &stub_block_hash_string(30),
            );
            commit::run(&mut conn, CommitParams::new(checkpoint, event_logs)).await.unwrap();

            let rollback_checkpoint = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                15,
                &stub_block_hash_string(15),
            );
            commit::run(&mut conn, CommitParams::new(rollback_checkpoint, vec![])).await.unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            assert_eq!(event_logs.len(), 1);
            assert_eq!(event_logs.first().unwrap().get_block_number(), 10);

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                chain_id,
                &USDC_CONTRACT_ADDRESS.to_lowercase(),
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(checkpoint.block_number, 15);
        })
        .await;
    }

    #[tokio::test]
    pub async fn leaves_other_addresses_untouched() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let chain_id = ChainId::Mainnet as i64;

            let usdc_checkpoint = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                30,
                &stub_block_hash_string(30),
            );
            let usdc_event_logs = vec![
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 20, stub_block_hash(20)),
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 30, stub_block_hash(30)),
            ];
            commit::run(&mut conn, CommitParams::new(usdc_checkpoint, usdc_event_logs))
                .await
                .unwrap();

            let dai_checkpoint = UnsavedCheckpoint::new(
                chain_id,
                DAI_CONTRACT_ADDRESS,
                25,
                &stub_block_hash_string(25),
            );
            let dai_event_logs =
                vec![event_log_at(DAI_CONTRACT_ADDRESS, chain_id, 25, stub_block_hash(25))];
            commit::run(&mut conn, CommitParams::new(dai_checkpoint, dai_event_logs))
                .await
                .unwrap();

            let usdc_rollback = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                10,
                &stub_block_hash_string(10),
            );
            commit::run(&mut conn, CommitParams::new(usdc_rollback, vec![])).await.unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            assert_eq!(event_logs.len(), 1);
            assert_eq!(
                event_logs.first().unwrap().address,
                DAI_CONTRACT_ADDRESS.to_lowercase()
            );

            let dai_checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                chain_id,
                &DAI_CONTRACT_ADDRESS.to_lowercase(),
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(dai_checkpoint.block_number, 25);
        })
        .await;
    }

    #[tokio::test]
    pub async fn rolls_the_whole_commit_back_when_any_write_fails() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let chain_id = ChainId::Mainnet as i64;
            let event_log =
                event_log_at(USDC_CONTRACT_ADDRESS, chain_id, 100, stub_block_hash(100));
            let checkpoint = UnsavedCheckpoint::new(
                chain_id,
                USDC_CONTRACT_ADDRESS,
                100,
                &stub_block_hash_string(100),
            );

            let result = EvindexRepo::run_in_transaction(&mut conn, move |transaction_conn| {
                async move {
                    EvindexRepo::create_event_logs(transaction_conn, &[event_log]).await?;
                    EvindexRepo::upsert_checkpoint(transaction_conn, &checkpoint).await?;

                    Err(RepoError::Unknown("injected failure".to_string()))
                }
                .boxed()
            })
            .await;

            assert!(result.is_err());
            assert!(EvindexRepo::get_all_event_logs(&mut conn).await.unwrap().is_empty());

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                chain_id,
                &USDC_CONTRACT_ADDRESS.to_lowercase(),
            )
            .await
            .unwrap();
            assert!(checkpoint.is_none());
        })
        .await;
    }
}
