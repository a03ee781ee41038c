#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethers::types::Filter;

    use crate::db::database_url;
    use crate::factory::{
        empty_provider, stub_block_hash_string, undecoded_usdc_contract, usdc_contract,
        USDC_CONTRACT_ADDRESS, USDC_CONTRACT_START_BLOCK_NUMBER,
    };
    use crate::{
        provider_with_empty_logs, provider_with_filter_stubber, provider_with_logs, test_runner,
    };
    use evindex::{
        decoders, scanner, ChainId, Config, EvindexRepo, PostgresRepo, Repo, UnsavedCheckpoint,
    };

    #[tokio::test]
    pub async fn ingests_logs_and_advances_the_checkpoint() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let usdc_contract = usdc_contract();
            let config =
                Config::new(PostgresRepo::new(&database_url())).add_contract(usdc_contract.clone());
            let registry = decoders::get_registry(&config.contracts);

            static CURRENT_BLOCK_NUMBER: u64 = USDC_CONTRACT_START_BLOCK_NUMBER + 52;
            let contract_address = usdc_contract.addresses.first().cloned().unwrap();
            let topics = usdc_contract.get_event_topics();
            let provider =
                Arc::new(provider_with_logs!(USDC_CONTRACT_ADDRESS, CURRENT_BLOCK_NUMBER));

            assert!(EvindexRepo::get_all_event_logs(&mut conn).await.unwrap().is_empty());

            scanner::sync_logs(&mut conn, &provider, &contract_address, &topics, &registry, &config)
                .await
                .unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            let event_log = event_logs.first().unwrap();
            assert_eq!(event_log.address, USDC_CONTRACT_ADDRESS.to_lowercase());
            assert_eq!(event_log.get_block_number(), 18_115_958);
            assert_eq!(event_log.get_block_timestamp(), 18_115_958 * 12);

            let decoded_event = event_log.get_decoded_event().unwrap();
            assert_eq!(decoded_event.event_name, "Transfer");
            assert_eq!(decoded_event.get_param("value"), Some("1661"));

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                ChainId::Mainnet as i64,
                &contract_address.address,
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(checkpoint.get_block_number(), CURRENT_BLOCK_NUMBER);
            assert_eq!(checkpoint.block_hash, stub_block_hash_string(CURRENT_BLOCK_NUMBER));
        })
        .await;
    }

    #[tokio::test]
    pub async fn starts_scanning_from_the_contract_start_block() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let usdc_contract = usdc_contract();
            let config =
                Config::new(PostgresRepo::new(&database_url())).add_contract(usdc_contract.clone());
            let registry = decoders::get_registry(&config.contracts);

            static CURRENT_BLOCK_NUMBER: u64 = USDC_CONTRACT_START_BLOCK_NUMBER + 52;
            let contract_address = usdc_contract.addresses.first().cloned().unwrap();
            let topics = usdc_contract.get_event_topics();
            let provider = Arc::new(provider_with_filter_stubber!(
                CURRENT_BLOCK_NUMBER,
                |filter: &Filter| {
                    assert_eq!(
                        filter.get_from_block().unwrap().as_u64(),
                        USDC_CONTRACT_START_BLOCK_NUMBER
                    );
                    assert_eq!(filter.get_to_block().unwrap().as_u64(), CURRENT_BLOCK_NUMBER);
                }
            ));

            scanner::sync_logs(&mut conn, &provider, &contract_address, &topics, &registry, &config)
                .await
                .unwrap();
        })
        .await;
    }

    #[tokio::test]
    pub async fn advances_the_checkpoint_through_ranges_without_logs() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let usdc_contract = usdc_contract();
            let config =
                Config::new(PostgresRepo::new(&database_url())).add_contract(usdc_contract.clone());
            let registry = decoders::get_registry(&config.contracts);

            static CURRENT_BLOCK_NUMBER: u64 = USDC_CONTRACT_START_BLOCK_NUMBER + 20;
            let contract_address = usdc_contract.addresses.first().cloned().unwrap();
            let topics = usdc_contract.get_event_topics();
            let provider = Arc::new(provider_with_empty_logs!(CURRENT_BLOCK_NUMBER));

            scanner::sync_logs(&mut conn, &provider, &contract_address, &topics, &registry, &config)
                .await
                .unwrap();

            assert!(EvindexRepo::get_all_event_logs(&mut conn).await.unwrap().is_empty());

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                ChainId::Mainnet as i64,
                &contract_address.address,
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(checkpoint.get_block_number(), CURRENT_BLOCK_NUMBER);
        })
        .await;
    }

    #[tokio::test]
    pub async fn does_nothing_when_there_are_no_new_blocks() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let usdc_contract = usdc_contract();
            let config =
                Config::new(PostgresRepo::new(&database_url())).add_contract(usdc_contract.clone());
            let registry = decoders::get_registry(&config.contracts);

            let contract_address = usdc_contract.addresses.first().cloned().unwrap();
            let topics = usdc_contract.get_event_topics();

            let checkpoint_block_number = USDC_CONTRACT_START_BLOCK_NUMBER as i64 + 52;
            EvindexRepo::upsert_checkpoint(
                &mut conn,
                &UnsavedCheckpoint::new(
                    ChainId::Mainnet as i64,
                    &contract_address.address,
                    checkpoint_block_number,
                    &stub_block_hash_string(checkpoint_block_number as u64),
                ),
            )
            .await
            .unwrap();

            // the chain head sits at 0, far below the checkpoint
            let provider = Arc::new(empty_provider());

            scanner::sync_logs(&mut conn, &provider, &contract_address, &topics, &registry, &config)
                .await
                .unwrap();

            assert!(EvindexRepo::get_all_event_logs(&mut conn).await.unwrap().is_empty());

            let checkpoint = EvindexRepo::get_checkpoint(
                &mut conn,
                ChainId::Mainnet as i64,
                &contract_address.address,
            )
            .await
            .unwrap()
            .unwrap();
            assert_eq!(checkpoint.block_number, checkpoint_block_number);
            assert_eq!(
                checkpoint.block_hash,
                stub_block_hash_string(checkpoint_block_number as u64)
            );
        })
        .await;
    }

    #[tokio::test]
    pub async fn ingests_logs_raw_for_contracts_without_decoders() {
        let pool = test_runner::get_pool().await;

        test_runner::run_test(&pool, |mut conn| async move {
            let usdc_contract = undecoded_usdc_contract();
            let config =
                Config::new(PostgresRepo::new(&database_url())).add_contract(usdc_contract.clone());
            let registry = decoders::get_registry(&config.contracts);

            static CURRENT_BLOCK_NUMBER: u64 = USDC_CONTRACT_START_BLOCK_NUMBER + 52;
            let contract_address = usdc_contract.addresses.first().cloned().unwrap();
            let topics = usdc_contract.get_event_topics();
            assert!(topics.is_empty());

            let provider =
                Arc::new(provider_with_logs!(USDC_CONTRACT_ADDRESS, CURRENT_BLOCK_NUMBER));

            scanner::sync_logs(&mut conn, &provider, &contract_address, &topics, &registry, &config)
                .await
                .unwrap();

            let event_logs = EvindexRepo::get_all_event_logs(&mut conn).await.unwrap();
            let event_log = event_logs.first().unwrap();
            assert!(event_log.get_decoded_event().is_none());
            assert!(event_log.get_topic(0).is_some());
        })
        .await;
    }
}
