use derive_more::Display;
use std::fmt::Debug;

use futures_util::future::BoxFuture;

use crate::checkpoints::{Checkpoint, UnsavedCheckpoint};
use crate::events::{EventLog, EventLogsQuery};

#[derive(Debug, Display)]
pub enum RepoError {
    NotConnected,
    Unknown(String),
}

/// Storage boundary of the indexer. Connections are taken per
/// operation so long-lived tasks never pin a pool slot between ticks.
#[async_trait::async_trait]
pub trait Repo: Sync + Send + Clone + Debug {
    type Pool;
    type Conn<'a>: Send;

    async fn get_pool(&self, max_size: u32) -> Result<Self::Pool, RepoError>;
    async fn get_conn<'a>(pool: &'a Self::Pool) -> Result<Self::Conn<'a>, RepoError>;

    async fn run_in_transaction<'a, F>(
        conn: &mut Self::Conn<'a>,
        repo_ops: F,
    ) -> Result<(), RepoError>
    where
        F: for<'b> FnOnce(&'b mut Self::Conn<'a>) -> BoxFuture<'b, Result<(), RepoError>>
            + Send
            + Sync
            + 'a;

    async fn execute_raw_query<'a>(conn: &mut Self::Conn<'a>, query: &str)
        -> Result<(), RepoError>;

    async fn get_checkpoint<'a>(
        conn: &mut Self::Conn<'a>,
        chain_id: i64,
        address: &str,
    ) -> Result<Option<Checkpoint>, RepoError>;
    async fn get_checkpoints<'a>(
        conn: &mut Self::Conn<'a>,
        chain_id: i64,
    ) -> Result<Vec<Checkpoint>, RepoError>;
    /// Same lookup with the row locked until the surrounding
    /// transaction ends, serializing scan and reorg commits for one
    /// `(chain, address)` pair.
    async fn get_checkpoint_for_update<'a>(
        conn: &mut Self::Conn<'a>,
        chain_id: i64,
        address: &str,
    ) -> Result<Option<Checkpoint>, RepoError>;
    async fn upsert_checkpoint<'a>(
        conn: &mut Self::Conn<'a>,
        checkpoint: &UnsavedCheckpoint,
    ) -> Result<(), RepoError>;

    async fn create_event_logs<'a>(
        conn: &mut Self::Conn<'a>,
        event_logs: &[EventLog],
    ) -> Result<(), RepoError>;
    async fn delete_event_logs_above<'a>(
        conn: &mut Self::Conn<'a>,
        chain_id: i64,
        address: &str,
        block_number: i64,
    ) -> Result<(), RepoError>;
    /// One page of stored logs at or below `max_block_number`, newest
    /// block first. Drives the fork-point walk after a reorg.
    async fn get_event_logs_page_desc<'a>(
        conn: &mut Self::Conn<'a>,
        chain_id: i64,
        address: &str,
        max_block_number: i64,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<EventLog>, RepoError>;
    async fn query_event_logs<'a>(
        conn: &mut Self::Conn<'a>,
        query: &EventLogsQuery,
    ) -> Result<Vec<EventLog>, RepoError>;
    async fn count_event_logs<'a>(
        conn: &mut Self::Conn<'a>,
        query: &EventLogsQuery,
    ) -> Result<i64, RepoError>;
    async fn get_all_event_logs<'a>(
        conn: &mut Self::Conn<'a>,
    ) -> Result<Vec<EventLog>, RepoError>;
}

pub trait RepoMigrations: Migratable {
    fn create_checkpoints_migration() -> &'static [&'static str];
    fn create_event_logs_migration() -> &'static [&'static str];

    fn get_migrations() -> Vec<&'static str> {
        [
            Self::create_checkpoints_migration(),
            Self::create_event_logs_migration(),
        ]
        .concat()
    }
}

#[async_trait::async_trait]
pub trait Migratable: Repo {
    async fn migrate<'a>(
        conn: &mut Self::Conn<'a>,
        migrations: Vec<impl AsRef<str> + Send + Sync>,
    ) -> Result<(), RepoError>
    where
        Self: Sized,
    {
        for migration in migrations {
            Self::execute_raw_query(conn, migration.as_ref()).await?;
        }

        Ok(())
    }
}

pub struct SQLikeMigrations;

impl SQLikeMigrations {
    pub fn create_checkpoints() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS evindex_checkpoints (
                id SERIAL PRIMARY KEY,
                chain_id BIGINT NOT NULL,
                address VARCHAR NOT NULL,
                block_number BIGINT NOT NULL,
                block_hash VARCHAR NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS evindex_checkpoints_chain_address_index
            ON evindex_checkpoints(chain_id,address)",
        ]
    }

    pub fn create_event_logs() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS evindex_event_logs (
                id uuid PRIMARY KEY,
                chain_id BIGINT NOT NULL,
                address VARCHAR NOT NULL,
                block_hash VARCHAR NOT NULL,
                block_number BIGINT NOT NULL,
                topic0 VARCHAR,
                topic1 VARCHAR,
                topic2 VARCHAR,
                topic3 VARCHAR,
                data BYTEA NOT NULL,
                decoded_event JSON,
                transaction_hash VARCHAR NOT NULL,
                transaction_index INTEGER NOT NULL,
                log_index INTEGER NOT NULL,
                block_timestamp BIGINT NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS evindex_event_logs_natural_key_index
            ON evindex_event_logs(chain_id,address,block_number,transaction_hash,log_index)",
        ]
    }
}
