mod chains;
mod checkpoints;
pub mod commit;
mod config;
mod contracts;
pub mod decoders;
mod diesel;
pub mod events;
mod hashes;
pub mod providers;
pub mod reorg;
mod repos;
pub mod scanner;
mod subscription;
mod workers;

pub use chains::{Chain, ChainId};
pub use checkpoints::{Checkpoint, UnsavedCheckpoint};
pub use config::Config;
pub use contracts::{Contract, ContractAddress, ContractEventTopic, EventSignature};
pub use events::{DecodedEvent, EventLog, EventLogsOrderBy, EventLogsQuery};
pub use providers::{Provider, ProviderError};
pub use repos::*;
pub use workers::Workers;

use std::fmt::Debug;
use std::sync::Arc;

use config::ConfigError;

#[cfg(feature = "postgres")]
pub use repos::{PostgresRepo, PostgresRepoConn, PostgresRepoPool};

#[cfg(feature = "postgres")]
pub type EvindexRepo = PostgresRepo;

#[cfg(feature = "postgres")]
pub type EvindexRepoPool = PostgresRepoPool;

#[cfg(feature = "postgres")]
pub type EvindexRepoConn<'a> = PostgresRepoConn<'a>;

#[cfg(feature = "postgres")]
pub use repos::PostgresRepoAsyncConnection as EvindexRepoAsyncConnection;

pub enum EvindexError {
    Config(ConfigError),
    Repo(RepoError),
}

impl From<ConfigError> for EvindexError {
    fn from(value: ConfigError) -> Self {
        EvindexError::Config(value)
    }
}

impl From<RepoError> for EvindexError {
    fn from(value: RepoError) -> Self {
        EvindexError::Repo(value)
    }
}

impl Debug for EvindexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvindexError::Config(config_error) => {
                write!(f, "Config Error: {:?}", config_error)
            }
            EvindexError::Repo(repo_error) => {
                write!(f, "Repo Error: {:?}", repo_error)
            }
        }
    }
}

/// Validates the config, migrates storage and starts every worker:
/// scanners, chain subscriptions and the reorg consumer. The returned
/// [`Workers`] stops them all.
pub async fn index(config: &Config) -> Result<Workers, EvindexError> {
    config.validate()?;

    setup(config).await?;

    let registry = Arc::new(decoders::get_registry(&config.contracts));

    Ok(workers::spawn(config, registry))
}

/// Runs the storage migrations without starting any worker. Useful
/// for deploy steps that migrate ahead of rolling out the indexer.
pub async fn setup(config: &Config) -> Result<(), EvindexError> {
    let Config { repo, .. } = config;
    let pool = repo.get_pool(1).await?;
    let mut conn = EvindexRepo::get_conn(&pool).await?;

    EvindexRepo::migrate(&mut conn, EvindexRepo::get_migrations()).await?;

    Ok(())
}
