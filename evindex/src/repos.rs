mod postgres_repo;
mod repo;

pub use postgres_repo::{
    Conn as PostgresRepoConn, Pool as PostgresRepoPool, PostgresRepo, PostgresRepoAsyncConnection,
};
pub use repo::{Migratable, Repo, RepoError, RepoMigrations, SQLikeMigrations};
