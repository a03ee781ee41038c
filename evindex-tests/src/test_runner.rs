use std::env;
use std::future::Future;

use dotenvy::dotenv;
use evindex::{
    EvindexRepo, EvindexRepoAsyncConnection, EvindexRepoConn, EvindexRepoPool, Migratable, Repo,
    RepoMigrations,
};

use crate::db;

pub async fn get_pool() -> EvindexRepoPool {
    new_repo().get_pool(1).await.unwrap()
}

/// Runs a test against the test database inside a transaction that
/// never commits, so tests are isolated from each other
pub async fn run_test<'a, TestFn, Fut>(pool: &'a EvindexRepoPool, test_fn: TestFn)
where
    TestFn: Fn(EvindexRepoConn<'a>) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut conn = EvindexRepo::get_conn(pool).await.unwrap();

    if should_setup_test_db() {
        db::setup();

        EvindexRepo::migrate(&mut conn, EvindexRepo::get_migrations()).await.unwrap();
    }

    conn.begin_test_transaction().await.unwrap();

    test_fn(conn).await;
}

pub fn new_repo() -> EvindexRepo {
    EvindexRepo::new(db::database_url().as_str())
}

fn should_setup_test_db() -> bool {
    dotenv().ok();

    env::var("SETUP_TEST_DB").is_ok()
}
