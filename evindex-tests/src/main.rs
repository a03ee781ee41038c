use evindex::{EvindexRepo, Migratable, Repo, RepoMigrations};
use evindex_tests::db;

#[tokio::main]
async fn main() {
    db::setup();

    let repo = EvindexRepo::new(db::database_url().as_str());
    let pool = repo.get_pool(1).await.unwrap();
    let mut conn = EvindexRepo::get_conn(&pool).await.unwrap();

    EvindexRepo::migrate(&mut conn, EvindexRepo::get_migrations()).await.unwrap();
}
