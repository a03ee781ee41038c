use crate::{Migratable, PostgresRepo, RepoMigrations, SQLikeMigrations};

impl RepoMigrations for PostgresRepo {
    fn create_checkpoints_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_checkpoints()
    }

    fn create_event_logs_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_event_logs()
    }
}

impl Migratable for PostgresRepo {}
