use std::env;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use dotenvy::dotenv;

/// Creates the test database when it does not exist yet
pub fn setup() {
    let database_url = database_url();

    if PgConnection::establish(&database_url).is_err() {
        let (database_name, server_url) = split_database_url(&database_url);

        let mut server_conn = PgConnection::establish(&server_url)
            .unwrap_or_else(|_| panic!("Error connecting to {server_url}"));

        diesel::sql_query(format!(r#"CREATE DATABASE "{database_name}""#))
            .execute(&mut server_conn)
            .unwrap();
    }
}

pub fn database_url() -> String {
    dotenv().ok();

    env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL env variable needs to be set.")
}

fn split_database_url(database_url: &str) -> (String, String) {
    let mut segments = database_url.split('/').collect::<Vec<&str>>();

    let database_name =
        segments.pop().expect("TEST_DATABASE_URL needs a database name. See: sample.env");

    (database_name.to_string(), segments.join("/"))
}
