//! A helper program to create the database and apply migrations
//! without starting the server.

use std::env;

use log::{debug, initialize_logger, parse_level};
use registration::db::{Db, SqliteDb};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let level = env::var("REGISTRATION_LOG_LEVEL").unwrap_or_else(|_| "debug".to_owned());
    let logger = initialize_logger(parse_level(&level));
    let connection_string = env::var("REGISTRATION_DB_CONNECTION_STRING")
        .expect("could not read REGISTRATION_DB_CONNECTION_STRING");

    debug!(logger, "Connecting to database...");

    let db = SqliteDb::connect(&connection_string)
        .await
        .expect("could not connect to database");

    debug!(logger, "Running migrations...");
    db.migrate().await.expect("failed to run migrations");

    let count = db.count_all().await.expect("failed to count registrants");

    debug!(logger, "Completed initialization."; "registrants" => count);
}
