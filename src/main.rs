use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use tokio::sync::mpsc;
use warp::Filter;

use log::{info, initialize_logger, parse_level, warn};
use registration::config::{get_variable, get_variable_or, is_enabled};
use registration::csrf::CsrfKey;
use registration::db::SqliteDb;
use registration::deliverability::{
    make_dns_checker, make_permissive_checker, DomainChecker, HickoryResolver, LOOKUP_TIMEOUT,
};
use registration::environment::{Config, Environment};
use registration::routes;
use registration::templates::Templates;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger(parse_level(&get_variable_or(
        "REGISTRATION_LOG_LEVEL",
        "info",
    )));

    let main_port: u16 = get_variable("REGISTRATION_PORT")
        .parse()
        .expect("parse REGISTRATION_PORT as u16");
    let admin_port: u16 = get_variable("REGISTRATION_ADMIN_PORT")
        .parse()
        .expect("parse REGISTRATION_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Opening database...");
    let connection_string = get_variable("REGISTRATION_DB_CONNECTION_STRING");
    let db = SqliteDb::connect(&connection_string)
        .await
        .expect("open database from REGISTRATION_DB_CONNECTION_STRING");

    info!(logger, "Running migrations...");
    db.migrate().await.expect("apply database migrations");
    let db = Arc::new(db);

    let templates = Arc::new(Templates::new().expect("compile templates"));

    let time_limit: u64 = get_variable_or("REGISTRATION_CSRF_TIME_LIMIT", "3600")
        .parse()
        .expect("parse REGISTRATION_CSRF_TIME_LIMIT as seconds");
    let csrf = Arc::new(
        CsrfKey::new(
            get_variable("REGISTRATION_SECRET_KEY"),
            Duration::from_secs(time_limit),
        )
        .expect("create CSRF key from REGISTRATION_SECRET_KEY"),
    );

    let checker: Arc<DomainChecker> =
        if is_enabled(&get_variable_or("REGISTRATION_CHECK_DELIVERABILITY", "1")) {
            match HickoryResolver::from_system_conf() {
                Ok(resolver) => Arc::new(make_dns_checker(Arc::new(resolver), LOOKUP_TIMEOUT)),
                Err(e) => {
                    warn!(logger, "Failed to read the system resolver configuration; accepting every email domain"; "error" => %e);
                    Arc::new(make_permissive_checker())
                }
            }
        } else {
            info!(logger, "Email deliverability checks are disabled");
            Arc::new(make_permissive_checker())
        };

    let config = Config::new(get_variable_or("REGISTRATION_STATIC_DIR", "static"));
    let environment = Environment::new(logger.clone(), db, templates, csrf, checker, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper<'static> = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver only goes away once shutdown has begun
            termination_sender.send(()).await.ok();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_routes(environment.clone()))
            .bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route()
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
