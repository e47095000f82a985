//! Server construction: migrations, pool, routing, middleware wiring.

mod config;

pub use config::Settings;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use backend::api::health::ping;
use backend::api::users::{create_user, delete_user, get_user, get_users, update_user};
use backend::api::json_error_handler;
use backend::domain::UserService;
use backend::middleware::Transaction;
use backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Bring the schema up to date before accepting traffic.
///
/// Runs on a blocking thread with a plain synchronous connection; the
/// migration harness is not async.
async fn run_migrations(database_url: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&database_url)
            .map_err(|err| std::io::Error::other(format!("database connection failed: {err}")))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;
        Ok(())
    })
    .await
    .map_err(|err| std::io::Error::other(format!("migration task failed: {err}")))?
}

/// Construct the HTTP server: migrated schema, connection pool, and the
/// `/api` scope wrapped in the per-request transaction middleware. `/ping`
/// sits outside the scope so probes never take a connection.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when migrations, pool construction, or
/// socket binding fail.
pub async fn create_server(settings: &Settings) -> std::io::Result<Server> {
    run_migrations(settings.database_url.clone()).await?;

    let pool = DbPool::new(
        PoolConfig::new(&settings.database_url).with_max_size(settings.pool_max_size()),
    )
    .await
    .map_err(|err| std::io::Error::other(format!("pool construction failed: {err}")))?;

    let users = web::Data::new(UserService::new(DieselUserRepository::new()));
    let bind_addr = settings.bind_addr();

    let server = HttpServer::new(move || {
        let api = web::scope("/api")
            .wrap(Transaction::new(pool.clone()))
            .service(create_user)
            .service(get_users)
            .service(get_user)
            .service(update_user)
            .service(delete_user);

        App::new()
            .app_data(users.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(cors())
            .service(api)
            .service(ping)
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "server listening");
    Ok(server)
}

/// Permissive cross-origin policy for browser clients. `Cors` is rebuilt per
/// worker; it is not `Clone`.
fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
}
