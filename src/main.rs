mod api;
mod auth;
mod config;
mod db;
mod donors;
mod error;
mod logger;
mod models;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use auth::{CredentialGate, JwtService, MemoryCounterStore, PinHasher, Registrar};
use config::AppConfig;
use db::{PgUserStore, UserStore};
use donors::DonorSearch;

const COUNTER_PURGE_INTERVAL: Duration = Duration::from_secs(300);

// Application state
pub struct AppState {
    pub gate: CredentialGate,
    pub registrar: Registrar,
    pub donor_search: DonorSearch,
    pub users: Arc<dyn UserStore>,
    pub jwt: Arc<JwtService>,
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::from_env().map_err(|e| startup_error("Configuration error", e))?;

    logger::Logger::init(&cfg.log_path, cfg.log_level);
    info!("Donor registry starting");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(&cfg.database_url)
        .await
        .map_err(|e| startup_error("Database connection error", e))?;

    db::initialize_db(pool.clone())
        .await
        .map_err(|e| startup_error("Database initialization error", e))?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
    let counters = Arc::new(MemoryCounterStore::new());
    let jwt = Arc::new(JwtService::new(
        &cfg.jwt_secret,
        cfg.access_token_ttl,
        cfg.refresh_token_ttl,
    ));
    let hasher = PinHasher::new(cfg.pin_hash_cost);

    let app_state = web::Data::new(AppState {
        gate: CredentialGate::new(users.clone(), counters.clone(), jwt.clone(), hasher.clone()),
        registrar: Registrar::new(users.clone(), jwt.clone(), hasher),
        donor_search: DonorSearch::new(users.clone()),
        users,
        jwt: jwt.clone(),
    });

    // Expired attempt counters read as zero already; this only bounds memory.
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(COUNTER_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            counters.purge_expired();
        }
    });

    info!("Server listening on http://{}", cfg.bind_addr);

    let server = HttpServer::new(move || {
        let jwt = jwt.clone();
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(|cfg| api::configure(cfg, jwt))
    })
    .bind(&cfg.bind_addr)
    .map_err(|e| {
        error!("Cannot bind {}: {}", cfg.bind_addr, e);
        e
    })?;

    server.run().await
}
