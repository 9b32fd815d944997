use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use campustix_core::config::Config;
use campustix_core::tracing::init_tracing;
use campustix_ticketing::config::TicketingConfig;
use campustix_ticketing::locks::KeyedLocks;
use campustix_ticketing::router::build_router;
use campustix_ticketing::state::AppState;
use campustix_ticketing_migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = TicketingConfig::from_env().context("failed to load configuration")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    let mailer = config.build_mailer()?;
    let ledger = config.build_ledger()?;
    info!(
        mail_transport = ?config.mail_transport,
        ledger_url = config.ledger_url.as_deref().unwrap_or("simulated"),
        simulated_fallback = config.ledger_simulated_fallback,
        "gateways configured"
    );

    let state = AppState {
        db,
        mailer,
        ledger,
        ledger_timeout: config.ledger_timeout(),
        token_secret: config.token_secret,
        app_base_url: config.app_base_url,
        request_locks: KeyedLocks::new(),
        enrollment_locks: KeyedLocks::new(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.ticketing_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("ticketing service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
