use std::net::SocketAddr;

use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "peerpay={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let database = connect_database(&settings.server.database).await?;
    let engine = engine::Engine::builder()
        .database(database)
        .timeouts((&settings.timeouts).into())
        .policy(engine::LedgerPolicy {
            enforce_balance: settings.ledger.enforce_balance,
        })
        .build()
        .await?;

    let addr: SocketAddr = format!("{}:{}", settings.server.bind, settings.server.port).parse()?;
    tracing::info!(
        enforce_balance = settings.ledger.enforce_balance,
        "starting peerpay"
    );
    server::run(engine, addr).await?;
    tracing::info!("peerpay stopped");

    Ok(())
}

async fn connect_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    if *config == settings::Database::Memory {
        tracing::warn!("using an in-memory database; data is lost on exit");
    }
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
