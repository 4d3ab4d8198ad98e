use housie::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), HousieError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        pool_size = config.pool_size,
        max_tickets = config.room.max_tickets_per_player,
        draw_interval_secs = config.room.draw_interval.as_secs(),
        "starting housie-server"
    );

    let server = HousieServer::builder().config(config).build().await?;
    server.run().await
}
