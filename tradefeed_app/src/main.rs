use tradefeed_app::{app::App, config::Config};

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::parse();
    config.validate()?;

    let db = tradefeed_db::Db::init(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout(),
        config.db_statement_timeout(),
    )
    .await
    .context("failed to initialize database")?;

    let listen_addr = config.listen_addr;
    let request_timeout = config.request_timeout();

    tradefeed_app::serve(
        App {
            config: Arc::new(config),
            db,
        },
        listen_addr,
        request_timeout,
    )
    .await?;

    Ok(())
}
