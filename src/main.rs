use actix_web::{App, HttpServer};
use dotenv::dotenv;
use lunchvote_server::config::Config;
use lunchvote_server::store::memory::MemoryStore;
use lunchvote_server::store::postgres::{new_pool, PgStore};
use lunchvote_server::store::Store;
use lunchvote_server::{server, telemetry};
use std::sync::Arc;
use tracing::{info, warn};

#[actix_rt::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    telemetry::init()?;
    let config = Config::from_env();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = new_pool(database_url).await?;
            sqlx::migrate!().run(&pool).await?;
            info!("connected to postgres");
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, falling back to the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    info!(addr = %config.bind_addr, "starting lunch vote server");
    HttpServer::new(move || {
        let store = store.clone();
        App::new().configure(|cfg| server::configure(cfg, store))
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;
    Ok(())
}
