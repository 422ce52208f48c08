use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasklist::app::App;
use tasklist::auth::{AuthClient, HttpAuthClient, LocalAuthClient};
use tasklist::config::AppConfig;
use tasklist::store::{HttpTaskStore, MemoryTaskStore, TaskStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tasklist=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (auth, store): (Arc<dyn AuthClient>, Arc<dyn TaskStore>) =
        match AppConfig::new_from_env() {
            Ok(config) => {
                info!("using remote collaborators at {}", config.base_url);
                (
                    Arc::new(HttpAuthClient::new(config.clone())?),
                    Arc::new(HttpTaskStore::new(config)?),
                )
            }
            Err(e) => {
                info!("{}; running in local mode", e);
                (
                    Arc::new(LocalAuthClient::new()),
                    Arc::new(MemoryTaskStore::new()),
                )
            }
        };

    App::new(auth, store).run().await?;

    Ok(())
}
