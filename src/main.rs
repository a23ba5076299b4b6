use anyhow::Result;
use keycloak_user_admin::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init(&config.telemetry);

    info!("Starting Keycloak User Admin");

    // Run the server
    server::run(config).await
}
