use anyhow::Context;
use seven_degrees::{
    spawn_maintenance, spawn_purger, DiscoveryCoordinator, Engine, EngineConfig, HttpServer,
};
use std::sync::Arc;
use tracing::info;

const CONFIG_ENV: &str = "SEVEN_DEGREES_CONFIG";

fn load_config() -> anyhow::Result<EngineConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => EngineConfig::from_yaml_file(&path)
            .with_context(|| format!("loading configuration from {}", path)),
        Err(_) => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    info!("Seven Degrees v{}", seven_degrees::version());

    let server_config = config.server.clone();
    let engine = Arc::new(Engine::new(config)?);
    let coordinator = DiscoveryCoordinator::new(Arc::clone(&engine));

    spawn_maintenance(Arc::clone(&engine));
    spawn_purger(coordinator.clone());

    HttpServer::new(coordinator, server_config)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {}", e))?;

    Ok(())
}
