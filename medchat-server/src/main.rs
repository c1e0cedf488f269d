use anyhow::Context;
use medchat_server::{AppState, ServiceConfig, build_pipeline, run_server, server::SERVICE_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    medchat_telemetry::init_telemetry(SERVICE_NAME, config.log_format)?;

    let pipeline = build_pipeline(&config).await.context("failed to configure providers")?;
    let state = AppState::new(pipeline).with_error_details(config.expose_error_details);

    run_server(state, config.server()).await
}
