use std::path::PathBuf;

use anyhow::Context;

use pixelrelay_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PIXELRELAY_CONFIG").ok())
        .map(PathBuf::from);

    let settings = Settings::load(config_path.as_deref())?;
    pixelrelay_observability::init_with(&settings.logging.level, settings.logging.format);

    let services = pixelrelay_api::app::services::build_services(&settings)?;
    let app = pixelrelay_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind))?;

    tracing::info!(addr = %listener.local_addr()?, base_url = %settings.server.base_url, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
