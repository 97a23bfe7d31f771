//! The `sagaflowd` server binary.

use sagaflow::config::SagaConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sagaflow::observability::init();

    let config = SagaConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let app = sagaflow::api::build_app(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
