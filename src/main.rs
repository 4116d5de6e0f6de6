use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_gallery_api::{
    AppState, aws_clients, catalog::Catalog, config::Config, routes, startup,
    storage::S3ObjectStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "image_gallery_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(bind = %config.bind_address, bucket = %config.bucket_name, "configuration loaded");

    let sdk_config = aws_clients::create_sdk_config(&config).await;
    let s3_client = aws_clients::create_s3_client(&sdk_config);

    // Bucket creation is best-effort at startup; IaC normally owns this.
    if let Err(e) =
        startup::ensure_bucket_exists(&s3_client, &config.bucket_name, &config.aws_region).await
    {
        tracing::warn!(error = %e, "bucket check failed, continuing; storage calls may error");
    }

    let store = Arc::new(S3ObjectStore::new(s3_client, config.bucket_name.clone()));
    let catalog = Catalog::new(store, config.public_image_base());
    let state = Arc::new(AppState { catalog, config });

    let app = routes::create_router(state.clone());

    tracing::info!("server listening on http://{}", state.config.bind_address);
    let listener = tokio::net::TcpListener::bind(state.config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
