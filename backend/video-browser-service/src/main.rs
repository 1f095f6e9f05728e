/// Video Browser Service - HTTP Server
///
/// Lists bucket videos and serves playback pages with signed URLs.
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use video_browser_service::config::LogFormat;
use video_browser_service::handlers;
use video_browser_service::signing::UrlSigner;
use video_browser_service::storage::GcsObjectStore;
use video_browser_service::templates::Templates;
use video_browser_service::{AppState, Config};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(config.app.log_format);

    let store = GcsObjectStore::from_config(&config.gcs).context("Unable to create storage client")?;

    let pem = std::fs::read_to_string(&config.signing.pem_filename).with_context(|| {
        format!(
            "Unable to read PEM file {}",
            config.signing.pem_filename.display()
        )
    })?;
    let signer = UrlSigner::new(
        config.signing.google_access_id.clone(),
        config.gcs.bucket.clone(),
        &pem,
    );

    let templates = Templates::load(&config.templates.dir, &config.catalog.video_suffixes)
        .context("Unable to load templates")?;

    let state = web::Data::new(AppState {
        store: Arc::new(store),
        signer: Arc::new(signer),
        templates: Arc::new(templates),
        bucket: config.gcs.bucket.clone(),
        video_suffixes: config.catalog.video_suffixes.clone(),
    });

    tracing::info!(
        host = %config.app.host,
        port = config.app.port,
        bucket = %config.gcs.bucket,
        "Starting webserver"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(config.app.bind_address())
    .with_context(|| format!("Unable to bind {}", config.app.bind_address()))?
    .run()
    .await
    .context("HTTP server failed")
}
