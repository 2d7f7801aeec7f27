//! birdcall-id - Bird call recognition service
//!
//! Accepts an uploaded recording, asks the configured inference endpoint
//! which species is calling, optionally stores the audio and enriches the
//! answer from the reference catalog.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use birdcall_common::config::{load_toml_config, resolve_config_path};
use birdcall_id::config::{CliOverrides, ServiceConfig, StorageTarget, ENV_CONFIG};
use birdcall_id::db::{self, SqliteCatalog};
use birdcall_id::services::{AudioValidator, InferenceClient, ObjectAudioStore, RecognitionOrchestrator};
use birdcall_id::types::{AudioStore, ReferenceCatalog};
use birdcall_id::{AppState, InferenceMode};

/// Command-line arguments for birdcall-id
#[derive(Parser, Debug)]
#[command(name = "birdcall-id")]
#[command(about = "Bird call recognition service")]
#[command(version)]
struct Args {
    /// Bootstrap TOML file
    #[arg(short, long, env = "BIRDCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides BIRDCALL_PORT and TOML)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides BIRDCALL_BIND and TOML)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before tracing is up: the log level lives in this file
    let config_path = resolve_config_path(args.config.as_deref(), ENV_CONFIG);
    let toml_config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting birdcall-id v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if config_path.exists() {
        info!("Config file: {}", config_path.display());
    } else {
        warn!(
            "Config file not found at {}, using environment and defaults",
            config_path.display()
        );
    }

    let cli = CliOverrides {
        port: args.port,
        bind_address: args.bind,
    };
    let config = ServiceConfig::resolve(&toml_config, &cli).context("Invalid configuration")?;

    // Inference
    let inference = InferenceClient::new(config.inference.clone())
        .context("Failed to build inference client")?;
    let inference_mode = if inference.is_remote() {
        InferenceMode::Remote
    } else {
        InferenceMode::Synthetic
    };
    info!(
        "Inference mode: {:?}, fallback policy: {:?}",
        inference_mode,
        inference.fallback_policy()
    );

    let mut orchestrator =
        RecognitionOrchestrator::new(AudioValidator::new(config.server_limits.clone()), Arc::new(inference));

    // Durable storage
    let store: Option<Arc<dyn AudioStore>> = match &config.storage {
        StorageTarget::Disabled => {
            info!("Audio storage disabled");
            None
        }
        StorageTarget::Azure {
            connection_string,
            container,
        } => Some(Arc::new(
            ObjectAudioStore::azure(connection_string, container)
                .context("Failed to configure Azure audio storage")?,
        )),
        StorageTarget::Local(path) => Some(Arc::new(
            ObjectAudioStore::local(path).context("Failed to configure local audio storage")?,
        )),
    };
    if let Some(store) = store {
        orchestrator = orchestrator.with_store(store);
    }

    // Reference catalog
    let catalog: Option<Arc<dyn ReferenceCatalog>> = match &config.catalog {
        Some(settings) => {
            let pool = db::init_catalog_pool(&settings.database_url)
                .await
                .context("Failed to open catalog database")?;
            let catalog = SqliteCatalog::new(pool);
            if let Some(seed_file) = &settings.seed_file {
                let count = catalog
                    .seed_from_file(seed_file)
                    .await
                    .context("Failed to seed catalog")?;
                info!("Catalog seeded with {} species from {}", count, seed_file.display());
            }
            Some(Arc::new(catalog))
        }
        None => {
            info!("Catalog enrichment disabled");
            None
        }
    };

    let mut state = AppState::new(
        match &catalog {
            Some(catalog) => orchestrator.with_catalog(Arc::clone(catalog)),
            None => orchestrator,
        },
        inference_mode,
    )
    .with_client_limits(config.client_limits.clone());
    if let Some(catalog) = catalog {
        state = state.with_catalog(catalog);
    }

    let app = birdcall_id::build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
