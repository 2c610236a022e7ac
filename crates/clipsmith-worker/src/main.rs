//! Media processing worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipsmith_media::FfmpegEngine;
use clipsmith_queue::JobQueue;
use clipsmith_storage::storage_from_env;
use clipsmith_store::RedisStore;
use clipsmith_worker::{
    AssemblyAiClient, JobExecutor, ProcessingContext, WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting clipsmith-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let store = match RedisStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create record store: {}", e);
            std::process::exit(1);
        }
    };

    let storage = match storage_from_env().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create blob storage: {}", e);
            std::process::exit(1);
        }
    };

    let transcriber = match AssemblyAiClient::from_env() {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("Failed to create transcription client: {}", e);
            std::process::exit(1);
        }
    };

    let engine = Arc::new(FfmpegEngine::new().with_timeout(config.engine_timeout.as_secs()));

    let ctx = ProcessingContext::new(
        config,
        store.clone(),
        store,
        storage,
        engine,
        transcriber,
    );

    let executor = Arc::new(JobExecutor::new(ctx, queue));

    // Setup signal handler
    let shutdown_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("clipsmith=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
