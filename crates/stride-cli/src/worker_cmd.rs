//! Run the generation worker pool until interrupted.

use anyhow::Result;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use stride_core::worker::{Worker, WorkerConfig};

pub async fn run_worker(pool: PgPool, concurrency: usize, rate_limit: u32) -> Result<()> {
    let config = WorkerConfig {
        concurrency,
        rate_limit,
        ..WorkerConfig::default()
    };
    let worker = Worker::new(pool, config);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received");
        signal_cancel.cancel();
    });

    worker.run(cancel).await
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
