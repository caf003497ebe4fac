mod config;
mod generate_cmd;
mod serve_cmd;
mod status_cmd;
#[cfg(test)]
mod test_util;
mod worker_cmd;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use stride_db::pool;

use config::StrideConfig;

#[derive(Parser)]
#[command(name = "stride", about = "Asynchronous training-plan generation service")]
struct Cli {
    /// Database URL (overrides STRIDE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a stride config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/stride")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the stride database (create it and run migrations)
    DbInit,
    /// Run the HTTP façade
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Also run a generation worker in-process
        #[arg(long)]
        with_worker: bool,
    },
    /// Run the generation worker pool
    Worker {
        /// Maximum number of jobs processed simultaneously
        #[arg(long, default_value_t = 5)]
        concurrency: usize,
        /// Maximum job dispatches per second
        #[arg(long, default_value_t = 10)]
        rate_limit: u32,
    },
    /// Generate a plan offline and print it as JSON (no database)
    Generate {
        /// Race objective: 5k, 10k, half-marathon, marathon
        objective: String,
        /// Experience level: beginner, intermediate, advanced
        level: String,
        /// Plan duration in weeks (4-52)
        #[arg(long, default_value_t = 12)]
        duration_weeks: i32,
        /// Sessions per week (2-7)
        #[arg(long, default_value_t = 4)]
        sessions_per_week: i32,
        /// Plan start date (YYYY-MM-DD)
        #[arg(long, default_value = "2025-01-01")]
        start_date: String,
    },
    /// Show a plan's generation status
    Status {
        /// Plan ID to check
        plan_id: String,
        /// Poll until the plan reaches a terminal state
        #[arg(long)]
        wait: bool,
        /// Maximum number of polls when waiting
        #[arg(long, default_value_t = 30)]
        attempts: u32,
        /// Seconds between polls when waiting
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

/// Execute the `stride init` command: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let file = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
    };
    config::save_config(&file)?;
    println!("wrote config to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Init needs no database.
    if let Commands::Init { db_url, force } = &cli.command {
        return cmd_init(db_url, *force);
    }

    let stride_config = StrideConfig::resolve(cli.database_url.as_deref())?;

    let result = match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::DbInit => {
            pool::ensure_database_exists(&stride_config.db_config).await?;
            let pool = pool::create_pool(&stride_config.db_config).await?;
            let outcome = pool::run_migrations(&pool).await;
            pool.close().await;
            outcome.map(|()| println!("database initialized"))
        }
        Commands::Serve {
            bind,
            port,
            with_worker,
        } => {
            let pool = pool::create_pool(&stride_config.db_config).await?;
            let worker_handle = if with_worker {
                let worker_pool = pool.clone();
                let cancel = CancellationToken::new();
                let worker_cancel = cancel.clone();
                let handle = tokio::spawn(async move {
                    let worker = stride_core::worker::Worker::new(
                        worker_pool,
                        stride_core::worker::WorkerConfig::default(),
                    );
                    worker.run(worker_cancel).await
                });
                Some((handle, cancel))
            } else {
                None
            };

            let serve_result = serve_cmd::run_serve(pool.clone(), &bind, port).await;

            if let Some((handle, cancel)) = worker_handle {
                cancel.cancel();
                handle
                    .await
                    .context("worker task panicked")?
                    .context("worker failed")?;
            }
            pool.close().await;
            serve_result
        }
        Commands::Worker {
            concurrency,
            rate_limit,
        } => {
            let pool = pool::create_pool(&stride_config.db_config).await?;
            let outcome = worker_cmd::run_worker(pool.clone(), concurrency, rate_limit).await;
            pool.close().await;
            outcome
        }
        Commands::Generate {
            objective,
            level,
            duration_weeks,
            sessions_per_week,
            start_date,
        } => generate_cmd::run_generate(
            &objective,
            &level,
            duration_weeks,
            sessions_per_week,
            &start_date,
        ),
        Commands::Status {
            plan_id,
            wait,
            attempts,
            interval,
        } => {
            let pool = pool::create_pool(&stride_config.db_config).await?;
            let outcome = status_cmd::run_status(&pool, &plan_id, wait, attempts, interval).await;
            pool.close().await;
            outcome
        }
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
