use clap::Parser;
use gofer::{config, writer};
use jemallocator::Jemalloc;
use tokio::{runtime::Builder, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn default_auth_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Args {
    /// base URL of the service handing out write credentials
    #[clap(long, default_value_t = default_auth_url())]
    auth: String,
    /// number of concurrent writers to run
    #[clap(long, default_value_t = 5)]
    writers: u16,
    /// enable verbose logging, including the fetched credentials
    #[clap(long)]
    debug: bool,
}

async fn inner_main(config: config::Config) -> Result<(), Error> {
    let (shutdown_watcher, shutdown_broadcaster) = gofer_signal::signal();
    let pool = writer::Pool::new(&config, shutdown_watcher);
    let mut pool_task = tokio::spawn(pool.spin());

    tokio::select! {
        res = signal::ctrl_c() => {
            res?;
            info!("received interrupt, shutting down writers");
        }
        res = &mut pool_task => {
            // The pool only returns after a shutdown signal, so landing
            // here means a writer task panicked out from under it.
            if let Err(err) = res {
                error!(%err, "writer pool exited unexpectedly");
            }
            return Ok(());
        }
    }

    shutdown_broadcaster.signal_and_wait().await;
    let _ = pool_task.await;
    info!("all writers drained");
    Ok(())
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish()
        .init();

    let version = env!("CARGO_PKG_VERSION");
    info!("Starting gofer {version}");

    let config = config::Config::new(&args.auth, args.writers)?;
    info!(
        auth = %config.auth,
        writers = config.writers,
        "Starting writers"
    );

    let runtime = Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()?;
    let res = runtime.block_on(inner_main(config));
    info!("Bye. :)");
    res
}
