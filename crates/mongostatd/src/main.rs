//! mongostatd - MongoDB collection statistics exporter.
//!
//! Samples `collStats` for every user collection on a fixed interval and serves
//! the result as Prometheus gauges.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod background;
mod handlers;
mod metrics;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::Router;
use clap::Parser;
use prometheus::Registry;
use tokio::sync::Notify;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use mongostat_core::collector::{CollStatsCollector, MongoSource};
use mongostat_core::exporter::{CollStatsExporter, DEFAULT_NAMESPACE, ExporterOptions};
use mongostat_core::suppress::LogSuppressor;

use metrics::CycleMetrics;

/// MongoDB collection statistics exporter.
#[derive(Parser, Debug)]
#[command(
    name = "mongostatd",
    about = "MongoDB collection statistics exporter",
    version = mongostat_core::VERSION
)]
struct Args {
    /// MongoDB connection string. Driver timeouts
    /// (serverSelectionTimeoutMS, connectTimeoutMS, socketTimeoutMS) go here.
    #[arg(long, default_value = "mongodb://localhost:27017", env = "MONGOSTAT_URI")]
    uri: String,

    /// Listen address of the scrape endpoint.
    #[arg(long, default_value = "0.0.0.0:9216", env = "MONGOSTAT_LISTEN")]
    listen: SocketAddr,

    /// Collection interval in seconds.
    #[arg(
        short,
        long,
        default_value = "15",
        env = "MONGOSTAT_INTERVAL",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Prefix of every metric name.
    #[arg(long, default_value = DEFAULT_NAMESPACE, env = "MONGOSTAT_NAMESPACE")]
    namespace: String,

    /// Route serving the metrics.
    #[arg(
        long,
        default_value = "/metrics",
        env = "MONGOSTAT_METRICS_PATH",
        value_parser = parse_route
    )]
    metrics_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Accepts absolute routes other than `/`, which serves the landing page.
fn parse_route(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err(format!("route '{}' must start with '/'", s));
    }
    if s == "/" {
        return Err("route '/' is reserved for the landing page".to_string());
    }
    Ok(s.to_string())
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["mongostatd", "mongostat_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn serve(listen: SocketAddr, app: Router, shutdown: Arc<Notify>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(listen = %listen, "serving metrics");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("mongostatd {} starting", mongostat_core::VERSION);
    info!(
        "Config: interval={}s, listen={}, namespace={}, metrics_path={}",
        args.interval, args.listen, args.namespace, args.metrics_path
    );

    let source = match MongoSource::connect(&args.uri) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "invalid MongoDB connection string");
            process::exit(1);
        }
    };

    let options = ExporterOptions {
        namespace: args.namespace.clone(),
    };
    let registry = Registry::new();
    let setup = CollStatsExporter::new(&options).and_then(|exporter| {
        let metrics = CycleMetrics::new(&options.namespace)?;
        registry.register(Box::new(exporter.clone()))?;
        metrics.register(&registry)?;
        Ok((exporter, metrics))
    });
    let (exporter, cycle_metrics) = match setup {
        Ok(parts) => parts,
        Err(e) => {
            error!(namespace = %options.namespace, error = %e, "failed to set up metrics");
            process::exit(1);
        }
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let shutdown = Arc::new(Notify::new());
    {
        let running = running.clone();
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        }) {
            warn!("Failed to set Ctrl-C handler: {}", e);
        }
    }

    let collector = CollStatsCollector::new(source, Arc::new(LogSuppressor::new()));
    let interval = Duration::from_secs(args.interval);
    let loop_handle = {
        let running = running.clone();
        let exporter = exporter.clone();
        std::thread::Builder::new()
            .name("collstats".to_string())
            .spawn(move || {
                background::collect_loop(&collector, &exporter, &cycle_metrics, interval, &running)
            })
    };
    let loop_handle = match loop_handle {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "failed to start collection thread");
            process::exit(1);
        }
    };

    let app = handlers::router(registry, &args.metrics_path);
    let served = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(serve(args.listen, app, shutdown));

    info!("Shutting down...");
    running.store(false, Ordering::SeqCst);
    if loop_handle.join().is_err() {
        error!("collection thread panicked");
    }

    if let Err(e) = served {
        error!(listen = %args.listen, error = %e, "metrics server failed");
        process::exit(1);
    }
    info!("Shutdown complete");
}
