use blog_sentinel::config::MonitorConfig;
use blog_sentinel::logging::init_logging;
use blog_sentinel::monitor::UptimeMonitor;
use blog_sentinel::shutdown::shutdown_signal;
use blog_sentinel::version::VERSION;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = match MonitorConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load monitor configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir, "uptime-monitor.log");
    info!("Starting uptime monitor, version: {}", VERSION);

    let mut monitor = UptimeMonitor::from_config(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    match monitor.run(shutdown_rx).await {
        Ok(final_report) => {
            println!("{final_report}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Uptime monitor stopped with an error.");
            Err(e.into())
        }
    }
}
