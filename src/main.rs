use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainview::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_BACKEND_URL, DEFAULT_INTERVAL_SECS,
    DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
};
use chainview::{
    BackendGateway, ConsoleSink, HttpGateway, PageViewer, RefreshController, RefreshTask,
    SinkHandle,
};

#[derive(Parser, Debug)]
#[clap(name = "chainview", about = "Console front-end for the option chain backend")]
struct CliArgs {
    /// Base URL of the options backend.
    #[clap(long, default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Seconds between refresh iterations. Values below 5 are raised to 5.
    #[clap(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,

    /// Rows per preview page.
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Timeout in seconds for backend requests.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Path to a TOML config file. Values there override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the recurring refresh loop until interrupted.
    Watch,
    /// Run the chain computation once and print the backend's summary.
    Run,
    /// Fetch and render one page of the contract preview.
    Preview {
        /// Page to fetch (1-based).
        #[clap(long, default_value_t = 1)]
        page: u32,
    },
    /// Ask the backend to export the contract dataset.
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        backend_url: cli_args.backend_url.clone(),
        interval_secs: cli_args.interval_secs,
        page_size: cli_args.page_size,
        timeout_secs: cli_args.timeout_secs,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Using backend at {}", config.backend_url);
    let gateway: Arc<dyn BackendGateway> = Arc::new(HttpGateway::new(
        config.backend_url.clone(),
        config.timeout_secs,
    )?);
    let sink = SinkHandle::new(Box::new(ConsoleSink::default()));

    match cli_args.command {
        Command::Watch => {
            let controller = RefreshController::new(gateway, sink, Arc::new(RefreshTask));
            controller.start(config.interval_secs);

            tokio::signal::ctrl_c().await?;
            info!("Interrupt received, shutting down");
            controller.stop();
            controller.wait_until_stopped().await;
        }
        Command::Run => {
            let controller = RefreshController::new(gateway, sink, Arc::new(RefreshTask));
            controller.run_once().await;
        }
        Command::Preview { page } => {
            let viewer = PageViewer::new(gateway, sink, config.page_size);
            viewer.load_page(page).await;
        }
        Command::Export => match gateway.export_dataset().await {
            Ok(()) => {
                sink.set_status("Export requested");
            }
            Err(e) => {
                sink.set_status(&format!("Error: {}", e));
            }
        },
    }

    Ok(())
}
