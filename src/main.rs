use clap::{Parser, Subcommand};
use imgserve::service::ImageService;
use imgserve::{config, http, logging, output, sweep};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

fn version_string() -> &'static str {
    let on_tag = env!("IMGSERVE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("IMGSERVE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imgserve")]
#[command(about = "On-demand image resizing server with a disk cache")]
#[command(long_about = "\
On-demand image resizing server with a disk cache

Serves files under the storage root at /images/<path>. Adding w, h and fit
query parameters returns a resized JPEG, generated on first request and
cached on disk afterwards:

  /images/5/photo.jpg                      original bytes
  /images/5/photo.jpg?w=800                800 wide, proportional
  /images/5/photo.jpg?w=300&h=200&fit=cover  cropped to exactly 300x200

Fit modes:
  contain  fit inside the box, keep aspect ratio (default)
  cover    fill the box, crop the overflow from the centre
  fill     stretch to exactly the box

Cached renditions are never invalidated; a changed source gets a new key.
Run 'imgserve cleanup' periodically to delete old entries.

Run 'imgserve gen-config' to generate a documented imgserve.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Debug-level logging for imgserve
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Delete cached images older than the retention window
    Cleanup {
        /// Retention window in days, overrides cache.retention_days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print a stock imgserve.toml with all options documented
    GenConfig,
    /// Load and validate the config, then print the effective settings
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            logging::init_logging(cli.verbose);
            let config = config::load_config(&cli.config)?;
            let addr = match bind {
                Some(addr) => addr,
                None => config.bind_addr()?,
            };
            let service = ImageService::from_config(&config)?;
            info!(
                root = %config.storage.root.display(),
                cache = service.cache_available(),
                "Starting imgserve"
            );
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(http::serve(Arc::new(service), addr))?;
        }
        Command::Cleanup { days } => {
            logging::init_logging(cli.verbose);
            let config = config::load_config(&cli.config)?;
            let days = days.unwrap_or(config.cache.retention_days);
            let report = sweep::sweep(&config.cache.dir, days, SystemTime::now())?;
            output::print_sweep_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let source = cli.config.exists().then_some(cli.config.as_path());
            output::print_config_check(&config, source);
            println!("==> Config is valid");
        }
    }

    Ok(())
}
