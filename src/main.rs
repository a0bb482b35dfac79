mod collect;
mod colors;
mod config;
mod layout;
mod projection;
mod render;
mod scheduler;
mod settings;
mod snapshot;
mod terminal;

use clap::Parser;
use collect::{Collector, LiveCollector};
use layout::{compute_layout, Offsets};
use scheduler::{Scheduler, SystemClock};
use settings::Settings;
use std::fs::{self, File};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use terminal::Terminal;
use tracing_subscriber::EnvFilter;

/// Size assumed for `--print` when stdout is not a terminal
const PRINT_FALLBACK_SIZE: (u16, u16) = (80, 24);

#[derive(Parser)]
#[command(name = "routemap")]
#[command(version = "0.1.0")]
#[command(about = "Terminal world map of routing-table egress points and connected peers", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/routemap/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route ids to probe, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    routes: Option<Vec<u32>>,

    /// Seconds between data refreshes
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Milliseconds to sleep when there is no input
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    tick: Option<u64>,

    /// Log file (default: <cache dir>/routemap/routemap.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Collect once, print the dashboard to stdout and exit
    #[arg(short, long)]
    print: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone());

    let mut config = Settings::load(cli.config.as_deref())
        .and_then(Settings::into_config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    if let Some(routes) = cli.routes {
        if routes.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no route ids given"));
        }
        config.routes = routes;
    }
    if let Some(secs) = cli.interval {
        config.refresh_interval = Duration::from_secs(secs);
    }
    if let Some(ms) = cli.tick {
        config.tick = Duration::from_millis(ms);
    }

    tracing::info!(
        routes = ?config.routes,
        interval_secs = config.refresh_interval.as_secs(),
        "starting"
    );

    let collector = LiveCollector::new(config.sources.clone());

    if cli.print {
        return print_once(&config, collector);
    }

    let term = Terminal::new(true)?;
    Scheduler::new(config, term, SystemClock, collector).run()
}

fn print_once(config: &config::MapperConfig, mut collector: LiveCollector) -> io::Result<()> {
    let (width, height) = if io::stdout().is_terminal() {
        crossterm::terminal::size()?
    } else {
        PRINT_FALLBACK_SIZE
    };

    let snapshot = collector.collect(&config.routes);
    let layout = compute_layout(width, height, config, Offsets::from_config(config));
    render::compose(width, height, layout.as_ref(), config, &snapshot).print_to_stdout();
    Ok(())
}

/// Log to a file; the terminal belongs to the dashboard. Logging is skipped
/// when the file can't be opened.
fn init_logging(path: Option<PathBuf>) {
    let Some(path) = path.or_else(|| dirs::cache_dir().map(|d| d.join("routemap").join("routemap.log")))
    else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = File::options().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
