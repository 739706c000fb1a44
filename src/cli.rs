use crate::config::load_config;
use crate::ir::parse_graph_json;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "LAYERFLOW_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "layerflow",
    version,
    about = "Layered graph layout (JSON graph in, JSON layout out)"
)]
pub struct Args {
    /// Input graph document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Log filter (trace|debug|info|warn|error or an EnvFilter directive)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Measure labels with system fonts instead of the built-in width table
    #[cfg(feature = "font-metrics")]
    #[arg(long = "font-metrics")]
    pub font_metrics: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    let input = read_input(args.input.as_deref())?;
    let graph = parse_graph_json(&input)?;
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "graph loaded"
    );

    #[cfg(feature = "font-metrics")]
    let layout = if args.font_metrics {
        crate::layout::compute_layout_with(&graph, &config, &crate::text_metrics::FontMetrics)
    } else {
        compute_layout(&graph, &config)
    };
    #[cfg(not(feature = "font-metrics"))]
    let layout = compute_layout(&graph, &config);

    write_layout_dump(args.output.as_deref(), &layout)
}

/// Installs a stderr subscriber. The filter comes from `level`, then
/// `LAYERFLOW_LOG`, then `RUST_LOG`, defaulting to `warn`. A second call is
/// a no-op.
pub fn init_logging(level: Option<&str>) {
    let directive = level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
