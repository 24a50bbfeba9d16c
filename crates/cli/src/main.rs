use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Convert a locally-mirrored web book into a single EPUB
#[derive(Parser, Debug)]
#[command(name = "bindery")]
#[command(author = "Bindery Contributors")]
#[command(version)]
#[command(about = "Convert a locally-mirrored web book into a single EPUB", long_about = None)]
struct Args {
    /// Path to the directory with the mirrored book (must contain index.html)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let output = bindery_core::convert(&args.path)
        .with_context(|| format!("failed to convert {}", args.path.display()))?;

    eprintln!("{} {}", "✓".green(), format!("wrote {}", output.display()).bright_green());

    Ok(())
}
