mod app;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "vocex", about = "Auditory translation-production task runner")]
struct Args {
    /// Participant identifier; its embedded digits seed the trial order.
    #[arg(short, long)]
    id: Option<String>,

    /// Directory holding per-voice stimulus audio (`female/`, `male/`).
    #[arg(long, default_value = "stimuli")]
    assets: PathBuf,

    /// Directory the export bundle is written to.
    #[arg(long, default_value = "results")]
    output: PathBuf,

    /// Optional JSON task-configuration override.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    app::run(args.id, args.assets, args.output, args.config)
}
