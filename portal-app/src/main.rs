mod config;

use std::path::PathBuf;

use eyre::eyre;
use portal::{
    processors::{MetadataOptions, MetadataProcessor},
    runtime::Shim,
};
use portal_core::Processor;
use structopt::StructOpt;
use tokio::io::BufReader;
use tracing::Level;

use crate::config::Config;

/// Runs Portal processors behind the agent's `execd` processor: metrics are read from stdin
/// and written back to stdout as line protocol, logs go to stderr.
#[derive(StructOpt, Debug)]
#[structopt(name = "portal")]
struct Opts {
    /// Path to the TOML configuration file.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Print a sample configuration and exit.
    #[structopt(long)]
    sample_config: bool,

    /// Enable debug logs.
    #[structopt(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts = Opts::from_args();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if opts.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    if opts.sample_config {
        let processor = MetadataProcessor::new(MetadataOptions::default());
        println!("# {}", processor.description());
        print!("{}", processor.sample_config());

        return Ok(());
    }

    let path = opts
        .config
        .ok_or_else(|| eyre!("Missing --config, see --help"))?;

    let conf = Config::load(path.as_path())?.build()?;
    let shim = Shim::init(conf).await?;

    let stats = shim
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    tracing::info!(
        target = "shim",
        "Input closed after {} metrics, {} invalid lines dropped",
        stats.processed,
        stats.rejected
    );

    Ok(())
}
