//! Example downloading the mods of a config file
//!
//! Run this example with:
//! ```
//! cargo run --example download_mods -- mods.txt ./mods [--clean] [--force] [--server|--client] [--optional <id>]...
//! ```

use anyhow::{Context, bail};
use mod_downloader::{DownloadConfig, DownloadMode, DownloadParameters, Downloader, ModSide, TracingProgressSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(download_to)) = (args.next(), args.next()) else {
        bail!("usage: download_mods <config> <directory> [--clean] [--force] [--server|--client] [--optional <id>]...");
    };

    let mut params = DownloadParameters::new(download_to);
    let mut optional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--clean" => params = params.with_mode(DownloadMode::Clean),
            "--force" => params = params.with_force(true),
            "--server" => params = params.with_download_for(ModSide::Server),
            "--client" => params = params.with_download_for(ModSide::Client),
            "--optional" => optional.push(args.next().context("--optional needs a mod id")?),
            other => bail!("unknown argument: {other}"),
        }
    }
    params = params.with_optional_mods(optional);

    let text = std::fs::read_to_string(&config_path).with_context(|| format!("reading {config_path}"))?;
    let mods = mod_downloader::parse_config(&config_path, &text)?;

    let downloader = Downloader::new(DownloadConfig::from_env()?)?;
    let result = downloader.run(&mods, &params, &TracingProgressSink).await?;

    println!(
        "✅ {} downloaded, {} removed, {} kept",
        result.downloaded.len(),
        result.removed.len(),
        result.kept.len()
    );
    Ok(())
}
