//! Dashboard generation tool for Prometheus metric expositions.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use promboard::config::{Config, Source};
use promboard::group::UnderscoreStrategy;
use promboard::render::{GlobalSettings, GrafanaRenderer, Renderer};
use promboard::{panel, scrape};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// URL of the metrics endpoint
    #[clap(short, long)]
    url: Option<String>,

    /// Path to a local exposition snapshot instead of a URL
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Dashboard title
    #[clap(short, long)]
    title: Option<String>,

    /// Seconds to wait for the metrics endpoint before giving up
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// Path to a YAML config file; flags override its values
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[clap(short, long)]
    debug: bool,
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("configuration failed: {0}")]
    Config(#[from] promboard::config::Error),
    #[error("fetch failed: {0}")]
    Fetch(#[from] promboard::scrape::Error),
    #[error("parse failed: {0}")]
    Parse(#[from] promboard_exposition::Error),
    #[error("render failed: {0}")]
    Render(#[from] promboard::render::Error),
}

fn apply_flags(mut config: Config, args: &Args) -> Config {
    if args.url.is_some() {
        config.url = args.url.clone();
    }
    if args.input.is_some() {
        config.input = args.input.clone();
    }
    if args.title.is_some() {
        config.title = args.title.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    config
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
        .init();

    info!("Welcome to promboard");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config = apply_flags(config, &args);

    let text = match config.source()? {
        Source::Url(url) => {
            let client = reqwest::Client::new();
            scrape::fetch(&client, url, config.timeout()).await?
        }
        Source::File(path) => scrape::read_file(path).await?,
    };

    info!("parsing metrics data");
    let exposition = promboard_exposition::parse_families(&text)?;
    if !exposition.line_errors.is_empty() {
        warn!(
            "skipped {} malformed exposition lines",
            exposition.line_errors.len()
        );
    }

    let (panels, tally) = panel::dashboard_list(&exposition.families, &UnderscoreStrategy);
    for (kind, count) in tally.entries() {
        info!("found metrics of type {kind}: {count}");
    }
    for descriptor in &panels {
        debug!("{descriptor:?}");
    }

    info!("generating dashboard");
    let settings = GlobalSettings::new(config.title.clone());
    let document = GrafanaRenderer.render(&panels, &settings)?;

    println!("{document}");
    info!("dashboard generated and printed to stdout");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file_values() {
        let config = Config {
            url: Some("http://old:9090/metrics".to_string()),
            title: Some("Old Title".to_string()),
            ..Config::default()
        };
        let args = Args::parse_from([
            "promboard",
            "--url",
            "http://new:9090/metrics",
            "--timeout-secs",
            "3",
        ]);

        let merged = apply_flags(config, &args);
        assert_eq!(merged.url.as_deref(), Some("http://new:9090/metrics"));
        assert_eq!(merged.title.as_deref(), Some("Old Title"));
        assert_eq!(merged.timeout_secs, 3);
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let config = Config {
            input: Some(PathBuf::from("snapshot.prom")),
            ..Config::default()
        };
        let args = Args::parse_from(["promboard"]);

        let merged = apply_flags(config, &args);
        assert_eq!(merged.input.as_deref(), Some(std::path::Path::new("snapshot.prom")));
        assert_eq!(merged.timeout_secs, 10);
    }
}
