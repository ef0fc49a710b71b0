//! memeprobe CLI
//!
//! Runs the meme generator scenario catalog against a served page and exits
//! non-zero when any check fails.

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use memeprobe::queue::SessionQueue;
use memeprobe::static_dom::Behaviors;
use memeprobe::{scenarios, Backend, FixtureStore, HarnessConfig, Viewport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memeprobe")]
#[command(about = "End-to-end checks for the meme generator page")]
#[command(version)]
struct Cli {
    /// Root URL of the page under test
    #[arg(long, env = "MEMEPROBE_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Page backend: `cdp` (headless Chrome) or `static`
    #[arg(long, env = "MEMEPROBE_BACKEND")]
    backend: Option<Backend>,

    /// Directory holding upload fixtures
    #[arg(long, env = "MEMEPROBE_FIXTURES", default_value = "fixtures")]
    fixtures: PathBuf,

    /// JSON file describing page behaviour for the static backend
    #[arg(long)]
    behaviors: Option<PathBuf>,

    /// Initial browser window size, e.g. 1366x768
    #[arg(long, default_value = "1366x768")]
    viewport: Viewport,

    /// Page load timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    scenario: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List scenarios and checks without running them
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn harness_config(&self) -> anyhow::Result<HarnessConfig> {
        let behaviors = match &self.behaviors {
            Some(path) => Behaviors::load(path)?,
            None => Behaviors::default(),
        };
        let defaults = HarnessConfig::default();
        Ok(HarnessConfig {
            base_url: self.base_url.clone(),
            viewport: self.viewport,
            timeout_ms: self.timeout_ms,
            fixtures_dir: self.fixtures.clone(),
            backend: self.backend.unwrap_or(defaults.backend),
            behaviors,
            ..defaults
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let selected = scenarios::filtered(cli.scenario.as_deref());
    if selected.is_empty() {
        anyhow::bail!("no scenario matches {:?}", cli.scenario.as_deref().unwrap_or_default());
    }

    if cli.list {
        for scenario in &selected {
            println!("{}", scenario.name);
            for check in &scenario.checks {
                println!("  - {}", check.name);
            }
        }
        return Ok(());
    }

    let config = cli.harness_config()?;
    info!(
        "memeprobe v{} against {} ({:?} backend)",
        env!("CARGO_PKG_VERSION"),
        config.base_url,
        config.backend
    );

    let fixtures = FixtureStore::new(config.fixtures_dir.clone());
    let queue = {
        let config = config.clone();
        SessionQueue::start(move || memeprobe::open_session(&config))
            .await
            .context("failed to open page session")?
    };

    let report = queue.run_scenarios(selected, fixtures).await?;
    queue.close().await?;

    if cli.json {
        println!("{}", report.to_json());
    } else {
        for failure in report.failures() {
            error!(
                "{} / {}: {}",
                failure.scenario,
                failure.check,
                failure.error.as_deref().unwrap_or("failed")
            );
        }
        println!("{} passed, {} failed", report.passed(), report.failed());
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
