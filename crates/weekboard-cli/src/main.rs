//! `weekboard` CLI — fetch an iCalendar feed and render its current work week.
//!
//! ## Usage
//!
//! ```sh
//! # Fetch from a URL (or set ICS_URL) and write public/calendar/index.html
//! weekboard --url https://example.com/team.ics
//!
//! # Read a local file, pick the week of a given date, print to stdout
//! weekboard --input team.ics --date 2026-03-11 --output -
//!
//! # Emit the resolved week as JSON instead of HTML
//! weekboard --input team.ics --format json --output week.json
//! ```
//!
//! Exit codes: 0 success, 1 configuration error, 2 fetch or feed failure,
//! 3 output write failure.

mod render;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use weekboard_engine::{parse_feed, resolve, WeekWindow};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "weekboard",
    version,
    about = "Render the Monday–Friday week of an iCalendar feed"
)]
struct Cli {
    /// Feed URL
    #[arg(long, env = "ICS_URL")]
    url: Option<String>,

    /// Read the feed from a local file instead of fetching it (wins over --url)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// IANA timezone the week is rendered in
    #[arg(long, env = "WEEKBOARD_TZ", default_value = "Europe/Vienna")]
    timezone: String,

    /// Any date inside the week to render (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "public/calendar/index.html")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

/// The phase a run failed in; decides the exit code.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Config,
    Feed,
    Write,
}

impl Stage {
    fn exit_code(self) -> u8 {
        match self {
            Stage::Config => 1,
            Stage::Feed => 2,
            Stage::Write => 3,
        }
    }
}

struct Failure {
    stage: Stage,
    error: anyhow::Error,
}

trait StageExt<T> {
    fn during(self, stage: Stage) -> Result<T, Failure>;
}

impl<T> StageExt<T> for anyhow::Result<T> {
    fn during(self, stage: Stage) -> Result<T, Failure> {
        self.map_err(|error| Failure { stage, error })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(stage = ?failure.stage, "{:#}", failure.error);
            eprintln!("Error: {:#}", failure.error);
            ExitCode::from(failure.stage.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let tz: Tz = cli
        .timezone
        .trim()
        .parse()
        .map_err(|_| anyhow!("Unknown timezone: '{}'", cli.timezone))
        .during(Stage::Config)?;
    let now = Utc::now().with_timezone(&tz);
    let date = match cli.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid --date '{raw}', expected YYYY-MM-DD"))
            .during(Stage::Config)?,
        None => now.date_naive(),
    };
    let window = WeekWindow::containing(date, tz)
        .context("Failed to build the week window")
        .during(Stage::Config)?;

    let bytes = match (&cli.input, cli.url.as_deref().map(str::trim)) {
        (Some(path), _) => fs::read(path)
            .with_context(|| format!("Failed to read feed: {}", path.display()))
            .during(Stage::Feed)?,
        (None, Some(url)) if !url.is_empty() => fetch(url).during(Stage::Feed)?,
        _ => {
            return Err(anyhow!("No feed source: pass --url, --input or set ICS_URL"))
                .during(Stage::Config)
        }
    };
    info!(bytes = bytes.len(), "feed loaded");

    let feed = parse_feed(&bytes)
        .context("Failed to parse the iCalendar feed")
        .during(Stage::Feed)?;
    let mut view = resolve(&feed.components, &window);
    let mut diagnostics = feed.diagnostics;
    diagnostics.append(&mut view.diagnostics);
    view.diagnostics = diagnostics;
    info!(
        iso_week = view.iso_week,
        segments = view.segment_count(),
        dropped = view.diagnostics.len(),
        "week resolved"
    );

    let content = match cli.format {
        Format::Html => render::html(&view, now),
        Format::Json => serde_json::to_string_pretty(&view)
            .context("Failed to serialize the week")
            .during(Stage::Write)?,
    };
    write_output(&cli.output, &content).during(Stage::Write)
}

fn fetch(url: &str) -> anyhow::Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("weekboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .with_context(|| format!("Failed to fetch feed: {url}"))?;
    let body = response.bytes().context("Failed to read feed body")?;
    Ok(body.to_vec())
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if path == Path::new("-") {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))?;
    info!(path = %path.display(), "output written");
    Ok(())
}
