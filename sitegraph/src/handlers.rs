use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use sitegraph_core::crawl::{CrawlOptions, execute_crawl};
use sitegraph_core::report::{ReportFormat, render, save_report};
use sitegraph_scanner::{AssetsMode, ErrorCallback, ScanError};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Installs the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,sitegraph=debug,sitegraph_core=debug,sitegraph_scanner=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn print_banner() {
    eprintln!(
        "{} {}",
        "sitegraph".bright_cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains("://") {
        return Url::parse(line).ok().map(|_| line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    Url::parse(&with_scheme).ok().map(|_| with_scheme)
}

/// Expands `~` in a user-supplied output path.
pub fn resolve_output_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Names the report file after its format when `path` is a directory.
pub fn report_path(path: PathBuf, format: ReportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(format!("sitegraph.{}", format.extension()))
    } else {
        path
    }
}

/// Prints each fetch failure to stderr without interrupting the crawl.
pub fn stderr_error_callback() -> ErrorCallback {
    Arc::new(|url: &str, err: &ScanError| {
        eprintln!("{} {}: {}", "Error for".red().bold(), url, err);
    })
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let Some(raw_url) = sub_matches.get_one::<String>("URL") else {
        bail!("A URL to crawl is required");
    };
    let Some(url) = parse_url_line(raw_url) else {
        bail!("Invalid URL '{}'", raw_url);
    };

    let mut options = CrawlOptions::new(url);
    options.threads = sub_matches.get_one::<usize>("threads").copied();
    if let Some(max_depth) = sub_matches.get_one::<u64>("max-depth") {
        options.max_depth = *max_depth;
    }
    if let Some(max_requests) = sub_matches.get_one::<u64>("max-requests") {
        options.max_requests = *max_requests;
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }
    if sub_matches.get_flag("no-assets") {
        options.assets_mode = AssetsMode::IgnoreAssets;
    }
    options.show_progress_bars = !quiet;

    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let Some(format) = ReportFormat::from_str(format_name) else {
        bail!("Unknown report format '{}'", format_name);
    };

    let output = sub_matches
        .get_one::<String>("output")
        .map(|path| report_path(resolve_output_path(path), format));

    run_crawl(options, format, output, quiet).await
}

/// Crawls, renders the report and writes it to `output` or stdout.
pub async fn run_crawl(
    options: CrawlOptions,
    format: ReportFormat,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        eprintln!(
            "{} Crawling {}",
            "→".blue(),
            options.url.bright_white()
        );
        eprintln!(
            "  max depth {}, max requests {}, timeout {}s",
            options.max_depth.to_string().cyan(),
            options.max_requests.to_string().cyan(),
            options.timeout_secs.to_string().cyan()
        );
    }

    let url = options.url.clone();
    let graph = execute_crawl(options, stderr_error_callback())
        .await
        .with_context(|| format!("Crawl of {} failed", url))?;
    info!("Crawl of {} produced {} nodes", url, graph.len());

    let report = render(&graph, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(report.as_bytes())
                .context("Failed to write report to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
