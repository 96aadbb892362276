use indicatif::{ProgressBar, ProgressStyle};
use sitegraph_scanner::error::Result;
use sitegraph_scanner::http::build_client;
use sitegraph_scanner::{
    AssetsMode, CrawlProgress, Crawler, ErrorCallback, Graph, HttpSource, LimitedSource,
    ProgressCallback, SourceRef,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_MAX_DEPTH: u64 = 30;
pub const DEFAULT_MAX_REQUESTS: u64 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    /// Fetch workers; `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub max_depth: u64,
    pub max_requests: u64,
    pub assets_mode: AssetsMode,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            threads: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_requests: DEFAULT_MAX_REQUESTS,
            assets_mode: AssetsMode::IncludeAssets,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress_bars: false,
        }
    }
}

/// Crawl `options.url` over HTTP within the configured budget.
///
/// Fetch failures go to `on_error`; they never fail the crawl.
pub async fn execute_crawl(options: CrawlOptions, on_error: ErrorCallback) -> Result<Graph> {
    let client = build_client(options.timeout_secs)?;
    let root = HttpSource::new(&options.url, client, on_error)?;
    crawl_source(Arc::new(root), &options).await
}

/// Crawl any source under the budget and worker settings in `options`.
pub async fn crawl_source(source: SourceRef, options: &CrawlOptions) -> Result<Graph> {
    let root: SourceRef = Arc::new(LimitedSource::wrap(
        source,
        options.max_requests,
        options.max_depth,
    ));

    let mut crawler = Crawler::new().with_assets_mode(options.assets_mode);
    if let Some(threads) = options.threads {
        crawler = crawler.with_workers(threads);
    }

    info!(
        "Crawling {} (max depth {}, max requests {}, {} workers)",
        root.key(),
        options.max_depth,
        options.max_requests,
        crawler.workers()
    );

    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");

        let pb_clone = pb.clone();
        let callback: ProgressCallback = Arc::new(move |progress: CrawlProgress| {
            pb_clone.set_message(format!(
                "Crawling... {} fetched, {} nodes, {} pending",
                progress.fetched, progress.nodes, progress.outstanding
            ));
        });
        crawler = crawler.with_progress_callback(callback);
        Some(pb)
    } else {
        None
    };

    let result = crawler.crawl(root).await;

    if let Some(pb) = progress_bar {
        match &result {
            Ok(graph) => pb.finish_with_message(format!("Crawl complete! {} nodes", graph.len())),
            Err(_) => pb.finish_and_clear(),
        }
    }

    result
}
