use crate::error::{Result, ScanError};
use crate::graph::{EdgeKind, Graph, NodeId};
use crate::source::{Outs, SourceRef};
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

/// Whether asset references are folded into the graph. Links are always
/// followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetsMode {
    #[default]
    IncludeAssets,
    IgnoreAssets,
}

/// Snapshot handed to the progress callback after every graph update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlProgress {
    pub nodes: usize,
    pub fetched: usize,
    pub outstanding: usize,
}

pub type ProgressCallback = Arc<dyn Fn(CrawlProgress) + Send + Sync>;

struct FetchRequest {
    node: NodeId,
    source: SourceRef,
}

struct GraphUpdate {
    node: NodeId,
    outs: Outs,
}

type RequestQueue = Arc<Mutex<mpsc::Receiver<FetchRequest>>>;

/// Builds a deduplicated graph from a root source.
///
/// A pool of fetch workers calls into sources concurrently; a single mutator
/// (the future returned by [`Crawler::crawl`]) owns the graph and is the only
/// code that ever touches it.
pub struct Crawler {
    workers: usize,
    assets_mode: AssetsMode,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            workers,
            assets_mode: AssetsMode::default(),
            progress_callback: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_assets_mode(mut self, assets_mode: AssetsMode) -> Self {
        self.assets_mode = assets_mode;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn assets_mode(&self) -> AssetsMode {
        self.assets_mode
    }

    pub async fn crawl(&self, root: SourceRef) -> Result<Graph> {
        info!("Starting crawl of {} with {} workers", root.key(), self.workers);

        let mut graph = Graph::new(root.key());

        let (request_tx, request_rx) = mpsc::channel::<FetchRequest>(self.workers);
        let request_rx: RequestQueue = Arc::new(Mutex::new(request_rx));
        let (update_tx, mut update_rx) = mpsc::channel::<GraphUpdate>(self.workers);

        let handles: Vec<_> = (0..self.workers)
            .map(|worker_id| {
                tokio::spawn(fetch_worker(
                    worker_id,
                    Arc::clone(&request_rx),
                    update_tx.clone(),
                ))
            })
            .collect();
        // Only workers may hold senders, so a closed channel means they all exited.
        drop(update_tx);

        // Never block on request_tx: workers may be blocked handing us results.
        let mut queued = VecDeque::new();
        queued.push_back(FetchRequest {
            node: graph.root(),
            source: root,
        });
        let mut outstanding = 1usize;
        let mut fetched = 0usize;
        dispatch(&request_tx, &mut queued);

        while outstanding > 0 {
            let Some(update) = update_rx.recv().await else {
                warn!("Fetch workers exited with {} request(s) outstanding", outstanding);
                break;
            };

            fetched += 1;
            outstanding += self.fold(&mut graph, update, &mut queued);
            outstanding -= 1;
            dispatch(&request_tx, &mut queued);

            if let Some(ref callback) = self.progress_callback {
                callback(CrawlProgress {
                    nodes: graph.len(),
                    fetched,
                    outstanding,
                });
            }
        }

        // Idle workers see the channel close and exit.
        drop(request_tx);
        for handle in handles {
            handle.await?;
        }

        if outstanding > 0 {
            return Err(ScanError::WorkersExited(outstanding));
        }

        graph.sort_edges();
        info!(
            "Crawl complete. {} nodes from {} fetches",
            graph.len(),
            fetched
        );
        Ok(graph)
    }

    /// Applies one fetch result to the graph, queueing fetches for newly
    /// discovered links. Returns how many were queued.
    fn fold(&self, graph: &mut Graph, update: GraphUpdate, queued: &mut VecDeque<FetchRequest>) -> usize {
        let GraphUpdate { node, outs } = update;
        let mut discovered = 0;

        for link in outs.links {
            let (target, created) = graph.add_reference(node, &link.key, EdgeKind::Link);
            if created {
                queued.push_back(FetchRequest {
                    node: target,
                    source: link.source,
                });
                discovered += 1;
            }
        }

        if self.assets_mode == AssetsMode::IncludeAssets {
            for asset in outs.assets {
                graph.add_reference(node, &asset.key, EdgeKind::Asset);
            }
        }

        debug!(
            "Folded {}: {} new link(s), {} node(s) total",
            graph.node(node).key(),
            discovered,
            graph.len()
        );
        discovered
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// Crawls from `root` with the default worker pool.
pub async fn crawl(root: SourceRef, assets_mode: AssetsMode) -> Result<Graph> {
    Crawler::new().with_assets_mode(assets_mode).crawl(root).await
}

/// Pushes queued requests into the channel until it is full.
fn dispatch(requests: &mpsc::Sender<FetchRequest>, queued: &mut VecDeque<FetchRequest>) {
    while let Some(request) = queued.pop_front() {
        match requests.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(request) | TrySendError::Closed(request)) => {
                queued.push_front(request);
                break;
            }
        }
    }
}

async fn fetch_worker(worker_id: usize, requests: RequestQueue, updates: mpsc::Sender<GraphUpdate>) {
    debug!("Worker {} started", worker_id);

    loop {
        let next = {
            let mut rx = requests.lock().await;
            rx.recv().await
        };
        let Some(request) = next else {
            break;
        };

        debug!("[Worker {}] Fetching {}", worker_id, request.source.key());
        // A panicking source still answers, so the mutator's count stays exact.
        let outs = match AssertUnwindSafe(request.source.outs()).catch_unwind().await {
            Ok(outs) => outs,
            Err(_) => {
                error!(
                    "[Worker {}] Source {} panicked, treating it as empty",
                    worker_id,
                    request.source.key()
                );
                Outs::empty()
            }
        };

        let update = GraphUpdate {
            node: request.node,
            outs,
        };
        if updates.send(update).await.is_err() {
            warn!("[Worker {}] Graph mutator gone, dropping result", worker_id);
            break;
        }
    }

    debug!("Worker {} finished", worker_id);
}
