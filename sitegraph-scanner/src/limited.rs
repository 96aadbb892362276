//! Wraps a [`Source`] with limits on traversal depth and on the total number
//! of fetches issued across the whole crawl. Past either limit the source
//! reports no links and no assets.

use crate::source::{Link, Outs, Source, SourceRef};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub struct LimitedSource {
    inner: SourceRef,
    max_total_requests: u64,
    max_depth: u64,
    total_requests: Arc<AtomicU64>,
    depth: u64,
}

impl LimitedSource {
    /// Wraps `inner` as the depth-0 source of a fresh request budget.
    pub fn wrap(inner: SourceRef, max_total_requests: u64, max_depth: u64) -> Self {
        Self {
            inner,
            max_total_requests,
            max_depth,
            total_requests: Arc::new(AtomicU64::new(0)),
            depth: 0,
        }
    }

    fn child(&self, inner: SourceRef) -> Self {
        Self {
            inner,
            max_total_requests: self.max_total_requests,
            max_depth: self.max_depth,
            total_requests: Arc::clone(&self.total_requests),
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// Fetch attempts made so far by any source sharing this budget,
    /// including rejected ones.
    pub fn requests_issued(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }
}

impl Source for LimitedSource {
    fn key(&self) -> &str {
        self.inner.key()
    }

    fn outs(&self) -> BoxFuture<'_, Outs> {
        Box::pin(async move {
            // Counted even when rejected.
            let issued = self.total_requests.fetch_add(1, Ordering::SeqCst) + 1;

            if self.depth > self.max_depth {
                debug!("Depth limit reached at {} (depth {})", self.key(), self.depth);
                return Outs::empty();
            }
            if issued > self.max_total_requests {
                debug!("Request limit reached at {} ({} issued)", self.key(), issued);
                return Outs::empty();
            }

            let outs = self.inner.outs().await;
            let links = outs
                .links
                .into_iter()
                .map(|link| {
                    let source: SourceRef = Arc::new(self.child(link.source));
                    Link::new(link.key, source)
                })
                .collect();

            Outs {
                links,
                assets: outs.assets,
            }
        })
    }
}
