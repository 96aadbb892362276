//! In-memory sources: a fixed universe of keys and the links and assets
//! each one declares. Useful for dry runs and tests.

use crate::source::{Asset, Link, Outs, Source, SourceRef};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Universe {
    links: HashMap<String, Vec<String>>,
    assets: HashMap<String, Vec<String>>,
    delay: Option<Duration>,
}

type FetchCounts = Arc<Mutex<HashMap<String, usize>>>;

/// Which keys link to, and reference assets from, which others.
#[derive(Clone, Default)]
pub struct SiteMap {
    universe: Arc<Universe>,
    fetches: FetchCounts,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn universe_mut(&mut self) -> &mut Universe {
        Arc::make_mut(&mut self.universe)
    }

    /// Declares links from `from`, appended in order.
    pub fn link(mut self, from: &str, to: &[&str]) -> Self {
        self.universe_mut()
            .links
            .entry(from.to_string())
            .or_default()
            .extend(to.iter().map(|s| s.to_string()));
        self
    }

    /// Declares asset references from `from`, appended in order.
    pub fn asset(mut self, from: &str, to: &[&str]) -> Self {
        self.universe_mut()
            .assets
            .entry(from.to_string())
            .or_default()
            .extend(to.iter().map(|s| s.to_string()));
        self
    }

    /// Every fetch sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.universe_mut().delay = Some(delay);
        self
    }

    pub fn source(&self, key: &str) -> SourceRef {
        Arc::new(MemorySource {
            universe: Arc::clone(&self.universe),
            fetches: Arc::clone(&self.fetches),
            key: key.to_string(),
        })
    }

    /// How many times `key` has been fetched.
    pub fn fetches(&self, key: &str) -> usize {
        self.fetches
            .lock()
            .map(|f| f.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches
            .lock()
            .map(|f| f.values().sum())
            .unwrap_or(0)
    }
}

pub struct MemorySource {
    universe: Arc<Universe>,
    fetches: FetchCounts,
    key: String,
}

impl Source for MemorySource {
    fn key(&self) -> &str {
        &self.key
    }

    fn outs(&self) -> BoxFuture<'_, Outs> {
        Box::pin(async move {
            if let Ok(mut fetches) = self.fetches.lock() {
                *fetches.entry(self.key.clone()).or_insert(0) += 1;
            }

            if let Some(delay) = self.universe.delay {
                tokio::time::sleep(delay).await;
            }

            let links = self
                .universe
                .links
                .get(&self.key)
                .into_iter()
                .flatten()
                .map(|key| {
                    let source: SourceRef = Arc::new(MemorySource {
                        universe: Arc::clone(&self.universe),
                        fetches: Arc::clone(&self.fetches),
                        key: key.clone(),
                    });
                    Link::new(key.clone(), source)
                })
                .collect();

            let assets = self
                .universe
                .assets
                .get(&self.key)
                .into_iter()
                .flatten()
                .map(Asset::new)
                .collect();

            Outs { links, assets }
        })
    }
}
