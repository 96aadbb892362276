//! The capability the crawler consumes: something with a key that can be
//! asked, possibly slowly, what it points at.

use crate::error::ScanError;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Callback through which sources report fetch failures.
///
/// Receives the key of the failing source and the error. A failed fetch is
/// otherwise indistinguishable from one that found no references.
pub type ErrorCallback = Arc<dyn Fn(&str, &ScanError) + Send + Sync>;

pub type SourceRef = Arc<dyn Source>;

/// A loadable resource that references assets and links to further resources.
///
/// `outs` may be called concurrently for different sources and may take an
/// arbitrarily long time to resolve. Implementations doing thread-blocking
/// work should move it onto `tokio::task::spawn_blocking`.
pub trait Source: Send + Sync {
    fn key(&self) -> &str;

    fn outs(&self) -> BoxFuture<'_, Outs>;
}

/// A reference to another crawlable resource.
#[derive(Clone)]
pub struct Link {
    pub key: String,
    pub source: SourceRef,
}

impl Link {
    pub fn new(key: impl Into<String>, source: SourceRef) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("key", &self.key).finish()
    }
}

/// A reference to a leaf resource. Never fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub key: String,
}

impl Asset {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Everything one fetch of a source declared, in document order.
#[derive(Debug, Clone, Default)]
pub struct Outs {
    pub links: Vec<Link>,
    pub assets: Vec<Asset>,
}

impl Outs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.assets.is_empty()
    }
}
