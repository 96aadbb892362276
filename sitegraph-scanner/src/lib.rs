pub mod crawler;
pub mod error;
pub mod graph;
pub mod http;
pub mod limited;
pub mod memory;
pub mod source;

pub use crawler::{AssetsMode, CrawlProgress, Crawler, ProgressCallback, crawl};
pub use error::ScanError;
pub use graph::{Edge, EdgeKind, Graph, Node, NodeId};
pub use http::HttpSource;
pub use limited::LimitedSource;
pub use source::{Asset, ErrorCallback, Link, Outs, Source, SourceRef};
