pub mod crawl;
pub mod report;

pub use crawl::{CrawlOptions, crawl_source, execute_crawl};
pub use report::{GraphJson, ReportFormat, graph_to_json, render, save_report};
