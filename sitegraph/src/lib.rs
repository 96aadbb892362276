// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

pub use handlers::{parse_url_line, report_path, resolve_output_path, run_crawl};

pub use sitegraph_core::crawl::{CrawlOptions, execute_crawl};
pub use sitegraph_core::report::ReportFormat;
