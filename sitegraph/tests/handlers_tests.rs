use sitegraph::handlers::*;
use sitegraph::{CrawlOptions, ReportFormat};
use std::fs;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"),
        )
        .mount(server)
        .await;
}

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com/docs");
    assert_eq!(result, Some("http://example.com/docs".to_string()));
}

#[test]
fn test_parse_url_line_trims_whitespace() {
    let result = parse_url_line("  example.com \n");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    assert_eq!(parse_url_line("not a valid url!!!"), None);
    assert_eq!(parse_url_line("   "), None);
}

#[test]
fn test_resolve_output_path_plain() {
    assert_eq!(
        resolve_output_path("out/site.dot"),
        std::path::PathBuf::from("out/site.dot")
    );
}

#[test]
fn test_resolve_output_path_expands_tilde() {
    let resolved = resolve_output_path("~/site.html");
    assert!(!resolved.to_string_lossy().starts_with('~'));
    assert!(resolved.ends_with("site.html"));
}

#[test]
fn test_report_path_in_directory_uses_format_extension() {
    let temp_dir = TempDir::new().unwrap();

    assert_eq!(
        report_path(temp_dir.path().to_path_buf(), ReportFormat::Dot),
        temp_dir.path().join("sitegraph.dot")
    );
    assert_eq!(
        report_path(temp_dir.path().to_path_buf(), ReportFormat::Html),
        temp_dir.path().join("sitegraph.html")
    );
}

#[test]
fn test_report_path_keeps_file_paths() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("graph.json");

    assert_eq!(report_path(file.clone(), ReportFormat::Text), file);
}

#[tokio::test]
async fn test_run_crawl_writes_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a><script src="/app.js"></script>"#).await;
    mount_page(&server, "/a", r#"<a href="/">Home</a>"#).await;

    let temp_dir = TempDir::new()?;
    let output = temp_dir.path().join("graph.json");

    let mut options = CrawlOptions::new(server.uri());
    options.threads = Some(2);
    run_crawl(options, ReportFormat::Json, Some(output.clone()), true).await?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let links = value["report"]["graph"]["Links"].as_object().unwrap();
    assert_eq!(links.len(), 3);

    let app_js = format!("{}/app.js", server.uri());
    assert_eq!(
        value["report"]["graph"]["NodeMetadata"][app_js.as_str()]["PureAsset"],
        true
    );

    Ok(())
}

#[tokio::test]
async fn test_run_crawl_fails_on_unwritable_output() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>nothing here</p>").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("missing-dir").join("graph.dot");

    let result = run_crawl(
        CrawlOptions::new(server.uri()),
        ReportFormat::Dot,
        Some(output),
        true,
    )
    .await;

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to write report"));
}
