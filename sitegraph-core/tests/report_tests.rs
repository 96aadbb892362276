// Tests for report generation functionality

use sitegraph_core::report::{
    ReportFormat, display_key, generate_dot_report, generate_html_report, generate_json_report,
    generate_text_report, graph_to_json, render, save_report, strip_prefix, summarize,
};
use sitegraph_scanner::memory::SiteMap;
use sitegraph_scanner::{AssetsMode, EdgeKind, Graph, crawl};
use std::fs;
use tempfile::TempDir;

const ROOT: &str = "http://example.com/";

/// Root links to /b and /c, both link to /d, /c links back to the root,
/// /d pulls in a stylesheet and links to itself.
fn sample_graph() -> Graph {
    let mut graph = Graph::new(ROOT);
    let root = graph.root();
    let (b, _) = graph.add_reference(root, "http://example.com/b", EdgeKind::Link);
    let (c, _) = graph.add_reference(root, "http://example.com/c", EdgeKind::Link);
    let (d, _) = graph.add_reference(b, "http://example.com/d", EdgeKind::Link);
    graph.add_reference(c, "http://example.com/d", EdgeKind::Link);
    graph.add_reference(c, ROOT, EdgeKind::Link);
    graph.add_reference(d, "http://example.com/style.css", EdgeKind::Asset);
    graph.add_reference(d, "http://example.com/d", EdgeKind::Link);
    graph
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("dot"), Some(ReportFormat::Dot));
    assert_eq!(ReportFormat::from_str("graphviz"), Some(ReportFormat::Dot));
    assert_eq!(ReportFormat::from_str("html"), Some(ReportFormat::Html));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("Html"), Some(ReportFormat::Html));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert_eq!(ReportFormat::from_str("csv"), None);
    assert_eq!(ReportFormat::from_str(""), None);
}

#[test]
fn test_report_format_extension() {
    assert_eq!(ReportFormat::Text.extension(), "txt");
    assert_eq!(ReportFormat::Dot.extension(), "dot");
}

// ============================================================================
// Graph Export Tests
// ============================================================================

#[test]
fn test_graph_to_json_omits_self_edges() {
    let json = graph_to_json(&sample_graph());

    assert_eq!(json.links.len(), 5);
    let d_links = &json.links["http://example.com/d"];
    assert_eq!(d_links.len(), 1);
    assert!(d_links[0].is_asset);
    assert_eq!(d_links[0].to_url, "http://example.com/style.css");
    assert!(json.links["http://example.com/style.css"].is_empty());
}

#[test]
fn test_graph_to_json_metadata() {
    let json = graph_to_json(&sample_graph());

    let root = json.node_metadata[ROOT];
    assert_eq!(root.depth, 0);
    assert_eq!(root.popularity, 1);
    assert!(!root.pure_asset);

    let d = json.node_metadata["http://example.com/d"];
    assert_eq!(d.depth, 2);
    assert_eq!(d.popularity, 3);
    assert!(!d.pure_asset);

    let css = json.node_metadata["http://example.com/style.css"];
    assert_eq!(css.depth, 3);
    assert!(css.pure_asset);
}

#[test]
fn test_graph_json_field_names() {
    let value = serde_json::to_value(graph_to_json(&sample_graph())).unwrap();

    assert!(value.get("Links").is_some());
    let css = &value["NodeMetadata"]["http://example.com/style.css"];
    assert_eq!(css["Depth"], 3);
    assert_eq!(css["Popularity"], 1);
    assert_eq!(css["PureAsset"], true);
    assert_eq!(value["Links"][ROOT][0]["IsAsset"], false);
    assert!(value["Links"][ROOT][0]["ToUrl"].is_string());
}

#[tokio::test]
async fn test_graph_to_json_from_crawl() {
    let site = SiteMap::new()
        .link("A", &["B", "C"])
        .link("B", &["D"])
        .link("C", &["D", "A"])
        .link("D", &["D"]);

    let graph = crawl(site.source("A"), AssetsMode::IncludeAssets)
        .await
        .unwrap();
    let json = graph_to_json(&graph);

    let targets: Vec<&str> = json.links["C"].iter().map(|l| l.to_url.as_str()).collect();
    assert_eq!(targets, vec!["A", "D"]);
    assert!(json.links["D"].is_empty());
    assert_eq!(json.node_metadata["D"].popularity, 3);
}

#[test]
fn test_summarize() {
    let summary = summarize(&sample_graph());

    assert_eq!(summary.total_nodes, 5);
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.pure_assets, 1);
    assert_eq!(summary.link_edges, 6);
    assert_eq!(summary.asset_edges, 1);
    assert_eq!(summary.max_depth, 3);
}

// ============================================================================
// Display Key Tests
// ============================================================================

#[test]
fn test_strip_prefix() {
    assert_eq!(strip_prefix(&sample_graph()), ROOT);
    assert_eq!(strip_prefix(&Graph::new("A")), "");
}

#[test]
fn test_strip_prefix_keeps_port() {
    let graph = Graph::new("http://localhost:8080/");
    let prefix = strip_prefix(&graph);

    assert_eq!(prefix, "http://localhost:8080/");
    assert_eq!(display_key(&prefix, "http://localhost:8080/docs"), "/docs");
    assert_eq!(
        display_key(&prefix, "http://localhost:9090/docs"),
        "http://localhost:9090/docs"
    );
}

#[test]
fn test_display_key() {
    assert_eq!(display_key(ROOT, "http://example.com/docs/a"), "/docs/a");
    assert_eq!(display_key(ROOT, ROOT), ROOT);
    assert_eq!(display_key(ROOT, "http://other.com/x"), "http://other.com/x");
    assert_eq!(display_key("", "A"), "A");
}

// ============================================================================
// Report Rendering Tests
// ============================================================================

#[test]
fn test_generate_text_report() {
    let report = generate_text_report(&sample_graph());

    assert!(report.contains("SITEGRAPH CRAWL REPORT"));
    assert!(report.contains("Root:         http://example.com/"));
    assert!(report.contains("/style.css [asset]"));
    assert!(report.contains("/d  (depth 2, popularity 3)"));
}

#[test]
fn test_generate_json_report() {
    let report = generate_json_report(&sample_graph()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Sitegraph");
    assert_eq!(value["report"]["root"], ROOT);
    assert_eq!(value["report"]["summary"]["total_nodes"], 5);
    assert_eq!(
        value["report"]["graph"]["Links"].as_object().unwrap().len(),
        5
    );
}

#[test]
fn test_generate_dot_report() {
    let dot = generate_dot_report(&sample_graph());

    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("label = \"/b\""));
    assert!(dot.contains("color = \"red\""));
    assert!(dot.contains("style = \"dashed\""));
    assert_eq!(dot.matches("->").count(), 7);
}

#[test]
fn test_generate_html_report() {
    let html = generate_html_report(&sample_graph()).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("const STRIP_PREFIX = \"http://example.com/\";"));
    assert!(html.contains("const GRAPH = {"));
    assert!(html.contains("const NODE_METADATA = {"));
    assert!(html.contains("\"PureAsset\":true"));
    assert!(html.contains("cytoscape"));
}

#[test]
fn test_render_dispatches_on_format() {
    let graph = sample_graph();
    assert!(render(&graph, ReportFormat::Dot).unwrap().starts_with("digraph"));
    assert!(render(&graph, ReportFormat::Html).unwrap().starts_with("<!DOCTYPE html>"));
    assert!(render(&graph, ReportFormat::Json).unwrap().starts_with('{'));
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.dot");
    let content = generate_dot_report(&sample_graph());

    save_report(&content, &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}
