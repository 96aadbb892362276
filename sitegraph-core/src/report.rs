// Report generation from a crawled graph

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use sitegraph_scanner::{EdgeKind, Graph, NodeId};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const CYTOSCAPE_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/cytoscape/3.30.2/cytoscape.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Dot,
    Html,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "dot" | "graphviz" => Some(ReportFormat::Dot),
            "html" => Some(ReportFormat::Html),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Dot => "dot",
            ReportFormat::Html => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkData {
    pub is_asset: bool,
    pub to_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeMetadata {
    pub depth: usize,
    pub popularity: usize,
    pub pure_asset: bool,
}

/// Adjacency and per-node metadata keyed by node key. Self-edges are
/// omitted from `links`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphJson {
    pub links: BTreeMap<String, Vec<LinkData>>,
    pub node_metadata: BTreeMap<String, NodeMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphSummary {
    pub total_nodes: usize,
    pub pages: usize,
    pub pure_assets: usize,
    pub link_edges: usize,
    pub asset_edges: usize,
    pub max_depth: usize,
}

pub fn graph_to_json(graph: &Graph) -> GraphJson {
    let mut json = GraphJson::default();

    graph.traverse(graph.root(), |id, node| {
        let links = node
            .outgoing()
            .iter()
            .filter(|edge| edge.target != id)
            .map(|edge| LinkData {
                is_asset: edge.kind == EdgeKind::Asset,
                to_url: graph.node(edge.target).key().to_string(),
            })
            .collect();
        json.links.insert(node.key().to_string(), links);
        json.node_metadata.insert(
            node.key().to_string(),
            NodeMetadata {
                depth: node.depth(),
                popularity: node.popularity(),
                pure_asset: node.is_pure_asset(),
            },
        );
    });

    json
}

pub fn summarize(graph: &Graph) -> GraphSummary {
    let mut summary = GraphSummary::default();

    graph.traverse(graph.root(), |_, node| {
        summary.total_nodes += 1;
        if node.is_pure_asset() {
            summary.pure_assets += 1;
        } else {
            summary.pages += 1;
        }
        for edge in node.outgoing() {
            match edge.kind {
                EdgeKind::Link => summary.link_edges += 1,
                EdgeKind::Asset => summary.asset_edges += 1,
            }
        }
        summary.max_depth = summary.max_depth.max(node.depth());
    });

    summary
}

/// `scheme://host[:port]/` of the root key, used to shorten keys for
/// display. Empty when the root key is not a URL.
pub fn strip_prefix(graph: &Graph) -> String {
    let Ok(url) = Url::parse(graph.node(graph.root()).key()) else {
        return String::new();
    };
    let Some(host) = url.host_str() else {
        return String::new();
    };
    match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    }
}

/// Shortens `key` to a root-relative path when it starts with `prefix`.
pub fn display_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() || key == prefix {
        return key.to_string();
    }
    match key.strip_prefix(prefix) {
        Some(rest) if !rest.starts_with('/') => format!("/{}", rest),
        Some(rest) => rest.to_string(),
        None => key.to_string(),
    }
}

pub fn generate_text_report(graph: &Graph) -> String {
    let summary = summarize(graph);
    let prefix = strip_prefix(graph);
    let root_key = graph.node(graph.root()).key();
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                           SITEGRAPH CRAWL REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Root:         {}\n", root_key));
    report.push_str(&format!("Generated:    {}\n", chrono::Utc::now().to_rfc3339()));
    report.push_str(&format!("Nodes:        {}\n", summary.total_nodes));
    report.push_str(&format!("  Pages:      {}\n", summary.pages));
    report.push_str(&format!("  Assets:     {}\n", summary.pure_assets));
    report.push_str(&format!("Link edges:   {}\n", summary.link_edges));
    report.push_str(&format!("Asset edges:  {}\n", summary.asset_edges));
    report.push_str(&format!("Max depth:    {}\n\n", summary.max_depth));

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("NODES\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    graph.traverse(graph.root(), |_, node| {
        let tag = if node.is_pure_asset() { " [asset]" } else { "" };
        report.push_str(&format!(
            "{}{}  (depth {}, popularity {})\n",
            display_key(&prefix, node.key()),
            tag,
            node.depth(),
            node.popularity()
        ));

        let edges = node.outgoing();
        for (i, edge) in edges.iter().enumerate() {
            let branch = if i == edges.len() - 1 { "└──" } else { "├──" };
            let marker = match edge.kind {
                EdgeKind::Link => "→",
                EdgeKind::Asset => "◦",
            };
            report.push_str(&format!(
                "  {} {} {}\n",
                branch,
                marker,
                display_key(&prefix, graph.node(edge.target).key())
            ));
        }
    });

    report.push_str("\nGenerated by Sitegraph\n");
    report
}

pub fn generate_json_report(graph: &Graph) -> Result<String, serde_json::Error> {
    let summary = summarize(graph);
    let graph_json = graph_to_json(graph);

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sitegraph",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "root": graph.node(graph.root()).key(),
            "summary": summary,
            "graph": graph_json
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Graphviz rendering: the root in red, pure assets grey, asset edges
/// dashed.
pub fn generate_dot_report(graph: &Graph) -> String {
    let prefix = strip_prefix(graph);
    let mut dot_graph: DiGraph<String, EdgeKind> = DiGraph::new();
    let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut metadata: HashMap<NodeIndex, (usize, bool)> = HashMap::new();

    let order = graph.traversal_order(graph.root());
    for &id in &order {
        let node = graph.node(id);
        let index = dot_graph.add_node(display_key(&prefix, node.key()));
        indices.insert(id, index);
        metadata.insert(index, (node.depth(), node.is_pure_asset()));
    }
    for &id in &order {
        for edge in graph.node(id).outgoing() {
            dot_graph.add_edge(indices[&id], indices[&edge.target], edge.kind);
        }
    }

    // `Dot` borrows the getter closures, so it is rendered in this statement.
    format!(
        "{:?}",
        Dot::with_attr_getters(
            &dot_graph,
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, edge| match edge.weight() {
                EdgeKind::Link => "color = \"blue\"".to_string(),
                EdgeKind::Asset => "color = \"grey\", style = \"dashed\"".to_string(),
            },
            &|_, (index, label)| {
                let (depth, pure_asset) = metadata.get(&index).copied().unwrap_or((0, false));
                let color = if depth == 0 {
                    "red"
                } else if pure_asset {
                    "grey"
                } else {
                    "blue"
                };
                format!(
                    "label = \"{}\", color = \"{}\"",
                    label.replace('\\', "\\\\").replace('"', "\\\""),
                    color
                )
            },
        )
    )
}

/// Self-contained page that draws the graph with cytoscape.js.
pub fn generate_html_report(graph: &Graph) -> Result<String, serde_json::Error> {
    let graph_json = graph_to_json(graph);
    let strip_prefix_json = serde_json::to_string(&strip_prefix(graph))?;
    let links_json = serde_json::to_string(&graph_json.links)?;
    let metadata_json = serde_json::to_string(&graph_json.node_metadata)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Sitegraph</title>
  <style>
    body {{ width: 100vw; height: 100vh; margin: 0; }}
  </style>
  <script src="{cdn}"></script>
  <script>
    const STRIP_PREFIX = {prefix};
    const GRAPH = {links};
    const NODE_METADATA = {metadata};
  </script>
  <script>
{script}
  </script>
</head>
<body>
</body>
</html>
"#,
        cdn = CYTOSCAPE_CDN,
        prefix = strip_prefix_json,
        links = links_json,
        metadata = metadata_json,
        script = RENDER_SCRIPT,
    ))
}

pub fn render(graph: &Graph, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(graph)),
        ReportFormat::Json => generate_json_report(graph),
        ReportFormat::Dot => Ok(generate_dot_report(graph)),
        ReportFormat::Html => generate_html_report(graph),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Lays nodes out in columns by depth and rows by out-degree, then popularity.
const RENDER_SCRIPT: &str = r#"
    const COL_WIDTH = 5;

    function displayKey(prefix, key) {
      if (!prefix || key === prefix) return key;
      if (key.indexOf(prefix) === 0) {
        const rest = key.substr(prefix.length);
        return rest.charAt(0) === '/' ? rest : '/' + rest;
      }
      return key;
    }

    function nodeColor(md, root) {
      if (md.Depth === 0) return root;
      return md.PureAsset ? 'grey' : 'blue';
    }

    function nodeRows() {
      const keys = Object.keys(GRAPH);
      keys.sort((a, b) => {
        const byDegree = GRAPH[b].length - GRAPH[a].length;
        if (byDegree !== 0) return byDegree;
        const byPopularity = NODE_METADATA[b].Popularity - NODE_METADATA[a].Popularity;
        if (byPopularity !== 0) return byPopularity;
        return a.localeCompare(b);
      });
      const rows = {};
      keys.forEach((key, i) => { rows[key] = i; });
      return rows;
    }

    function renderGraph() {
      const rows = nodeRows();
      const elements = [];
      Object.keys(GRAPH).forEach((key, i) => {
        const md = NODE_METADATA[key];
        elements.push({ data: {
          id: key,
          label: displayKey(STRIP_PREFIX, key),
          row: rows[key],
          col: md.Depth === 0 ? COL_WIDTH - 1 : md.Depth * COL_WIDTH + (i % COL_WIDTH),
          color: nodeColor(md, 'red'),
          labelColor: md.Depth === 0 ? 'red' : (md.PureAsset ? 'darkgrey' : 'darkblue'),
        }});
        for (const link of GRAPH[key]) {
          elements.push({ data: {
            source: key,
            target: link.ToUrl,
            color: link.IsAsset ? 'grey' : 'blue',
          }});
        }
      });

      cytoscape({
        container: document.body,
        elements: elements,
        layout: {
          name: 'grid',
          position: (node) => ({ row: node.data('row'), col: node.data('col') }),
        },
        style: [
          { selector: 'node', style: {
            label: 'data(label)',
            color: 'data(labelColor)',
            'font-size': '50pt',
            'background-color': 'data(color)',
          }},
          { selector: 'edge', style: {
            width: 2,
            'curve-style': 'bezier',
            'target-arrow-shape': 'triangle',
            'line-color': 'data(color)',
            'target-arrow-color': 'data(color)',
            'arrow-scale': 3,
          }},
        ],
      });
    }

    window.addEventListener('load', renderGraph);
"#;
