//! Crawl graph: one node per distinct key, directed edges tagged link or
//! asset.
//!
//! Nodes live in an arena owned by [`Graph`]; edges refer to their targets
//! by [`NodeId`], so cycles (including self-edges) need no shared ownership.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Assets order before links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Asset,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub target: NodeId,
}

#[derive(Debug, Clone)]
pub struct Node {
    key: String,
    outgoing: Vec<Edge>,
    depth: usize,
    popularity: usize,
    pure_asset: bool,
}

impl Node {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn outgoing(&self) -> &[Edge] {
        &self.outgoing
    }

    /// Distance from the root along the path that first discovered this node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// How many references to this node were seen.
    pub fn popularity(&self) -> usize {
        self.popularity
    }

    /// True if nothing ever linked here; only asset references did.
    pub fn is_pure_asset(&self) -> bool {
        self.pure_asset
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    root: NodeId,
}

impl Graph {
    pub fn new(root_key: impl Into<String>) -> Self {
        let key = root_key.into();
        let root = NodeId(0);
        let mut index = HashMap::new();
        index.insert(key.clone(), root);

        Self {
            nodes: vec![Node {
                key,
                outgoing: Vec::new(),
                depth: 0,
                popularity: 0,
                pure_asset: false,
            }],
            index,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Records that `from` references `key`.
    ///
    /// Reuses the node for `key` (bumping its popularity) or creates it one
    /// level below `from`, then appends an edge of `kind`. A link reference
    /// permanently clears the target's pure-asset flag. Returns the target
    /// and whether it was created by this call.
    pub fn add_reference(&mut self, from: NodeId, key: &str, kind: EdgeKind) -> (NodeId, bool) {
        let (target, created) = match self.index.get(key) {
            Some(&id) => {
                self.nodes[id.0].popularity += 1;
                (id, false)
            }
            None => {
                let id = NodeId(self.nodes.len());
                let depth = self.nodes[from.0].depth + 1;
                self.nodes.push(Node {
                    key: key.to_string(),
                    outgoing: Vec::new(),
                    depth,
                    popularity: 1,
                    pure_asset: true,
                });
                self.index.insert(key.to_string(), id);
                (id, true)
            }
        };

        self.nodes[from.0].outgoing.push(Edge { kind, target });
        if kind == EdgeKind::Link {
            self.nodes[target.0].pure_asset = false;
        }

        (target, created)
    }

    /// Visits every node reachable from `start` exactly once.
    ///
    /// Reverse pre-order: a node is marked and visited, its unvisited targets
    /// are pushed in edge order, and the most recently pushed is expanded
    /// next.
    pub fn traverse<F>(&self, start: NodeId, mut visit: F)
    where
        F: FnMut(NodeId, &Node),
    {
        let mut stack = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start;

        loop {
            if visited.insert(current) {
                let node = &self.nodes[current.0];
                visit(current, node);

                for edge in &node.outgoing {
                    if !visited.contains(&edge.target) {
                        stack.push(edge.target);
                    }
                }
            }

            match stack.pop() {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    pub fn traversal_order(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.traverse(start, |id, _| order.push(id));
        order
    }

    /// Puts every reachable node's edges in canonical order: assets before
    /// links, then ascending target key.
    pub fn sort_edges(&mut self) {
        for id in self.traversal_order(self.root) {
            let mut edges = std::mem::take(&mut self.nodes[id.0].outgoing);
            edges.sort_by(|a, b| {
                a.kind
                    .cmp(&b.kind)
                    .then_with(|| self.nodes[a.target.0].key.cmp(&self.nodes[b.target.0].key))
            });
            self.nodes[id.0].outgoing = edges;
        }
    }

    /// Keys of `id`'s targets in current edge order.
    pub fn target_keys(&self, id: NodeId) -> Vec<&str> {
        self.nodes[id.0]
            .outgoing
            .iter()
            .map(|e| self.nodes[e.target.0].key.as_str())
            .collect()
    }
}
