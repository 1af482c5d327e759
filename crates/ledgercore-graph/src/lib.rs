//! Currency and account graph: price edges with forward-fill, account
//! hierarchy edges, and breadth-first path composition for conversion
//! rates between commodities.
//!
//! Nodes and edges live in index-keyed vectors; edges reference nodes by
//! [`NodeIndex`] handle rather than by owning pointer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// Handle into the graph's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A commodity or currency code (e.g. `USD`, `AAPL`).
    Commodity,
    /// An account name (e.g. `Assets:Cash`).
    Account,
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    kind: NodeKind,
}

/// A directed price observation from one commodity to another.
#[derive(Debug, Clone)]
pub struct PriceEdge {
    /// Date the price was observed.
    pub date: NaiveDate,
    /// Rate: units of `to` per one unit of `from`.
    pub rate: Decimal,
    /// Whether this edge is the synthesized inverse of a declared price.
    pub inferred: bool,
}

#[derive(Debug, Clone, Default)]
struct PriceEdges {
    /// Observations ordered by date, oldest first.
    entries: Vec<PriceEdge>,
}

impl PriceEdges {
    /// The effective edge at date `d`: the latest observation with
    /// `date <= d`, per the forward-fill invariant.
    fn as_of(&self, d: NaiveDate) -> Option<&PriceEdge> {
        self.entries.iter().rev().find(|e| e.date <= d)
    }
}

/// Typed graph of commodity and account nodes connected by price and
/// hierarchy edges.
#[derive(Debug, Default)]
pub struct CurrencyGraph {
    nodes: Vec<Node>,
    by_key: HashMap<String, NodeIndex>,
    /// Price edges keyed by (from, to) node index pair.
    prices: HashMap<(NodeIndex, NodeIndex), PriceEdges>,
    /// Parent -> children hierarchy edges, keyed by parent node index.
    hierarchy: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl CurrencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for `key`, with the given kind. Reuses an
    /// existing node if `key` was already seen, regardless of kind
    /// (account and commodity namespaces never collide in practice).
    pub fn node(&mut self, key: &str, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.by_key.get(key) {
            return idx;
        }
        let idx = NodeIndex(self.nodes.len());
        self.nodes.push(Node {
            key: key.to_string(),
            kind,
        });
        self.by_key.insert(key.to_string(), idx);
        idx
    }

    /// Look up an existing node by key without creating one.
    #[must_use]
    pub fn find_node(&self, key: &str) -> Option<NodeIndex> {
        self.by_key.get(key).copied()
    }

    /// The key (commodity code or account name) a node was created with.
    #[must_use]
    pub fn key(&self, idx: NodeIndex) -> &str {
        &self.nodes[idx.0].key
    }

    /// The kind of a node.
    #[must_use]
    pub fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.nodes[idx.0].kind
    }

    /// Record a declared price `from` -> `to` at `rate` on `date`, and its
    /// implied inverse edge `to` -> `from` at `1/rate` with `inferred = true`.
    pub fn add_price(&mut self, from: &str, to: &str, date: NaiveDate, rate: Decimal) {
        let from_idx = self.node(from, NodeKind::Commodity);
        let to_idx = self.node(to, NodeKind::Commodity);

        self.prices
            .entry((from_idx, to_idx))
            .or_default()
            .entries
            .push(PriceEdge {
                date,
                rate,
                inferred: false,
            });

        if !rate.is_zero() {
            self.prices
                .entry((to_idx, from_idx))
                .or_default()
                .entries
                .push(PriceEdge {
                    date,
                    rate: Decimal::ONE / rate,
                    inferred: true,
                });
        }
    }

    /// Ensure a parent -> child hierarchy edge exists for every
    /// `:`-separated prefix of `account`, creating account nodes as needed.
    pub fn ensure_hierarchy(&mut self, account: &str) {
        let segments: Vec<&str> = account.split(':').collect();
        let mut parent: Option<NodeIndex> = None;
        let mut prefix = String::new();

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                prefix.push(':');
            }
            prefix.push_str(segment);
            let node = self.node(&prefix, NodeKind::Account);

            if let Some(parent_idx) = parent {
                let children = self.hierarchy.entry(parent_idx).or_default();
                if !children.contains(&node) {
                    children.push(node);
                }
            }
            parent = Some(node);
        }
    }

    /// Children of an account node in the hierarchy.
    #[must_use]
    pub fn children(&self, account: NodeIndex) -> &[NodeIndex] {
        self.hierarchy.get(&account).map_or(&[], Vec::as_slice)
    }

    /// Build a temporal snapshot of price edges as of `date`: for each
    /// ordered pair with at least one observation dated `<= date`, the
    /// single effective edge (forward-fill).
    fn snapshot(&self, date: NaiveDate) -> HashMap<(NodeIndex, NodeIndex), PriceEdge> {
        let mut snap = HashMap::new();
        for (&pair, edges) in &self.prices {
            if let Some(edge) = edges.as_of(date) {
                snap.insert(pair, edge.clone());
            }
        }
        snap
    }

    /// Resolve the conversion rate from `from` to `to` at `date`: 1 if
    /// equal, otherwise the product of rates along the shortest path in
    /// the temporal snapshot, preferring (on ties in length) the path
    /// whose earliest edge carries the most recent date.
    #[must_use]
    pub fn get_price(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        let from_idx = self.find_node(from)?;
        let to_idx = self.find_node(to)?;
        let snapshot = self.snapshot(date);

        let path = self.shortest_path(from_idx, to_idx, &snapshot)?;
        let mut rate = Decimal::ONE;
        for pair in path.windows(2) {
            let edge = snapshot.get(&(pair[0], pair[1]))?;
            rate *= edge.rate;
        }
        Some(rate)
    }

    /// Breadth-first search over the snapshot from `start` to `goal`,
    /// returning the node sequence of the chosen path. Among paths of
    /// equal (minimal) length, prefers the one whose earliest edge has
    /// the latest date.
    fn shortest_path(
        &self,
        start: NodeIndex,
        goal: NodeIndex,
        snapshot: &HashMap<(NodeIndex, NodeIndex), PriceEdge>,
    ) -> Option<Vec<NodeIndex>> {
        let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for &(a, b) in snapshot.keys() {
            adjacency.entry(a).or_default().push(b);
        }

        let mut best: Option<(usize, NaiveDate, Vec<NodeIndex>)> = None;
        let mut visited_depth: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue: VecDeque<Vec<NodeIndex>> = VecDeque::new();
        queue.push_back(vec![start]);
        visited_depth.insert(start, 0);

        while let Some(path) = queue.pop_front() {
            let depth = path.len() - 1;
            if let Some((best_len, _, _)) = &best {
                if depth > *best_len {
                    break;
                }
            }
            let &last = path.last().unwrap();

            if last == goal && path.len() > 1 {
                let earliest_date = snapshot[&(path[0], path[1])].date;
                match &best {
                    None => best = Some((depth, earliest_date, path.clone())),
                    Some((_, best_date, _)) if earliest_date > *best_date => {
                        best = Some((depth, earliest_date, path.clone()));
                    }
                    _ => {}
                }
                continue;
            }

            for &next in adjacency.get(&last).into_iter().flatten() {
                if path.contains(&next) {
                    continue;
                }
                let next_depth = depth + 1;
                if let Some(&seen) = visited_depth.get(&next) {
                    if seen < next_depth {
                        continue;
                    }
                }
                visited_depth.insert(next, next_depth);
                let mut extended = path.clone();
                extended.push(next);
                queue.push_back(extended);
            }
        }

        best.map(|(_, _, path)| path)
    }
}
