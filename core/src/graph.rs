//! Relationship graph built from a record table.
//!
//! One node per distinct id seen in the source/target columns, one edge
//! per row. The graph is stored as a petgraph `DiGraph`; an undirected
//! graph keeps the same storage but treats (a, b) and (b, a) as one pair
//! and always counts total degree.

use crate::{
    entity::{Entity, EntityIndex},
    error::{GraphError, GraphResult},
    layout::{Layout, Position},
    table::{Cell, RecordTable},
    types::{ColumnName, EntityId},
};
use petgraph::{
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Attribute bundle carried by one edge: column name → row value.
pub type EdgeAttrs = BTreeMap<ColumnName, Cell>;

/// What to do when a (source, target) pair appears on more than one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEdges {
    /// Keep one edge per pair; the last row's attributes win.
    #[default]
    Overwrite,
    /// Keep one edge per row.
    Parallel,
}

/// What to do with a node whose id has no entity row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    KeepRawId,
    DropUnresolved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeMode {
    #[default]
    Out,
    In,
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: EntityId,
    pub entity: Option<Entity>,
    pub position: Option<Position>,
}

impl Node {
    fn new(id: EntityId) -> Self {
        Self { id, entity: None, position: None }
    }

    /// Resolved name, or the raw id.
    pub fn label(&self) -> &str {
        self.entity.as_ref().map(|e| e.name.as_str()).unwrap_or(&self.id)
    }
}

/// Borrowed view of one edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub source: &'a Node,
    pub target: &'a Node,
    pub attrs: &'a EdgeAttrs,
}

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    pub source: ColumnName,
    pub target: ColumnName,
    pub attributes: Vec<ColumnName>,
    pub directed: bool,
    pub duplicates: DuplicateEdges,
}

impl GraphBuilder {
    pub fn new(source: impl Into<ColumnName>, target: impl Into<ColumnName>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            attributes: Vec::new(),
            directed: true,
            duplicates: DuplicateEdges::Overwrite,
        }
    }

    pub fn attributes<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        self.attributes = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn duplicates(mut self, duplicates: DuplicateEdges) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Single pass over the rows: add unseen endpoints, then insert or
    /// overwrite the edge with the row's attribute bundle.
    pub fn build(&self, table: &RecordTable) -> GraphResult<DealGraph> {
        table.column_index(&self.source)?;
        table.column_index(&self.target)?;
        for column in &self.attributes {
            table.column_index(column)?;
        }

        let mut graph = DealGraph::new(self.directed);
        let mut skipped = 0usize;
        for row in table.rows() {
            let (Some(source), Some(target)) = (row.key(&self.source), row.key(&self.target)) else {
                skipped += 1;
                continue;
            };
            let attrs: EdgeAttrs = self
                .attributes
                .iter()
                .map(|c| (c.clone(), row.cell(c).cloned().unwrap_or_default()))
                .collect();
            graph.insert_edge(source, target, attrs, self.duplicates);
        }
        if skipped > 0 {
            log::warn!("{}: skipped {skipped} rows with a missing endpoint id", table.name());
        }
        log::info!(
            "built {} graph: {} nodes, {} edges from {} rows",
            if self.directed { "directed" } else { "undirected" },
            graph.node_count(),
            graph.edge_count(),
            table.len()
        );
        Ok(graph)
    }
}

#[derive(Debug, Clone)]
pub struct DealGraph {
    graph: DiGraph<Node, EdgeAttrs>,
    index: HashMap<EntityId, NodeIndex>,
    /// Latest edge per pair; the key is unordered for undirected graphs.
    pairs: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
    directed: bool,
}

impl DealGraph {
    pub fn new(directed: bool) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            pairs: HashMap::new(),
            directed,
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_indices().map(move |ix| &self.graph[ix])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.graph.edge_references().map(move |e| EdgeView {
            source: &self.graph[e.source()],
            target: &self.graph[e.target()],
            attrs: e.weight(),
        })
    }

    /// Attributes of the latest edge between `a` and `b`.
    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeAttrs> {
        let (&a, &b) = (self.index.get(a)?, self.index.get(b)?);
        self.pairs.get(&self.pair_key(a, b)).map(|&e| &self.graph[e])
    }

    /// Count of incident edges. Undirected graphs ignore `mode` and count
    /// every incident edge; a self-loop counts twice.
    pub fn degree(&self, id: &str, mode: DegreeMode) -> Option<usize> {
        let ix = *self.index.get(id)?;
        let out = || self.graph.edges_directed(ix, Direction::Outgoing).count();
        let inc = || self.graph.edges_directed(ix, Direction::Incoming).count();
        Some(match (self.directed, mode) {
            (true, DegreeMode::Out) => out(),
            (true, DegreeMode::In) => inc(),
            _ => out() + inc(),
        })
    }

    pub fn insert_edge(
        &mut self,
        source: EntityId,
        target: EntityId,
        attrs: EdgeAttrs,
        duplicates: DuplicateEdges,
    ) {
        let s = self.ensure_node(source);
        let t = self.ensure_node(target);
        let key = self.pair_key(s, t);
        let existing = self.pairs.get(&key).copied();
        match (duplicates, existing) {
            (DuplicateEdges::Overwrite, Some(e)) => {
                self.graph[e] = attrs;
            }
            _ => {
                let e = self.graph.add_edge(s, t, attrs);
                self.pairs.insert(key, e);
            }
        }
    }

    /// Attach entity records to nodes. Under `DropUnresolved`, nodes with
    /// no entity row are removed together with their edges.
    /// Returns the number of nodes that resolved.
    pub fn resolve(&mut self, entities: &EntityIndex, resolution: Resolution) -> usize {
        for node in self.graph.node_weights_mut() {
            node.entity = entities.get(&node.id).cloned();
        }
        let resolved = self
            .graph
            .node_indices()
            .filter(|&ix| self.graph[ix].entity.is_some())
            .count();
        let unresolved = self.node_count() - resolved;

        if resolution == Resolution::DropUnresolved && unresolved > 0 {
            let before_edges = self.edge_count();
            let kept = self.graph.filter_map(
                |_, n| n.entity.is_some().then(|| n.clone()),
                |_, attrs| Some(attrs.clone()),
            );
            self.rebuild_from(kept);
            log::info!(
                "dropped {unresolved} unresolved nodes and {} edges",
                before_edges - self.edge_count()
            );
        } else if unresolved > 0 {
            log::debug!("{unresolved} nodes kept with raw ids");
        }
        resolved
    }

    /// Store layout positions on the nodes.
    pub fn apply_layout(&mut self, layout: &Layout) {
        for node in self.graph.node_weights_mut() {
            node.position = layout.position(&node.id);
        }
    }

    pub fn position(&self, id: &str) -> GraphResult<Position> {
        self.node(id)
            .and_then(|n| n.position)
            .ok_or_else(|| GraphError::MissingPosition { id: id.to_string() })
    }

    /// Adjacency as (source index, target index) pairs in node order,
    /// for the layout engine.
    pub(crate) fn index_pairs(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    fn ensure_node(&mut self, id: EntityId) -> NodeIndex {
        if let Some(&ix) = self.index.get(&id) {
            return ix;
        }
        let ix = self.graph.add_node(Node::new(id.clone()));
        self.index.insert(id, ix);
        ix
    }

    fn pair_key(&self, a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
        if self.directed || a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn rebuild_from(&mut self, graph: DiGraph<Node, EdgeAttrs>) {
        self.index = graph
            .node_indices()
            .map(|ix| (graph[ix].id.clone(), ix))
            .collect();
        self.pairs.clear();
        for e in graph.edge_references() {
            let key = self.pair_key(e.source(), e.target());
            self.pairs.insert(key, e.id());
        }
        self.graph = graph;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(amount: f64) -> EdgeAttrs {
        [("price_amount".to_string(), Cell::parse(&amount.to_string()))].into()
    }

    #[test]
    fn duplicate_pairs_overwrite_by_default() {
        let mut g = DealGraph::new(true);
        g.insert_edge("A".into(), "B".into(), attrs(1.0), DuplicateEdges::Overwrite);
        g.insert_edge("A".into(), "B".into(), attrs(2.0), DuplicateEdges::Overwrite);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge("A", "B"), Some(&attrs(2.0)));
        assert_eq!(g.edge("B", "A"), None);
    }

    #[test]
    fn parallel_mode_keeps_every_row() {
        let mut g = DealGraph::new(true);
        g.insert_edge("A".into(), "B".into(), attrs(1.0), DuplicateEdges::Parallel);
        g.insert_edge("A".into(), "B".into(), attrs(2.0), DuplicateEdges::Parallel);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge("A", "B"), Some(&attrs(2.0)));
        assert_eq!(g.degree("A", DegreeMode::Out), Some(2));
    }

    #[test]
    fn undirected_pairs_ignore_orientation() {
        let mut g = DealGraph::new(false);
        g.insert_edge("A".into(), "B".into(), attrs(1.0), DuplicateEdges::Overwrite);
        g.insert_edge("B".into(), "A".into(), attrs(3.0), DuplicateEdges::Overwrite);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge("A", "B"), Some(&attrs(3.0)));
        assert_eq!(g.degree("B", DegreeMode::Out), Some(1));
    }

    #[test]
    fn self_loop_counts_twice_in_total_degree() {
        let mut g = DealGraph::new(false);
        g.insert_edge("A".into(), "A".into(), attrs(1.0), DuplicateEdges::Overwrite);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.degree("A", DegreeMode::Total), Some(2));
    }

    #[test]
    fn unknown_node_has_no_degree() {
        let g = DealGraph::new(true);
        assert_eq!(g.degree("Z", DegreeMode::Total), None);
        assert!(matches!(g.position("Z"), Err(GraphError::MissingPosition { .. })));
    }
}
