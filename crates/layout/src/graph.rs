//! Graph model consumed by the layout engine.
//!
//! Nodes and edges are validated when they enter a [`Graph`]; anything that
//! would make the model ambiguous (self-loops, duplicate ids, duplicate
//! edges, dangling endpoints) is rejected with a [`GraphError`] instead of
//! being dropped or merged.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::{Canvas, NodeId, Vector2};

/// Padding between a label and the node outline.
pub const NODE_PADDING: f64 = 30.0;
/// Estimated advance of one label character at the default font size.
pub const CHAR_WIDTH: f64 = 18.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node {0} cannot have an edge to itself")]
    SelfLoop(NodeId),
    #[error("node id {0} is used more than once")]
    DuplicateNode(NodeId),
    #[error("edge {0} is defined more than once")]
    DuplicateEdge(Edge),
    #[error("node id {0} is negative")]
    NegativeNodeId(i64),
    #[error("node id {0} is out of range")]
    NodeIdOutOfRange(i64),
    #[error("edge references undefined node {0}")]
    UndefinedNode(NodeId),
    #[error("node {id} has invalid radius {radius}")]
    InvalidRadius { id: NodeId, radius: f64 },
    #[error("snapshot holds {found} positions but the graph has {expected} nodes")]
    SnapshotLength { expected: usize, found: usize },
}

/// Convert a loader-supplied id, rejecting negative and oversized values.
pub fn node_id(value: i64) -> Result<NodeId, GraphError> {
    if value < 0 {
        return Err(GraphError::NegativeNodeId(value));
    }
    NodeId::try_from(value).map_err(|_| GraphError::NodeIdOutOfRange(value))
}

/// Estimate a node radius that fits `label` with padding.
pub fn estimate_radius(label: &str) -> f64 {
    label.chars().count() as f64 * CHAR_WIDTH / 2.0 + NODE_PADDING
}

/// Point on the circle (`center`, `radius`) closest to `target`.
pub fn outline_point(center: Vector2, radius: f64, target: Vector2) -> Vector2 {
    center.add(center.direction_to(target).scale(radius))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    label: String,
    weight: Option<String>,
    center: Vector2,
    radius: f64,
    base_radius: f64,
}

impl Node {
    /// Create a node whose radius is derived from its label.
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        let label = label.into();
        let radius = estimate_radius(&label);
        Self {
            id,
            label,
            weight: None,
            center: Vector2::ZERO,
            radius,
            base_radius: radius,
        }
    }

    /// Override the label-derived radius.
    pub fn with_radius(mut self, radius: f64) -> Result<Self, GraphError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GraphError::InvalidRadius {
                id: self.id,
                radius,
            });
        }
        self.radius = radius;
        self.base_radius = radius;
        Ok(self)
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn with_center(mut self, center: Vector2) -> Self {
        self.center = center;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    pub fn center(&self) -> Vector2 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Radius the node had before any uniform resizing.
    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    pub(crate) fn set_center(&mut self, center: Vector2) {
        self.center = center;
    }

    /// Change the radius. Without `maintain_centre` the node grows from its
    /// top-left corner, so the centre shifts by the change in radius.
    pub(crate) fn set_radius(&mut self, radius: f64, maintain_centre: bool) {
        if !maintain_centre {
            let delta = radius - self.radius;
            self.center = self.center.add(Vector2::new(delta, delta));
        }
        self.radius = radius;
    }

    /// Point on the outline closest to `target`.
    pub fn edge_point_towards(&self, target: Vector2) -> Vector2 {
        outline_point(self.center, self.radius, target)
    }

    /// Distance between the outlines of two nodes; negative when they overlap.
    pub fn gap_to(&self, other: &Node) -> f64 {
        self.center.distance_to(other.center) - self.radius - other.radius
    }

    pub fn intersects(&self, other: &Node) -> bool {
        self.gap_to(other) <= 0.0
    }

    /// True if this node keeps more than `min_space` from every other node.
    pub fn is_clear_of<'a>(&self, nodes: impl IntoIterator<Item = &'a Node>, min_space: f64) -> bool {
        nodes
            .into_iter()
            .filter(|n| n.id != self.id)
            .all(|n| self.gap_to(n) > min_space)
    }
}

/// A connection between two distinct nodes.
///
/// Directed edges compare by `(from, to)`; undirected edges compare as an
/// unordered pair. A directed edge never equals an undirected one.
#[derive(Debug, Clone)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    directed: bool,
    weight: Option<String>,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, directed: bool) -> Result<Self, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        Ok(Self {
            from,
            to,
            directed,
            weight: None,
        })
    }

    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }

    pub fn from(&self) -> NodeId {
        self.from
    }

    pub fn to(&self) -> NodeId {
        self.to
    }

    pub fn directed(&self) -> bool {
        self.directed
    }

    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    pub fn involves(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    fn key(&self) -> (bool, NodeId, NodeId) {
        if self.directed {
            (true, self.from, self.to)
        } else {
            (false, self.from.min(self.to), self.from.max(self.to))
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.directed { "->" } else { "--" };
        write!(f, "{} {} {}", self.from, arrow, self.to)
    }
}

/// Raw node record as supplied by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub weight: Option<String>,
}

/// Raw edge record as supplied by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: i64,
    pub to: i64,
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub weight: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

/// Change notification raised whenever a node's geometry changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeEvent {
    Moved { id: NodeId, center: Vector2 },
    Resized { id: NodeId, radius: f64 },
}

pub(crate) type Listener = Box<dyn FnMut(&NodeEvent)>;

/// Node and edge collections. Node order is insertion order and is the
/// order used by snapshots and force vectors.
#[derive(Default)]
pub struct Graph {
    inner: DiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
    listener: Option<Listener>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.inner.node_count())
            .field("edges", &self.inner.edge_count())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from loader records, failing on the first invalid entry.
    pub fn from_data(data: &GraphData) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        for spec in &data.nodes {
            let id = node_id(spec.id)?;
            let mut node = Node::new(id, spec.label.clone());
            if let Some(radius) = spec.radius {
                node = node.with_radius(radius)?;
            }
            if let Some(weight) = &spec.weight {
                node = node.with_weight(weight.clone());
            }
            graph.add_node(node)?;
        }
        for spec in &data.edges {
            let from = node_id(spec.from)?;
            let to = node_id(spec.to)?;
            let mut edge = Edge::new(from, to, spec.directed)?;
            if let Some(weight) = &spec.weight {
                edge = edge.with_weight(weight.clone());
            }
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        let id = node.id();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let ix = self.inner.add_node(node);
        self.index.insert(id, ix);
        Ok(())
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let a = self.index_of(edge.from())?;
        let b = self.index_of(edge.to())?;
        let duplicate = self
            .inner
            .edges_connecting(a, b)
            .chain(self.inner.edges_connecting(b, a))
            .any(|e| e.weight() == &edge);
        if duplicate {
            return Err(GraphError::DuplicateEdge(edge));
        }
        self.inner.add_edge(a, b, edge);
        Ok(())
    }

    /// Shorthand for `add_edge(Edge::new(from, to, directed)?)`.
    pub fn connect(&mut self, from: NodeId, to: NodeId, directed: bool) -> Result<(), GraphError> {
        self.add_edge(Edge::new(from, to, directed)?)
    }

    fn index_of(&self, id: NodeId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::UndefinedNode(id))
    }

    /// Register the callback that receives every [`NodeEvent`].
    pub fn set_listener(&mut self, listener: impl FnMut(&NodeEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Detach the listener so that a batch of moves goes unobserved.
    pub(crate) fn take_listener(&mut self) -> Option<Listener> {
        self.listener.take()
    }

    pub(crate) fn restore_listener(&mut self, listener: Option<Listener>) {
        if listener.is_some() {
            self.listener = listener;
        }
    }

    fn notify(&mut self, event: NodeEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&ix| &self.inner[ix])
    }

    /// Node at position `i` in insertion order.
    pub fn node_at(&self, i: usize) -> &Node {
        &self.inner[NodeIndex::new(i)]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_weights()
    }

    /// True if any edge links the two nodes, whatever its direction.
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&a), Some(&b)) => self.are_connected_at(a.index(), b.index()),
            _ => false,
        }
    }

    pub(crate) fn are_connected_at(&self, a: usize, b: usize) -> bool {
        self.inner
            .find_edge_undirected(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// Edge from `a` to `b`. Undirected lookups also match `b` to `a`.
    pub fn edge_between(&self, a: NodeId, b: NodeId, directed: bool) -> Option<&Edge> {
        let probe = Edge::new(a, b, directed).ok()?;
        self.edges().find(|e| **e == probe)
    }

    pub fn edges_of(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges().filter(move |e| e.involves(id))
    }

    /// Every centre, in node order.
    pub fn position_snapshot(&self) -> Vec<Vector2> {
        self.nodes().map(Node::center).collect()
    }

    /// Move every node back to a snapshot taken with [`Graph::position_snapshot`].
    pub fn restore_snapshot(&mut self, snapshot: &[Vector2]) -> Result<(), GraphError> {
        if snapshot.len() != self.node_count() {
            return Err(GraphError::SnapshotLength {
                expected: self.node_count(),
                found: snapshot.len(),
            });
        }
        for (i, &center) in snapshot.iter().enumerate() {
            self.set_center_at(i, center);
        }
        Ok(())
    }

    /// Set the centre of the node at position `i` without any bounds check.
    pub fn set_center_at(&mut self, i: usize, center: Vector2) {
        let node = &mut self.inner[NodeIndex::new(i)];
        node.set_center(center);
        let id = node.id();
        self.notify(NodeEvent::Moved { id, center });
    }

    pub fn set_center(&mut self, id: NodeId, center: Vector2) -> Result<(), GraphError> {
        let ix = self.index_of(id)?;
        self.set_center_at(ix.index(), center);
        Ok(())
    }

    /// Largest base radius among all nodes, or 0 for an empty graph.
    pub fn max_radius(&self) -> f64 {
        self.nodes().map(Node::base_radius).fold(0.0, f64::max)
    }

    fn resize_all(&mut self, pick: impl Fn(&Node) -> f64, maintain_centre: bool) {
        for i in 0..self.node_count() {
            let node = &mut self.inner[NodeIndex::new(i)];
            let radius = pick(node);
            if node.radius() == radius {
                continue;
            }
            node.set_radius(radius, maintain_centre);
            let id = node.id();
            self.notify(NodeEvent::Resized { id, radius });
        }
    }

    /// Resize every node to the largest base radius.
    pub fn match_largest(&mut self, maintain_centre: bool) {
        let radius = self.max_radius();
        self.resize_all(|_| radius, maintain_centre);
    }

    /// Return every node to its own base radius.
    pub fn reset_sizes(&mut self, maintain_centre: bool) {
        self.resize_all(Node::base_radius, maintain_centre);
    }

    pub fn is_within_bounds(&self, node: &Node, canvas: &Canvas) -> bool {
        let c = node.center();
        let r = node.radius();
        c.x - r >= 0.0 && c.y - r >= 0.0 && c.x + r <= canvas.width && c.y + r <= canvas.height
    }

    /// True if the straight segment of some edge passes through a node that
    /// is not one of its endpoints.
    pub fn any_edge_crosses_node(&self) -> bool {
        self.edges().any(|edge| {
            let (Some(a), Some(b)) = (self.node(edge.from()), self.node(edge.to())) else {
                return false;
            };
            self.nodes()
                .filter(|n| !edge.involves(n.id()))
                .any(|n| n.center().distance_to_segment(a.center(), b.center()) <= n.radius())
        })
    }
}
