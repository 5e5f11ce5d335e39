//! Unrooted multigraph backing the tree manipulator.
//!
//! Vertices and edges live in arenas addressed by plain indices; an edge
//! always connects exactly two vertices and carries a branch length plus two
//! independently cached farthest-leaf distances, one per direction. Walking
//! "away" from an edge is expressed everywhere as an excluded-edge parameter
//! rather than parent pointers, which keeps the structure trivially copyable.
use serde::{Serialize, Deserialize};

use crate::clade::NodeId;

/// Index of a vertex in a [Graph] arena.
pub type VertexId = usize;

/// Index of an edge in a [Graph] arena.
pub type EdgeId = usize;

/// Which end of an edge a traversal leaves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    First,
    Second,
}

/// A vertex of the unrooted graph.
///
/// Degree 1 vertices are leaves and carry the leaf label; internal vertices
/// have degree three or more (exactly three under the expand policy). The
/// incident-edge list keeps insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    label: Option<String>,
    annotation: Option<String>,
    source: Option<NodeId>,
    edges: Vec<EdgeId>,
}

impl Vertex {
    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().map(|s| s.as_str())
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_ref().map(|s| s.as_str())
    }

    pub fn set_annotation(&mut self, annotation: Option<String>) {
        self.annotation = annotation;
    }

    /// Back-reference to the external node this vertex was built from.
    /// Synthetic vertices introduced by the expand policy have none.
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// Drops the back-reference, e.g. for vertices grafted in from another
    /// tree whose node indices would be ambiguous here.
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    /// Incident edges in insertion order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.edges.len() == 1
    }
}

/// An edge of the unrooted graph, connecting its `first` and `second` ends.
///
/// The two `max_leaf_via_*` fields cache the longest cumulative branch length
/// reachable by leaving the edge through that end without re-crossing it.
/// They stay unset until a distance query fills them and are blanket-cleared
/// whenever any edge in the component changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    first: VertexId,
    second: VertexId,
    length: f64,
    annotation: Option<String>,
    #[serde(skip)]
    max_leaf_via_first: Option<f64>,
    #[serde(skip)]
    max_leaf_via_second: Option<f64>,
}

impl Edge {
    pub fn first(&self) -> VertexId {
        self.first
    }

    pub fn second(&self) -> VertexId {
        self.second
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Sets the branch length. The caller is responsible for clearing the
    /// graph's distance caches afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `length` is negative.
    pub fn set_length(&mut self, length: f64) {
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        self.length = length;
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_ref().map(|s| s.as_str())
    }

    pub fn set_annotation(&mut self, annotation: Option<String>) {
        self.annotation = annotation;
    }

    /// The opposite end from `vertex`. Assumes `vertex` is one of the ends.
    pub fn other_end(&self, vertex: VertexId) -> VertexId {
        if vertex == self.first { self.second } else { self.first }
    }

    pub fn touches(&self, vertex: VertexId) -> bool {
        self.first == vertex || self.second == vertex
    }

    fn cached(&self, via: End) -> Option<f64> {
        match via {
            End::First => self.max_leaf_via_first,
            End::Second => self.max_leaf_via_second,
        }
    }

    fn set_cached(&mut self, via: End, value: f64) {
        match via {
            End::First => self.max_leaf_via_first = Some(value),
            End::Second => self.max_leaf_via_second = Some(value),
        }
    }

    fn clear_cached(&mut self) {
        self.max_leaf_via_first = None;
        self.max_leaf_via_second = None;
    }
}

/// The vertex/edge arena itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Adds an unconnected vertex, returning its index.
    pub fn add_vertex(
        &mut self,
        label: Option<String>,
        annotation: Option<String>,
        source: Option<NodeId>,
    ) -> VertexId {
        let index = self.vertices.len();
        self.vertices.push(Vertex {
            label,
            annotation,
            source,
            edges: Vec::new(),
        });
        index
    }

    /// Adds an edge between two vertices, appending it to both incidence
    /// lists, and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if `length` is negative.
    pub fn add_edge(
        &mut self,
        first: VertexId,
        second: VertexId,
        length: f64,
        annotation: Option<String>,
    ) -> EdgeId {
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        let index = self.edges.len();
        self.edges.push(Edge {
            first,
            second,
            length,
            annotation,
            max_leaf_via_first: None,
            max_leaf_via_second: None,
        });
        self.vertices[first].edges.push(index);
        self.vertices[second].edges.push(index);
        index
    }

    pub fn vertex(&self, index: VertexId) -> &Vertex {
        &self.vertices[index]
    }

    pub fn vertex_mut(&mut self, index: VertexId) -> &mut Vertex {
        &mut self.vertices[index]
    }

    pub fn edge(&self, index: EdgeId) -> &Edge {
        &self.edges[index]
    }

    pub fn edge_mut(&mut self, index: EdgeId) -> &mut Edge {
        &mut self.edges[index]
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_ids(&self) -> std::ops::Range<VertexId> {
        0..self.vertices.len()
    }

    pub fn edge_ids(&self) -> std::ops::Range<EdgeId> {
        0..self.edges.len()
    }

    /// Sum of all edge lengths.
    pub fn total_branch_length(&self) -> f64 {
        self.edges.iter().map(|e| e.length).sum()
    }

    /// Sets an edge's length and drops every distance cache in the graph.
    pub fn set_edge_length(&mut self, edge: EdgeId, length: f64) {
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        self.edges[edge].length = length;
        self.clear_distance_caches();
    }
}

// ============================================================================
// Farthest-leaf distance caches
// ============================================================================
impl Graph {
    /// Drops every cached farthest-leaf distance. Called after any mutation;
    /// the next distance query recomputes lazily.
    pub fn clear_distance_caches(&mut self) {
        for edge in self.edges.iter_mut() {
            edge.clear_cached();
        }
    }

    /// Longest cumulative branch length reachable by leaving `edge` through
    /// the given end without re-crossing it. Zero when that end is a leaf.
    ///
    /// Memoized per edge and direction; a full sweep over all edges is
    /// amortized linear in the number of edges.
    pub fn max_leaf_distance(&mut self, edge: EdgeId, via: End) -> f64 {
        if let Some(distance) = self.edges[edge].cached(via) {
            return distance;
        }

        let vertex = match via {
            End::First => self.edges[edge].first,
            End::Second => self.edges[edge].second,
        };

        // Clone of the incidence list so the recursion can borrow the arena.
        let incident = self.vertices[vertex].edges.clone();
        let mut best: f64 = 0.0;
        for next in incident {
            if next == edge {
                continue;
            }
            let onward = if self.edges[next].first == vertex {
                End::Second
            } else {
                End::First
            };
            let distance = self.edges[next].length + self.max_leaf_distance(next, onward);
            if distance > best {
                best = distance;
            }
        }

        self.edges[edge].set_cached(via, best);
        best
    }

    /// Difference between the two directional farthest-leaf distances of an
    /// edge; the midpoint edge minimizes its absolute value.
    pub fn distance_imbalance(&mut self, edge: EdgeId) -> f64 {
        self.max_leaf_distance(edge, End::First) - self.max_leaf_distance(edge, End::Second)
    }
}

// ============================================================================
// Blocked-edge traversal primitives
// ============================================================================
impl Graph {
    /// Counts the leaves satisfying `pred` in the component on the far side
    /// of `edge` as seen from `from`, never re-crossing `edge`.
    pub fn count_leaves_beyond<F>(&self, edge: EdgeId, from: VertexId, pred: &F) -> usize
    where
        F: Fn(&Vertex) -> bool,
    {
        let beyond = self.edges[edge].other_end(from);
        let vertex = &self.vertices[beyond];
        if vertex.is_leaf() {
            return if pred(vertex) { 1 } else { 0 };
        }
        vertex
            .edges
            .iter()
            .filter(|&&next| next != edge)
            .map(|&next| self.count_leaves_beyond(next, beyond, pred))
            .sum()
    }
}

// ============================================================================
// Low-level rewiring (topology editor support)
// ============================================================================
impl Graph {
    /// Removes `edge` from `vertex`'s incidence list.
    pub fn remove_incidence(&mut self, vertex: VertexId, edge: EdgeId) {
        self.vertices[vertex].edges.retain(|&e| e != edge);
    }

    /// Appends `edge` to `vertex`'s incidence list.
    pub fn add_incidence(&mut self, vertex: VertexId, edge: EdgeId) {
        self.vertices[vertex].edges.push(edge);
    }

    /// Redirects an edge's ends without touching any incidence list; the
    /// caller pairs this with [Graph::remove_incidence] and
    /// [Graph::add_incidence] so both stay consistent.
    pub fn set_ends(&mut self, edge: EdgeId, first: VertexId, second: VertexId) {
        self.edges[edge].first = first;
        self.edges[edge].second = second;
    }

    /// Splits `edge` at vertex `mid`: the existing edge keeps its first end
    /// and half its length, a new edge spans `mid` to the old second end with
    /// the other half. Returns the new edge. The split edge's annotation is
    /// duplicated onto both halves.
    pub fn split_edge(&mut self, edge: EdgeId, mid: VertexId) -> EdgeId {
        let second = self.edges[edge].second;
        let half = self.edges[edge].length / 2.0;
        let annotation = self.edges[edge].annotation.clone();

        self.remove_incidence(second, edge);
        self.edges[edge].second = mid;
        self.edges[edge].length = half;
        self.add_incidence(mid, edge);

        self.add_edge(mid, second, half, annotation)
    }
}
