//! Unrooted manipulation engine for rooted phylogenetic trees.
//!
//! A [Manipulator] converts a rooted (or already multifurcating) tree into
//! the internal unrooted graph and answers "what does this tree look like
//! under a different rooting" queries: default root, midpoint root,
//! outgroup/MRCA root, root above an original node. It also edits topology
//! by grafting subtrees and by subtree pruning and regrafting. Total branch
//! length is conserved by every rooting query.
use std::error::Error as StdError;
use std::fmt;

use indexmap::IndexSet;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::clade::{NodeId, Tree, TreeSource, Units};
use crate::graph::{EdgeId, End, Graph, VertexId};

/// Errors raised by graph construction, rooting queries, and edits.
#[derive(Debug)]
pub enum Error {
    TooFewLeaves(usize),
    InvalidStructure(String),
    UnknownOutgroup(String),
    NodeNotFound(NodeId),
    EdgeNotFound(EdgeId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TooFewLeaves(count) =>
                write!(f, "Tree Has {} Leaves, At Least 2 Required.", count),
            Error::InvalidStructure(what) =>
                write!(f, "Invalid Tree Structure: {}.", what),
            Error::UnknownOutgroup(labels) =>
                write!(f, "No Leaves Match Outgroup [{}].", labels),
            Error::NodeNotFound(node) =>
                write!(f, "Node {} Not Present In Graph.", node),
            Error::EdgeNotFound(edge) =>
                write!(f, "Edge {} Not Present In Graph.", edge),
        }
    }
}

impl StdError for Error {}

/// Multifurcation handling strategy threaded through the graph builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Policy {
    /// Keep the input branching factor on every internal vertex.
    Mimic,
    /// Thread multifurcations through chains of zero-length synthetic
    /// vertices so every vertex ends up with degree at most three.
    Expand,
    /// Elide internal branches below `min_length`, splicing the child's
    /// children directly into the parent (degree grows; the inverse of
    /// expand). `collapse_equal` decides ties at exactly the threshold.
    Reduce { min_length: f64, collapse_equal: bool },
}

/// Owner of one unrooted graph plus the anchor edge the original root sat on.
///
/// All rooting queries derive a fresh [Tree] with recomputed heights and
/// post-ordered indices; [Manipulator::attach] leaves `self` untouched and
/// returns a new instance over an independent graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manipulator {
    graph: Graph,
    anchor: EdgeId,
    /// Share of the anchor length on its first-end side under the original
    /// rooting; restores the original split on default rooting.
    anchor_split: f64,
    units: Units,
    source_rooted: bool,
}

// ============================================================================
// Construction
// ============================================================================
impl Manipulator {
    /// Builds the unrooted graph from a [Tree], taking over its units.
    pub fn from_tree(tree: &Tree, policy: &Policy) -> Result<Manipulator, Error> {
        Manipulator::new(tree, policy, tree.units())
    }

    /// Builds the unrooted graph from any [TreeSource].
    ///
    /// A bifurcating root disappears: its two flanking branches merge into a
    /// single anchor edge whose original length split is remembered. A root
    /// with three or more children becomes one center vertex with each child
    /// as a direct neighbor.
    ///
    /// # Errors
    ///
    /// [Error::TooFewLeaves] when the input has fewer than two leaves;
    /// [Error::InvalidStructure] when a node has exactly one child.
    pub fn new<S: TreeSource + ?Sized>(
        source: &S,
        policy: &Policy,
        units: Units,
    ) -> Result<Manipulator, Error> {
        let root = source.root_node();
        let leaves = count_source_leaves(source, root);
        if leaves < 2 {
            return Err(Error::TooFewLeaves(leaves));
        }

        let mut graph = Graph::new();
        let mut kids = Vec::new();
        gather_children(source, root, policy, &mut kids);

        let (anchor, anchor_split, source_rooted) = match kids.len() {
            0 | 1 => {
                return Err(Error::InvalidStructure(
                    "Root With Fewer Than Two Children".to_string(),
                ));
            }
            2 => {
                let v1 = build_vertex(&mut graph, source, kids[0], policy)?;
                let v2 = build_vertex(&mut graph, source, kids[1], policy)?;
                let l1 = source.branch_length_of(kids[0]);
                let l2 = source.branch_length_of(kids[1]);
                let total = l1 + l2;
                let anchor = graph.add_edge(v1, v2, total, None);
                let split = if total > 0.0 { l1 / total } else { 0.5 };
                (anchor, split, true)
            }
            _ => {
                let annotation = source.annotation_of(root).map(|a| a.to_string());
                let center = graph.add_vertex(None, annotation, Some(root));
                attach_list(&mut graph, center, 3, &kids, source, policy)?;
                let anchor = graph.vertex(center).edges()[0];
                (anchor, 0.5, false)
            }
        };

        debug!(
            "built unrooted graph: {} vertices, {} edges, {} leaves",
            graph.num_vertices(),
            graph.num_edges(),
            leaves
        );

        Ok(Manipulator {
            graph,
            anchor,
            anchor_split,
            units,
            source_rooted,
        })
    }

    /// Read access to the underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The edge the original root was merged into.
    pub fn anchor(&self) -> EdgeId {
        self.anchor
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Whether the input tree had a bifurcating root.
    pub fn source_was_rooted(&self) -> bool {
        self.source_rooted
    }

    /// Sum of all edge lengths; equals the input's total branch length under
    /// mimic and expand (reduce discards the elided near-zero branches).
    pub fn total_branch_length(&self) -> f64 {
        self.graph.total_branch_length()
    }

    /// Labels of all leaf vertices, in vertex order.
    pub fn leaf_labels(&self) -> Vec<String> {
        self.graph
            .vertex_ids()
            .filter_map(|v| {
                let vertex = self.graph.vertex(v);
                if vertex.is_leaf() {
                    vertex.label().map(|l| l.to_string())
                } else {
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Rooting / query engine
// ============================================================================
impl Manipulator {
    /// Rebuilds the bifurcating tree rooted on the anchor edge, splitting its
    /// length in the original root's proportion. Re-deriving the default root
    /// from its own output round-trips to the same split.
    pub fn default_root(&self) -> Tree {
        let length = self.graph.edge(self.anchor).length();
        let first = length * self.anchor_split;
        self.rooted_at(self.anchor, first, length - first)
    }

    /// Roots on the edge minimizing the difference between its two
    /// directional farthest-leaf distances, placing the root so the longest
    /// leaf path on each side comes out equal (up to the clamp keeping both
    /// child branches non-negative).
    pub fn midpoint_root(&mut self) -> Tree {
        let mut best_edge = 0;
        let mut best_imbalance = std::f64::INFINITY;
        for edge in self.graph.edge_ids() {
            let imbalance = self.graph.distance_imbalance(edge).abs();
            if imbalance < best_imbalance {
                best_imbalance = imbalance;
                best_edge = edge;
            }
        }

        let length = self.graph.edge(best_edge).length();
        let mut diff = self.graph.max_leaf_distance(best_edge, End::First)
            - self.graph.max_leaf_distance(best_edge, End::Second);
        if diff > length {
            diff = length;
        }
        if diff < -length {
            diff = -length;
        }

        debug!(
            "midpoint root on edge {} (imbalance {:.6})",
            best_edge, best_imbalance
        );
        self.rooted_at(best_edge, (length - diff) / 2.0, (length + diff) / 2.0)
    }

    /// Finds the edge whose removal isolates exactly the leaves labeled by
    /// `outgroup`. For a non-monophyletic outgroup this returns one MRCA
    /// candidate; [Manipulator::mrca_edges] returns all of them.
    ///
    /// # Errors
    ///
    /// [Error::UnknownOutgroup] when no leaf matches any given label;
    /// [Error::InvalidStructure] when the outgroup covers every leaf.
    pub fn mrca_edge(&self, outgroup: &[&str]) -> Result<EdgeId, Error> {
        let set = label_set(outgroup);
        let total = self.total_matches(&set);
        if total == 0 {
            return Err(Error::UnknownOutgroup(outgroup.join(", ")));
        }
        let (edge, _) = self.mrca_direction(&set, total)?;
        Ok(edge)
    }

    /// Every edge that minimally separates all matching leaves from the rest.
    /// A monophyletic outgroup yields exactly one edge.
    pub fn mrca_edges(&self, outgroup: &[&str]) -> Result<Vec<EdgeId>, Error> {
        let set = label_set(outgroup);
        let total = self.total_matches(&set);
        if total == 0 {
            return Err(Error::UnknownOutgroup(outgroup.join(", ")));
        }

        let mut found = Vec::new();
        for edge in self.graph.edge_ids() {
            let ends = [self.graph.edge(edge).first(), self.graph.edge(edge).second()];
            for &from in ends.iter() {
                if self.count_matches(edge, from, &set) == total
                    && self.is_minimal_side(edge, from, &set)
                {
                    found.push(edge);
                    break;
                }
            }
        }
        Ok(found)
    }

    /// Roots on the outgroup's MRCA edge, splitting its length evenly.
    pub fn root_by_outgroup(&self, outgroup: &[&str]) -> Result<Tree, Error> {
        let edge = self.mrca_edge(outgroup)?;
        let half = self.graph.edge(edge).length() / 2.0;
        Ok(self.rooted_at(edge, half, half))
    }

    /// Like [Manipulator::root_by_outgroup], but caps the branch length of
    /// the ingroup-side root child at `max_ingroup_length`; the remainder of
    /// the edge goes to the outgroup side, conserving total length.
    pub fn root_by_outgroup_capped(
        &self,
        outgroup: &[&str],
        max_ingroup_length: f64,
    ) -> Result<Tree, Error> {
        let set = label_set(outgroup);
        let total = self.total_matches(&set);
        if total == 0 {
            return Err(Error::UnknownOutgroup(outgroup.join(", ")));
        }
        let (edge, from) = self.mrca_direction(&set, total)?;

        // The outgroup lies beyond `from`; the ingroup-side child hangs off
        // the near end.
        let length = self.graph.edge(edge).length();
        let ingroup_length = (length / 2.0).min(max_ingroup_length);
        let outgroup_length = length - ingroup_length;
        if from == self.graph.edge(edge).first() {
            Ok(self.rooted_at(edge, ingroup_length, outgroup_length))
        } else {
            Ok(self.rooted_at(edge, outgroup_length, ingroup_length))
        }
    }

    /// Roots on the parent-ward edge of the vertex built from the given
    /// original node, splitting that edge evenly. The parent-ward edge is the
    /// arrival edge of a blocked-edge traversal from the anchor, where the
    /// original root sat.
    ///
    /// # Errors
    ///
    /// [Error::NodeNotFound] when no vertex back-references the node (for
    /// example the merged-away root of a bifurcating input, a node elided by
    /// the reduce policy, or a node of a grafted subtree).
    pub fn root_above(&self, node: NodeId) -> Result<Tree, Error> {
        let edge = self.parentward_edge(node)?;
        let half = self.graph.edge(edge).length() / 2.0;
        Ok(self.rooted_at(edge, half, half))
    }

    /// Whether the given labels form an exact clade: one side of some edge
    /// holds every labeled leaf and nothing else. Labels missing from the
    /// tree, or a set covering every leaf, make this false.
    pub fn is_exact_clade(&self, labels: &[&str]) -> bool {
        let set = label_set(labels);
        let want = set.len();
        let total = self.total_matches(&set);
        if want == 0 || total != want {
            return false;
        }
        let (edge, from) = match self.mrca_direction(&set, total) {
            Ok(found) => found,
            Err(_) => return false,
        };
        self.count_matches(edge, from, &set) == want
            && self.graph.count_leaves_beyond(edge, from, &|_| true) == want
    }
}

// ============================================================================
// MRCA internals
// ============================================================================
impl Manipulator {
    fn count_matches(&self, edge: EdgeId, from: VertexId, set: &IndexSet<String>) -> usize {
        self.graph.count_leaves_beyond(edge, from, &|vertex| {
            vertex.label().map_or(false, |label| set.contains(label))
        })
    }

    /// Matching leaves in the whole component: both sides of the anchor.
    fn total_matches(&self, set: &IndexSet<String>) -> usize {
        let first = self.graph.edge(self.anchor).first();
        let second = self.graph.edge(self.anchor).second();
        self.count_matches(self.anchor, first, set) + self.count_matches(self.anchor, second, set)
    }

    /// A base direction with every match on its far side. The anchor serves
    /// unless the outgroup spans it, in which case the search re-bases on the
    /// pendant edge of a leaf outside the outgroup.
    fn clean_base(
        &self,
        set: &IndexSet<String>,
        total: usize,
    ) -> Result<(EdgeId, VertexId), Error> {
        let first = self.graph.edge(self.anchor).first();
        let second = self.graph.edge(self.anchor).second();
        let beyond_second = self.count_matches(self.anchor, first, set);
        if beyond_second == total {
            return Ok((self.anchor, first));
        }
        if beyond_second == 0 {
            return Ok((self.anchor, second));
        }

        for candidate in self.graph.vertex_ids() {
            let vertex = self.graph.vertex(candidate);
            if vertex.is_leaf()
                && !vertex.label().map_or(false, |label| set.contains(label))
            {
                return Ok((vertex.edges()[0], candidate));
            }
        }
        Err(Error::InvalidStructure("Outgroup Covers Every Leaf".to_string()))
    }

    /// Descends from a clean base toward the matches: exactly one onward
    /// direction with matches means the MRCA is further in; a fork (or a
    /// leaf) means the current edge is it. Returns the edge and the vertex
    /// on its match-free side.
    fn mrca_direction(
        &self,
        set: &IndexSet<String>,
        total: usize,
    ) -> Result<(EdgeId, VertexId), Error> {
        let (mut edge, mut from) = self.clean_base(set, total)?;
        loop {
            let beyond = self.graph.edge(edge).other_end(from);
            let vertex = self.graph.vertex(beyond);
            if vertex.is_leaf() {
                return Ok((edge, from));
            }
            let mut onward = None;
            let mut hot = 0;
            for &next in vertex.edges() {
                if next == edge {
                    continue;
                }
                if self.count_matches(next, beyond, set) > 0 {
                    hot += 1;
                    onward = Some(next);
                }
            }
            match (hot, onward) {
                (1, Some(next)) => {
                    from = beyond;
                    edge = next;
                }
                _ => return Ok((edge, from)),
            }
        }
    }

    /// Whether the side of `edge` away from `from` is minimal: the vertex
    /// just beyond either is a leaf or forks the matches.
    fn is_minimal_side(&self, edge: EdgeId, from: VertexId, set: &IndexSet<String>) -> bool {
        let beyond = self.graph.edge(edge).other_end(from);
        let vertex = self.graph.vertex(beyond);
        if vertex.is_leaf() {
            return true;
        }
        let hot = vertex
            .edges()
            .iter()
            .filter(|&&next| next != edge)
            .filter(|&&next| self.count_matches(next, beyond, set) > 0)
            .count();
        hot != 1
    }

    /// Arrival edge of the blocked-edge traversal locating `node`'s vertex.
    fn parentward_edge(&self, node: NodeId) -> Result<EdgeId, Error> {
        let first = self.graph.edge(self.anchor).first();
        let second = self.graph.edge(self.anchor).second();
        for &start in [first, second].iter() {
            if let Some(edge) = self.search_source(self.anchor, start, node) {
                return Ok(edge);
            }
        }
        Err(Error::NodeNotFound(node))
    }

    fn search_source(&self, arrived: EdgeId, at: VertexId, node: NodeId) -> Option<EdgeId> {
        if self.graph.vertex(at).source() == Some(node) {
            return Some(arrived);
        }
        for &next in self.graph.vertex(at).edges() {
            if next == arrived {
                continue;
            }
            let beyond = self.graph.edge(next).other_end(at);
            if let Some(found) = self.search_source(next, beyond, node) {
                return Some(found);
            }
        }
        None
    }
}

// ============================================================================
// Rooted-tree derivation
// ============================================================================
impl Manipulator {
    /// Builds a fresh rooted tree split on `edge`, giving `first_length` of
    /// it to the first-end child and `second_length` to the second-end child.
    /// Node heights are recomputed and indices are post-ordered (bottom-up
    /// construction yields post-order directly).
    fn rooted_at(&self, edge: EdgeId, first_length: f64, second_length: f64) -> Tree {
        let mut tree = Tree::new(self.units);
        let first = self.graph.edge(edge).first();
        let second = self.graph.edge(edge).second();
        let left = self.node_below(&mut tree, first, edge, first_length);
        let right = self.node_below(&mut tree, second, edge, second_length);
        let root = tree.add_internal(vec![left, right], 0.0);
        tree.set_root(root);
        tree.recompute_heights();
        tree
    }

    fn node_below(
        &self,
        tree: &mut Tree,
        vertex: VertexId,
        blocked: EdgeId,
        length: f64,
    ) -> NodeId {
        let here = self.graph.vertex(vertex);
        let index = if here.is_leaf() {
            tree.add_leaf(here.label().unwrap_or(""), length)
        } else {
            let mut children = Vec::with_capacity(here.degree() - 1);
            for &next in here.edges() {
                if next == blocked {
                    continue;
                }
                let beyond = self.graph.edge(next).other_end(vertex);
                let child_length = self.graph.edge(next).length();
                children.push(self.node_below(tree, beyond, next, child_length));
            }
            tree.add_internal(children, length)
        };
        if let Some(annotation) = here.annotation() {
            let annotation = annotation.to_string();
            tree.node_mut(index).set_annotation(&annotation);
        }
        index
    }
}

// ============================================================================
// Topology editor
// ============================================================================
impl Manipulator {
    /// Grafts `subtree` onto the midpoint of `target`, returning a new
    /// manipulator over an independent graph; `self` is untouched. The
    /// subtree root's branch length becomes the connecting edge. Grafted
    /// vertices carry no back-references, so [Manipulator::root_above] keeps
    /// resolving nodes of the original source only.
    pub fn attach<S: TreeSource + ?Sized>(
        &self,
        subtree: &S,
        target: EdgeId,
        policy: &Policy,
    ) -> Result<Manipulator, Error> {
        if target >= self.graph.num_edges() {
            return Err(Error::EdgeNotFound(target));
        }

        let mut patched = self.clone();
        let graph = &mut patched.graph;

        let mark = graph.num_vertices();
        let root = subtree.root_node();
        let grafted = build_vertex(graph, subtree, root, policy)?;
        for vertex in mark..graph.num_vertices() {
            graph.vertex_mut(vertex).clear_source();
        }

        let junction = graph.add_vertex(None, None, None);
        graph.split_edge(target, junction);
        graph.add_edge(junction, grafted, subtree.branch_length_of(root), None);
        graph.clear_distance_caches();

        debug!(
            "attached subtree of {} vertices onto edge {}",
            graph.num_vertices() - mark,
            target
        );
        Ok(patched)
    }

    /// Subtree pruning and regrafting in place. The subtree hanging from the
    /// second end of `moving` is detached by bypassing the branch-point
    /// vertex at its first end (the two other neighbors get joined by a
    /// bridge edge summing the bypassed lengths) and reinserted by splitting
    /// `target` at its midpoint.
    ///
    /// Returns the bridge edge so the move can be undone by re-splicing onto
    /// it, or `None` when the branch point already touches `target` and the
    /// move would be a no-op. All references are resolved before any rewiring
    /// happens, so a failure leaves the graph unchanged. Every distance cache
    /// is cleared afterwards.
    ///
    /// # Errors
    ///
    /// [Error::EdgeNotFound] for unknown edges; [Error::InvalidStructure]
    /// when the branch point does not have degree three.
    pub fn extract_and_reattach(
        &mut self,
        moving: EdgeId,
        target: EdgeId,
    ) -> Result<Option<EdgeId>, Error> {
        if moving >= self.graph.num_edges() {
            return Err(Error::EdgeNotFound(moving));
        }
        if target >= self.graph.num_edges() {
            return Err(Error::EdgeNotFound(target));
        }
        if moving == target {
            return Ok(None);
        }

        let pivot = self.graph.edge(moving).first();
        if self.graph.edge(target).touches(pivot) {
            return Ok(None);
        }

        let others: Vec<EdgeId> = self
            .graph
            .vertex(pivot)
            .edges()
            .iter()
            .cloned()
            .filter(|&e| e != moving)
            .collect();
        if others.len() != 2 {
            return Err(Error::InvalidStructure(format!(
                "Vertex {} Has Degree {}, Bypass Needs Degree 3",
                pivot,
                others.len() + 1
            )));
        }
        let (near, far) = (others[0], others[1]);
        let neighbor_a = self.graph.edge(near).other_end(pivot);
        let neighbor_b = self.graph.edge(far).other_end(pivot);
        let bridge_length = self.graph.edge(near).length() + self.graph.edge(far).length();

        let target_first = self.graph.edge(target).first();
        let target_second = self.graph.edge(target).second();
        let half = self.graph.edge(target).length() / 2.0;
        let target_annotation = self.graph.edge(target).annotation().map(|a| a.to_string());

        // Bypass: `near` becomes the bridge joining the two neighbors.
        self.graph.remove_incidence(pivot, near);
        self.graph.set_ends(near, neighbor_a, neighbor_b);
        self.graph.add_incidence(neighbor_b, near);
        self.graph.edge_mut(near).set_length(bridge_length);
        self.graph.edge_mut(near).set_annotation(None);

        // Reinsert: `far` becomes the pivot-to-second half of `target`.
        self.graph.remove_incidence(neighbor_b, far);
        self.graph.set_ends(far, pivot, target_second);
        self.graph.add_incidence(target_second, far);
        self.graph.edge_mut(far).set_length(half);
        self.graph.edge_mut(far).set_annotation(target_annotation);

        // `target` keeps its first end and runs to the pivot.
        self.graph.remove_incidence(target_second, target);
        self.graph.set_ends(target, target_first, pivot);
        self.graph.add_incidence(pivot, target);
        self.graph.edge_mut(target).set_length(half);

        self.graph.clear_distance_caches();
        debug!(
            "moved subtree on edge {} to edge {}, bridge edge {}",
            moving, target, near
        );
        Ok(Some(near))
    }
}

// ============================================================================
// Builder internals
// ============================================================================

fn count_source_leaves<S: TreeSource + ?Sized>(source: &S, node: NodeId) -> usize {
    let kids = source.children_of(node);
    if kids.is_empty() {
        return 1;
    }
    kids.iter().map(|&c| count_source_leaves(source, c)).sum()
}

/// Children of `node` after reduce-policy splicing: a too-short internal
/// branch is dropped and its children climb into the parent's list.
fn gather_children<S: TreeSource + ?Sized>(
    source: &S,
    node: NodeId,
    policy: &Policy,
    out: &mut Vec<NodeId>,
) {
    for &child in source.children_of(node) {
        if let Policy::Reduce { min_length, collapse_equal } = *policy {
            let internal = !source.children_of(child).is_empty();
            let length = source.branch_length_of(child);
            let collapse =
                internal && (length < min_length || (collapse_equal && length == min_length));
            if collapse {
                gather_children(source, child, policy, out);
                continue;
            }
        }
        out.push(child);
    }
}

/// Builds the vertex for `node` and, for internal nodes, its whole subtree.
fn build_vertex<S: TreeSource + ?Sized>(
    graph: &mut Graph,
    source: &S,
    node: NodeId,
    policy: &Policy,
) -> Result<VertexId, Error> {
    let annotation = source.annotation_of(node).map(|a| a.to_string());
    if source.children_of(node).is_empty() {
        let label = source.label_of(node).map(|l| l.to_string());
        return Ok(graph.add_vertex(label, annotation, Some(node)));
    }

    let vertex = graph.add_vertex(None, annotation, Some(node));
    let mut kids = Vec::new();
    gather_children(source, node, policy, &mut kids);
    if kids.len() < 2 {
        return Err(Error::InvalidStructure(
            "Internal Node With A Single Child".to_string(),
        ));
    }
    attach_list(graph, vertex, 2, &kids, source, policy)?;
    Ok(vertex)
}

/// Attaches child subtrees to `vertex`, which has room for `slots` of them
/// before its degree would exceed three. Under the expand policy an
/// overflowing list is threaded through zero-length synthetic vertices; the
/// other policies attach everything directly.
fn attach_list<S: TreeSource + ?Sized>(
    graph: &mut Graph,
    vertex: VertexId,
    slots: usize,
    kids: &[NodeId],
    source: &S,
    policy: &Policy,
) -> Result<(), Error> {
    let expand = match policy {
        Policy::Expand => true,
        _ => false,
    };
    if expand && kids.len() > slots {
        for &child in &kids[..slots - 1] {
            attach_child(graph, vertex, child, source, policy)?;
        }
        let link = graph.add_vertex(None, None, None);
        graph.add_edge(vertex, link, 0.0, None);
        attach_list(graph, link, 2, &kids[slots - 1..], source, policy)
    } else {
        for &child in kids {
            attach_child(graph, vertex, child, source, policy)?;
        }
        Ok(())
    }
}

fn attach_child<S: TreeSource + ?Sized>(
    graph: &mut Graph,
    vertex: VertexId,
    child: NodeId,
    source: &S,
    policy: &Policy,
) -> Result<(), Error> {
    let built = build_vertex(graph, source, child, policy)?;
    graph.add_edge(vertex, built, source.branch_length_of(child), None);
    Ok(())
}

fn label_set(labels: &[&str]) -> IndexSet<String> {
    labels.iter().map(|l| l.to_string()).collect()
}
