//! Rooted-tree data structures for phylogenetic analysis.
//!
//! Trees are stored as an arena of [Node]s addressed by [NodeId], so the
//! unrooted manipulation engine can copy and rebuild them without chasing
//! reference cycles. Heights are settable and recomputed from branch lengths
//! by [Tree::recompute_heights].
use serde::{Serialize, Deserialize};

/// Index of a node in a [Tree] arena.
pub type NodeId = usize;

/// Units the branch lengths of a tree are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    Substitutions,
    Generations,
    Days,
    Years,
}

impl std::default::Default for Units {
    fn default() -> Units { Units::Substitutions }
}

/// A single node of a rooted tree.
///
/// A node is external (leaf) when it has no children, otherwise it has at
/// least two. The branch length is the distance to the parent; the root
/// carries length 0. Heights run root-to-leaf: the root height is the longest
/// root-to-leaf path and every child sits at its parent's height minus its
/// branch length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    index: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    label: Option<String>,
    annotation: Option<String>,
    length: f64,
    height: f64,
}

impl Node {
    /// Index of this node in its tree's arena.
    pub fn index(&self) -> NodeId {
        self.index
    }

    /// Parent index, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child indices; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Leaf label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().map(|s| s.as_str())
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_ref().map(|s| s.as_str())
    }

    pub fn set_annotation(&mut self, annotation: &str) {
        self.annotation = Some(annotation.to_string());
    }

    /// Branch length to the parent.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Sets the branch length to the parent.
    ///
    /// # Panics
    ///
    /// Panics if `length` is negative.
    pub fn set_length(&mut self, length: f64) {
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        self.length = length;
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }
}

/// A rooted phylogenetic tree stored as a [Node] arena.
///
/// Built bottom-up: leaves first, then internal nodes over existing children,
/// then [Tree::set_root]. Node indices assigned in that order are already
/// post-ordered; [Tree::renumber_post_order] restores the property after
/// external reshuffling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    units: Units,
}

impl Tree {
    /// Creates an empty tree measured in the given units.
    pub fn new(units: Units) -> Tree {
        Tree {
            nodes: Vec::new(),
            root: None,
            units,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Adds a leaf with the given label and branch length, returning its index.
    ///
    /// # Panics
    ///
    /// Panics if `length` is negative.
    pub fn add_leaf(&mut self, label: &str, length: f64) -> NodeId {
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        let index = self.nodes.len();
        self.nodes.push(Node {
            index,
            parent: None,
            children: Vec::new(),
            label: Some(label.to_string()),
            annotation: None,
            length,
            height: 0.0,
        });
        index
    }

    /// Adds an internal node over already-added children, returning its index.
    /// The children's parent references are updated.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two children are given or `length` is negative.
    pub fn add_internal(&mut self, children: Vec<NodeId>, length: f64) -> NodeId {
        assert!(children.len() >= 2, "Internal Node Needs At Least Two Children");
        assert!(length >= 0.0, "Branch Length Must Be Non-Negative");
        let index = self.nodes.len();
        for &child in &children {
            self.nodes[child].parent = Some(index);
        }
        self.nodes.push(Node {
            index,
            parent: None,
            children,
            label: None,
            annotation: None,
            length,
            height: 0.0,
        });
        index
    }

    /// Marks an existing parentless node as the root.
    pub fn set_root(&mut self, index: NodeId) {
        assert!(self.nodes[index].parent.is_none(), "Root Must Not Have A Parent");
        self.root = Some(index);
    }

    pub fn is_rooted(&self) -> bool {
        self.root.is_some()
    }

    /// Reference to the root node.
    ///
    /// # Panics
    ///
    /// Panics if no root has been set.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root.expect("Tree Has No Root Set")]
    }

    pub fn node(&self, index: NodeId) -> &Node {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeId) -> &mut Node {
        &mut self.nodes[index]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Iterator over external (leaf) nodes in arena order.
    pub fn external_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Iterator over internal nodes (root included) in arena order.
    pub fn internal_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_leaf())
    }

    /// Labels of all leaves, in arena order.
    pub fn leaf_labels(&self) -> Vec<String> {
        self.external_nodes()
            .filter_map(|n| n.label())
            .map(|l| l.to_string())
            .collect()
    }

    /// Sum of all branch lengths.
    pub fn total_branch_length(&self) -> f64 {
        self.nodes.iter().map(|n| n.length).sum()
    }

    /// Recomputes every node height from the branch lengths: the root height
    /// becomes the longest root-to-leaf path and each child sits at its
    /// parent's height minus its branch length.
    pub fn recompute_heights(&mut self) {
        let root = match self.root {
            Some(root) => root,
            None => return,
        };

        let mut depth = vec![0.0; self.nodes.len()];
        let mut max_depth: f64 = 0.0;
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let here = depth[index];
            if self.nodes[index].is_leaf() && here > max_depth {
                max_depth = here;
            }
            for &child in self.nodes[index].children.iter() {
                depth[child] = here + self.nodes[child].length;
                stack.push(child);
            }
        }

        for index in 0..self.nodes.len() {
            self.nodes[index].height = max_depth - depth[index];
        }
    }

    /// Rebuilds the arena so indices follow a post-order traversal from the
    /// root (children before parents, root last).
    pub fn renumber_post_order(&mut self) {
        let root = match self.root {
            Some(root) => root,
            None => return,
        };

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(root, false)];
        while let Some((index, expanded)) = stack.pop() {
            if expanded || self.nodes[index].is_leaf() {
                order.push(index);
            } else {
                stack.push((index, true));
                for &child in self.nodes[index].children.iter().rev() {
                    stack.push((child, false));
                }
            }
        }

        let mut remap = vec![0; self.nodes.len()];
        for (new_index, &old_index) in order.iter().enumerate() {
            remap[old_index] = new_index;
        }

        let mut nodes: Vec<Node> = order.iter().map(|&old| self.nodes[old].clone()).collect();
        for (new_index, node) in nodes.iter_mut().enumerate() {
            node.index = new_index;
            node.parent = node.parent.map(|p| remap[p]);
            for child in node.children.iter_mut() {
                *child = remap[*child];
            }
        }

        self.nodes = nodes;
        self.root = Some(remap[root]);
    }
}

/// Narrow producer interface consumed by the graph builder: enough to stream
/// any rooted tree shape as children, branch lengths, and labels, without
/// tying the builder to one concrete tree type.
pub trait TreeSource {
    /// Index of the root node.
    fn root_node(&self) -> NodeId;

    /// Children of a node; empty for leaves.
    fn children_of(&self, node: NodeId) -> &[NodeId];

    /// Branch length from a node to its parent.
    fn branch_length_of(&self, node: NodeId) -> f64;

    /// Leaf label, if the node carries one.
    fn label_of(&self, node: NodeId) -> Option<&str>;

    /// Annotation, if the node carries one.
    fn annotation_of(&self, node: NodeId) -> Option<&str>;
}

impl TreeSource for Tree {
    fn root_node(&self) -> NodeId {
        self.root.expect("Tree Has No Root Set")
    }

    fn children_of(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    fn branch_length_of(&self, node: NodeId) -> f64 {
        self.nodes[node].length
    }

    fn label_of(&self, node: NodeId) -> Option<&str> {
        self.nodes[node].label()
    }

    fn annotation_of(&self, node: NodeId) -> Option<&str> {
        self.nodes[node].annotation()
    }
}
