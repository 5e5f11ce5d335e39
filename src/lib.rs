//! # Phylograph
//!
//! `phylograph` is a collection of phylogenetic-tree data structures and
//! manipulation operations: rooted trees, an unrooted vertex/edge graph,
//! rerooting and clade queries, and subtree grafting.
pub mod clade;
pub mod graph;
pub mod manipulate;
