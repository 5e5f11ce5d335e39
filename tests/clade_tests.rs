use phylograph::clade::{Tree, Units};

/// ((A:1,B:1):1,(C:1,D:1):1);
fn quartet() -> Tree {
    let mut tree = Tree::new(Units::Substitutions);
    let a = tree.add_leaf("A", 1.0);
    let b = tree.add_leaf("B", 1.0);
    let i1 = tree.add_internal(vec![a, b], 1.0);
    let c = tree.add_leaf("C", 1.0);
    let d = tree.add_leaf("D", 1.0);
    let i2 = tree.add_internal(vec![c, d], 1.0);
    let root = tree.add_internal(vec![i1, i2], 0.0);
    tree.set_root(root);
    tree
}

/// Canonical label-sorted rendering, for topology comparison.
fn canonical(tree: &Tree, index: usize) -> String {
    let node = tree.node(index);
    if node.is_leaf() {
        format!("{}:{:.6}", node.label().unwrap_or(""), node.length())
    } else {
        let mut parts: Vec<String> = node
            .children()
            .iter()
            .map(|&child| canonical(tree, child))
            .collect();
        parts.sort();
        format!("({}):{:.6}", parts.join(","), node.length())
    }
}

#[test]
fn test_building_and_wiring() {
    let tree = quartet();
    assert_eq!(tree.num_nodes(), 7);
    assert_eq!(tree.num_leaves(), 4);
    assert!(tree.is_rooted());

    let root = tree.root();
    assert!(root.is_root());
    assert!(!root.is_leaf());
    assert_eq!(root.children().len(), 2);

    for child in root.children() {
        assert_eq!(tree.node(*child).parent(), Some(root.index()));
    }

    let labels = tree.leaf_labels();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_total_branch_length() {
    let tree = quartet();
    assert!((tree.total_branch_length() - 6.0).abs() < 1e-12);
}

#[test]
fn test_recompute_heights() {
    let mut tree = quartet();
    tree.recompute_heights();

    // Ultrametric quartet: root at 2, internals at 1, leaves at 0.
    assert!((tree.root().height() - 2.0).abs() < 1e-12);
    for node in tree.external_nodes() {
        assert!(node.height().abs() < 1e-12);
    }
    for node in tree.internal_nodes() {
        if !node.is_root() {
            assert!((node.height() - 1.0).abs() < 1e-12);
        }
    }

    // Child height is always parent height minus branch length.
    for index in 0..tree.num_nodes() {
        let node = tree.node(index);
        if let Some(parent) = node.parent() {
            let expected = tree.node(parent).height() - node.length();
            assert!((node.height() - expected).abs() < 1e-12);
        }
    }
}

#[test]
fn test_heights_settable() {
    let mut tree = quartet();
    let root = tree.root().index();
    tree.node_mut(root).set_height(42.0);
    assert!((tree.root().height() - 42.0).abs() < 1e-12);
}

#[test]
fn test_renumber_post_order() {
    // Build with interleaved indices, then renumber.
    let mut tree = Tree::new(Units::Substitutions);
    let a = tree.add_leaf("A", 1.0);
    let c = tree.add_leaf("C", 1.0);
    let b = tree.add_leaf("B", 1.0);
    let d = tree.add_leaf("D", 1.0);
    let i2 = tree.add_internal(vec![c, d], 1.0);
    let i1 = tree.add_internal(vec![a, b], 1.0);
    let root = tree.add_internal(vec![i1, i2], 0.0);
    tree.set_root(root);

    let before = canonical(&tree, tree.root().index());
    tree.renumber_post_order();
    let after = canonical(&tree, tree.root().index());
    assert_eq!(before, after);

    // Children precede parents, root comes last.
    for index in 0..tree.num_nodes() {
        let node = tree.node(index);
        assert_eq!(node.index(), index);
        for child in node.children() {
            assert!(*child < index);
        }
    }
    assert_eq!(tree.root().index(), tree.num_nodes() - 1);
}

#[test]
fn test_annotations() {
    let mut tree = quartet();
    let root = tree.root().index();
    tree.node_mut(root).set_annotation("posterior=0.99");
    assert_eq!(tree.root().annotation(), Some("posterior=0.99"));
}

#[test]
fn test_serde_round_trip() {
    let mut tree = quartet();
    tree.recompute_heights();
    let json = serde_json::to_string(&tree).unwrap();
    let back: Tree = serde_json::from_str(&json).unwrap();
    assert_eq!(
        canonical(&tree, tree.root().index()),
        canonical(&back, back.root().index())
    );
    assert_eq!(back.units(), Units::Substitutions);
}

#[test]
fn test_units_carried() {
    let tree = Tree::new(Units::Years);
    assert_eq!(tree.units(), Units::Years);
}

#[test]
#[should_panic]
fn test_internal_needs_two_children() {
    let mut tree = Tree::new(Units::Substitutions);
    let a = tree.add_leaf("A", 1.0);
    tree.add_internal(vec![a], 1.0);
}

#[test]
#[should_panic]
fn test_negative_branch_length_panics() {
    let mut tree = Tree::new(Units::Substitutions);
    tree.add_leaf("A", -1.0);
}
