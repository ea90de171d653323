//! The Correction Shared Packed Parse Forest (CSPPF) arena (spec §3),
//! grounded on the Python original's `lark.parsers.earley_forest`
//! (`SymbolNode`/`PackedNode`/`TokenNode`, referenced throughout
//! `alcep.py`/`oalcep.py`/`transformer.py`) and, for the arena-with-stable-
//! indices idiom itself, on `lrtable`'s state-table representation.
//!
//! Ownership follows Design Notes §9: forest nodes live in one arena;
//! packed nodes hold `Option<NodeIdx>` rather than back-references, and
//! node identity is structural — a `node cache` keyed by `(label, start,
//! end)` guarantees at most one symbol/intermediate node per identity,
//! which is what makes the forest a DAG rather than a tree.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use indexmap::IndexMap;

use ganalyzer::{PIdx, Symbol};

use crate::editop::EditOp;

/// Stable index of a node (symbol/intermediate or token) in a `Forest`.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIdx(u32);

impl NodeIdx {
    fn new(v: usize) -> NodeIdx {
        NodeIdx(v as u32)
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// What a symbol/intermediate node stands for: either a completed grammar
/// symbol, or a "dotted-rule label" for a production partway through being
/// recognized (an intermediate node, per spec §3 — "intermediate nodes are
/// also symbol nodes" in the Python original).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Label {
    Symbol(Symbol),
    Intermediate(PIdx, usize)
}

/// `(s, rule, split, left?, right)`. `split` is the middle Earley-set
/// index; `left` may be absent (a production's first symbol has no
/// left sibling node), `right` is present in normal usage.
#[derive(Clone, Debug)]
pub struct PackedNode {
    pub rule: PIdx,
    pub split: usize,
    pub left: Option<NodeIdx>,
    pub right: Option<NodeIdx>
}

/// A symbol or intermediate node: `(label, start, end)` plus an ordered
/// family list. Order is observable (spec §5) — families are pushed in
/// closure-visit order and never reordered.
#[derive(Clone, Debug)]
pub struct SymbolNodeData {
    pub label: Label,
    pub start: usize,
    pub end: usize,
    pub children: Vec<PackedNode>
}

enum Node {
    Symbol(SymbolNodeData),
    Token(EditOp)
}

/// The forest arena. The recognizer exclusively owns this and is the only
/// component that mutates it; the transformer (`transform` module) reads
/// it immutably (spec §3 "Ownership").
pub struct Forest {
    nodes: Vec<Node>,
    cache: IndexMap<(Label, usize, usize), NodeIdx>
}

impl Forest {
    pub fn new() -> Forest {
        Forest { nodes: Vec::new(), cache: IndexMap::new() }
    }

    /// Get the existing symbol/intermediate node for `(label, start, end)`,
    /// or create one with an empty family list. This is the node cache
    /// spec §3 requires for DAG sharing.
    pub fn get_or_create_symbol(&mut self, label: Label, start: usize, end: usize) -> NodeIdx {
        if let Some(idx) = self.cache.get(&(label, start, end)) {
            return *idx;
        }
        let idx = NodeIdx::new(self.nodes.len());
        self.nodes.push(Node::Symbol(SymbolNodeData { label, start, end, children: Vec::new() }));
        self.cache.insert((label, start, end), idx);
        idx
    }

    pub fn find_symbol(&self, label: Label, start: usize, end: usize) -> Option<NodeIdx> {
        self.cache.get(&(label, start, end)).copied()
    }

    /// Append a new family (a packed node) to a symbol/intermediate node's
    /// child list, in call order. The caller is responsible for avoiding
    /// duplicate families (the recognizers already only call this once
    /// per distinct derivation, mirroring the Python original's
    /// `if new_item not in current_earley_set` guards).
    pub fn add_family(&mut self, node: NodeIdx, rule: PIdx, split: usize, left: Option<NodeIdx>, right: Option<NodeIdx>) {
        match &mut self.nodes[node.0 as usize] {
            Node::Symbol(data) => data.children.push(PackedNode { rule, split, left, right }),
            Node::Token(_) => panic!("cannot add a family to a token node")
        }
    }

    /// Create a fresh token (leaf) node carrying `op`. Token nodes are not
    /// deduplicated: the same edit op applied at two different forest
    /// positions is two distinct leaves.
    pub fn new_token(&mut self, op: EditOp) -> NodeIdx {
        let idx = NodeIdx::new(self.nodes.len());
        self.nodes.push(Node::Token(op));
        idx
    }

    pub fn symbol(&self, idx: NodeIdx) -> &SymbolNodeData {
        match &self.nodes[idx.0 as usize] {
            Node::Symbol(data) => data,
            Node::Token(_) => panic!("node {idx} is a token node, not a symbol node")
        }
    }

    pub fn token(&self, idx: NodeIdx) -> &EditOp {
        match &self.nodes[idx.0 as usize] {
            Node::Token(op) => op,
            Node::Symbol(_) => panic!("node {idx} is a symbol node, not a token node")
        }
    }

    pub fn is_token(&self, idx: NodeIdx) -> bool {
        matches!(&self.nodes[idx.0 as usize], Node::Token(_))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Forest {
    fn default() -> Forest {
        Forest::new()
    }
}

/// Two nodes (possibly in different forests) are equal ignoring children:
/// same kind, and for symbol/intermediate nodes the same `(label, start,
/// end)`, for token nodes the same edit op.
fn equal_node_without_child(f1: &Forest, n1: Option<NodeIdx>, f2: &Forest, n2: Option<NodeIdx>) -> bool {
    match (n1, n2) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if f1.is_token(a) != f2.is_token(b) {
                return false;
            }
            if f1.is_token(a) {
                f1.token(a) == f2.token(b)
            } else {
                let da = f1.symbol(a);
                let db = f2.symbol(b);
                da.label == db.label && da.start == db.start && da.end == db.end
            }
        }
        _ => false
    }
}

/// Match `n1`'s families against `n2`'s one-for-one by `(rule, split,
/// left, right)` identity (ignoring grandchildren), returning the matched
/// pairs for the caller to recurse into, or `None` if some family has no
/// match or the family counts differ.
fn matching_children(f1: &Forest, n1: NodeIdx, f2: &Forest, n2: NodeIdx) -> Option<Vec<(PackedNode, PackedNode)>> {
    let d1 = f1.symbol(n1);
    let d2 = f2.symbol(n2);
    if d1.children.len() != d2.children.len() {
        return None;
    }
    let mut pairs = Vec::with_capacity(d1.children.len());
    for c1 in &d1.children {
        let mut found = false;
        for c2 in &d2.children {
            if c1.rule == c2.rule
                && c1.split == c2.split
                && equal_node_without_child(f1, c1.left, f2, c2.left)
                && equal_node_without_child(f1, c1.right, f2, c2.right)
            {
                found = true;
                pairs.push((c1.clone(), c2.clone()));
            }
        }
        if !found {
            return None;
        }
    }
    Some(pairs)
}

/// Structural equality of two CSPPF roots (spec §4.4, invariant I4),
/// grounded on `equality_of_correction_sppfs.equal`: a breadth-first walk
/// comparing each pair of nodes without looking at grandchildren, then
/// matching packed-node families and queuing their `left`/`right`
/// children for the same check. The roots may live in different `Forest`
/// arenas (as alcep's and oalcep's separately built forests do).
pub fn structurally_equal(f1: &Forest, root1: NodeIdx, f2: &Forest, root2: NodeIdx) -> bool {
    if !equal_node_without_child(f1, Some(root1), f2, Some(root2)) {
        return false;
    }

    let mut visited: HashSet<(NodeIdx, NodeIdx)> = HashSet::new();
    let mut queue: VecDeque<(NodeIdx, NodeIdx)> = VecDeque::new();
    queue.push_back((root1, root2));

    while let Some((n1, n2)) = queue.pop_front() {
        if f1.is_token(n1) {
            continue;
        }
        let pairs = match matching_children(f1, n1, f2, n2) {
            Some(p) => p,
            None => return false
        };
        for (c1, c2) in pairs {
            if c1.left.is_some() != c2.left.is_some() {
                return false;
            }
            if let (Some(l1), Some(l2)) = (c1.left, c2.left) {
                if visited.insert((l1, l2)) {
                    queue.push_back((l1, l2));
                }
            }
            if c1.right.is_some() != c2.right.is_some() {
                return false;
            }
            if let (Some(r1), Some(r2)) = (c1.right, c2.right) {
                if visited.insert((r1, r2)) {
                    queue.push_back((r1, r2));
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use ganalyzer::{RIdx, TIdx};

    #[test]
    fn caches_symbol_nodes_by_identity() {
        let mut f = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let a = f.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let b = f.get_or_create_symbol(Label::Symbol(s), 0, 1);
        assert_eq!(a, b);

        let c = f.get_or_create_symbol(Label::Symbol(s), 0, 2);
        assert_ne!(a, c);
    }

    #[test]
    fn families_preserve_insertion_order() {
        let mut f = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let node = f.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let tok1 = f.new_token(EditOp::read("a"));
        let tok2 = f.new_token(EditOp::read("b"));
        f.add_family(node, PIdx::new(0), 0, None, Some(tok1));
        f.add_family(node, PIdx::new(1), 0, None, Some(tok2));

        let data = f.symbol(node);
        assert_eq!(data.children.len(), 2);
        assert_eq!(data.children[0].right, Some(tok1));
        assert_eq!(data.children[1].right, Some(tok2));
    }

    #[test]
    fn token_nodes_are_not_deduplicated() {
        let mut f = Forest::new();
        let a = f.new_token(EditOp::read("a"));
        let b = f.new_token(EditOp::read("a"));
        assert_ne!(a, b);
        let _ = TIdx::new(0);
    }

    #[test]
    fn structurally_equal_forests_built_independently() {
        let mut f1 = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let n1 = f1.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let t1 = f1.new_token(EditOp::read("a"));
        f1.add_family(n1, PIdx::new(0), 0, None, Some(t1));

        let mut f2 = Forest::new();
        let n2 = f2.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let t2 = f2.new_token(EditOp::read("a"));
        f2.add_family(n2, PIdx::new(0), 0, None, Some(t2));

        assert!(structurally_equal(&f1, n1, &f2, n2));
    }

    #[test]
    fn structurally_unequal_when_a_family_differs() {
        let mut f1 = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let n1 = f1.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let t1 = f1.new_token(EditOp::read("a"));
        f1.add_family(n1, PIdx::new(0), 0, None, Some(t1));

        let mut f2 = Forest::new();
        let n2 = f2.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let t2 = f2.new_token(EditOp::read("b"));
        f2.add_family(n2, PIdx::new(0), 0, None, Some(t2));

        assert!(!structurally_equal(&f1, n1, &f2, n2));
    }
}
