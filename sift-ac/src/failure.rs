// Failure links
//
// Classical Aho-Corasick closure over the trie, processed layer by layer.
// A node's link depends on its parent's link, and its inherited terminals
// depend on the terminals of a shallower node, so the order matters.

use crate::trie::{NodeId, Trie};

pub(crate) struct FailureLinkComputer;

impl FailureLinkComputer {
    pub(crate) fn run(trie: &mut Trie) {
        Self::assign_sequence(trie);
        Self::link(trie);
    }

    /// Number nodes in breadth-first order; the root gets 0
    fn assign_sequence(trie: &mut Trie) {
        let Trie { nodes, layers } = trie;
        let mut next = 0;

        for layer in layers.iter() {
            for id in layer {
                nodes[id.index()].sequence_index = next;
                next += 1;
            }
        }
    }

    fn link(trie: &mut Trie) {
        for depth in 1..trie.layers.len() {
            for position in 0..trie.layers[depth].len() {
                let id = trie.layers[depth][position];
                let failure = Self::failure_of(trie, id);

                let inherited = trie.node(failure).terminals.clone();
                let node = &mut trie.nodes[id.index()];
                node.failure = failure;
                for keyword in inherited {
                    if !node.terminals.contains(&keyword) {
                        node.terminals.push(keyword);
                    }
                }
            }
        }
    }

    fn failure_of(trie: &Trie, id: NodeId) -> NodeId {
        let node = trie.node(id);
        let edge = match node.edge {
            Some(c) => c,
            None => return NodeId::ROOT,
        };

        let mut candidate = trie.node(node.parent).failure;
        while candidate != NodeId::ROOT && trie.child(candidate, edge).is_none() {
            candidate = trie.node(candidate).failure;
        }

        match trie.child(candidate, edge) {
            Some(target) if target != id => target,
            _ => NodeId::ROOT,
        }
    }
}
