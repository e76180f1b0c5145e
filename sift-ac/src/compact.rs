// Automaton compaction
//
// Folds each node's failure chain into its own transition table, so the
// scan never has to walk failure links. Edges from closer suffixes win over
// edges from further ones.
//
// States are built in breadth-first order. A node's failure target is
// always shallower, so its state already holds the folded rest of the
// chain and only needs copying for the characters the node lacks.

use crate::matcher::{State, StateId};
use crate::trie::{NodeId, Trie};
use ahash::AHashMap;

pub(crate) struct AutomatonCompactor;

impl AutomatonCompactor {
    /// One state per trie node, stored at the node's `sequence_index`
    pub(crate) fn compact(trie: &Trie) -> Vec<State> {
        let mut states = Vec::with_capacity(trie.len());

        // Layers are already in sequence order.
        for layer in &trie.layers {
            for &id in layer {
                debug_assert_eq!(trie.node(id).sequence_index, states.len());
                let state = Self::compact_node(trie, &states, id);
                states.push(state);
            }
        }

        states
    }

    fn compact_node(trie: &Trie, built: &[State], id: NodeId) -> State {
        let node = trie.node(id);

        let mut transitions: AHashMap<char, StateId> = node
            .children
            .iter()
            .map(|(&c, &child)| (c, Self::state_of(trie, child)))
            .collect();

        // Root edges are never folded in.
        if node.failure != NodeId::ROOT {
            let suffix = &built[trie.node(node.failure).sequence_index];
            for (c, next) in suffix.transitions() {
                transitions.entry(c).or_insert(next);
            }
        }

        // Terminals were inherited along the chain when the links were set.
        State::new(transitions, node.terminals.clone())
    }

    fn state_of(trie: &Trie, id: NodeId) -> StateId {
        StateId::new(trie.node(id).sequence_index)
    }
}
