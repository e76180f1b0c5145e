// Trie construction
//
// Every keyword becomes a path of code-point edges starting at the root.
// Nodes live in an arena and refer to each other by index, so the parent and
// failure relations added later are plain integers rather than pointers.

use ahash::AHashMap;

/// Index of a node in the trie arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A node of the construction trie
#[derive(Debug)]
pub(crate) struct TrieNode {
    /// Outgoing edges, one per code point
    pub(crate) children: AHashMap<char, NodeId>,

    /// Node this one hangs off (the root is its own parent)
    pub(crate) parent: NodeId,

    /// Character on the parent edge, `None` for the root
    pub(crate) edge: Option<char>,

    /// BFS layer; the root is at depth 0
    pub(crate) depth: usize,

    /// Longest proper suffix that is also a trie path
    pub(crate) failure: NodeId,

    /// Keyword indices ending here: own terminations first, inherited after
    pub(crate) terminals: Vec<usize>,

    /// Position in breadth-first order
    pub(crate) sequence_index: usize,
}

impl TrieNode {
    fn root() -> Self {
        Self {
            children: AHashMap::default(),
            parent: NodeId::ROOT,
            edge: None,
            depth: 0,
            failure: NodeId::ROOT,
            terminals: Vec::new(),
            sequence_index: 0,
        }
    }

    fn child_of(parent: NodeId, edge: char, depth: usize) -> Self {
        Self {
            children: AHashMap::default(),
            parent,
            edge: Some(edge),
            depth,
            failure: NodeId::ROOT,
            terminals: Vec::new(),
            sequence_index: 0,
        }
    }
}

/// Trie arena plus the nodes of each depth in creation order
#[derive(Debug)]
pub(crate) struct Trie {
    pub(crate) nodes: Vec<TrieNode>,
    pub(crate) layers: Vec<Vec<NodeId>>,
}

impl Trie {
    pub(crate) fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn child(&self, id: NodeId, c: char) -> Option<NodeId> {
        self.node(id).children.get(&c).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Inserts keywords into a fresh trie
pub(crate) struct TrieBuilder {
    trie: Trie,
}

impl TrieBuilder {
    pub(crate) fn new() -> Self {
        Self {
            trie: Trie {
                nodes: vec![TrieNode::root()],
                layers: vec![vec![NodeId::ROOT]],
            },
        }
    }

    /// Insert every keyword in order; keyword `i` gets index `i`
    pub(crate) fn insert_all<I, S>(keywords: I) -> Trie
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Self::new();
        for (index, keyword) in keywords.into_iter().enumerate() {
            builder.insert(index, keyword.as_ref());
        }
        builder.finish()
    }

    /// Walk `keyword` from the root, creating missing nodes, and record
    /// `index` as a direct termination of the last node.
    pub(crate) fn insert(&mut self, index: usize, keyword: &str) {
        let mut current = NodeId::ROOT;

        for c in keyword.chars() {
            current = match self.trie.child(current, c) {
                Some(next) => next,
                None => self.add_child(current, c),
            };
        }

        let terminals = &mut self.trie.nodes[current.index()].terminals;
        if !terminals.contains(&index) {
            terminals.push(index);
        }
    }

    fn add_child(&mut self, parent: NodeId, c: char) -> NodeId {
        let depth = self.trie.node(parent).depth + 1;
        let id = NodeId(self.trie.nodes.len());

        self.trie.nodes.push(TrieNode::child_of(parent, c, depth));
        self.trie.nodes[parent.index()].children.insert(c, id);

        if self.trie.layers.len() <= depth {
            self.trie.layers.push(Vec::new());
        }
        self.trie.layers[depth].push(id);

        id
    }

    pub(crate) fn finish(self) -> Trie {
        self.trie
    }
}
