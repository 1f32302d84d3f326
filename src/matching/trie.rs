//! Arena-backed prefix tree.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeId`]. Each node owns
//! the mapping from its next character to a child; parents are back-pointers
//! only, so the tree stays acyclic. Deleted nodes are recycled through a free
//! list.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// Index of a node inside a [`Trie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node. Always present.
    pub const ROOT: Self = Self(0);

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node<V> {
    children: BTreeMap<char, NodeId>,
    parent: Option<NodeId>,
    ch: Option<char>,
    payload: Option<V>,
    fail: Option<NodeId>,
}

impl<V> Node<V> {
    const fn new(parent: Option<NodeId>, ch: Option<char>) -> Self {
        Self {
            children: BTreeMap::new(),
            parent,
            ch,
            payload: None,
            fail: None,
        }
    }
}

/// A prefix tree mapping strings to payloads.
#[derive(Debug, Clone)]
pub struct Trie<V> {
    nodes: Vec<Node<V>>,
    free: Vec<NodeId>,
    entries: usize,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Trie<V> {
    /// Creates a trie holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None)],
            free: Vec::new(),
            entries: 0,
        }
    }

    /// Inserts `text`, replacing any payload already stored for it.
    ///
    /// Callers merge payloads for identical text before inserting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKeyword`] for empty text; the root never carries
    /// a payload.
    pub fn insert(&mut self, text: &str, payload: V) -> Result<NodeId> {
        if text.is_empty() {
            return Err(Error::EmptyKeyword);
        }

        let mut node = NodeId::ROOT;
        for c in text.chars() {
            node = match self.child(node, c) {
                Some(next) => next,
                None => self.alloc_child(node, c),
            };
        }

        if self.nodes[node.0].payload.replace(payload).is_none() {
            self.entries += 1;
        }
        Ok(node)
    }

    /// Looks up the node reached by spelling out `text` from the root.
    ///
    /// The node may or may not carry a payload.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<NodeId> {
        text.chars()
            .try_fold(NodeId::ROOT, |node, c| self.child(node, c))
    }

    /// Returns the payload stored for exactly `text`.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<&V> {
        self.find(text).and_then(|node| self.payload(node))
    }

    /// Removes `text` and prunes ancestors left without children or payload.
    ///
    /// Nodes that still lead to other entries are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `text` was never inserted. The trie is
    /// left untouched in that case.
    pub fn delete(&mut self, text: &str) -> Result<V> {
        let node = self
            .find(text)
            .filter(|&node| node != NodeId::ROOT)
            .ok_or_else(|| Error::NotFound(text.to_string()))?;
        let payload = self.nodes[node.0]
            .payload
            .take()
            .ok_or_else(|| Error::NotFound(text.to_string()))?;
        self.entries -= 1;

        let mut current = node;
        while current != NodeId::ROOT {
            let entry = &self.nodes[current.0];
            if !entry.children.is_empty() || entry.payload.is_some() {
                break;
            }
            let (Some(parent), Some(ch)) = (entry.parent, entry.ch) else {
                break;
            };
            self.nodes[parent.0].children.remove(&ch);
            self.release(current);
            current = parent;
        }

        Ok(payload)
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of strings stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries
    }

    /// Returns `true` if no strings are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Returns the child of `node` on `c`.
    #[must_use]
    pub fn child(&self, node: NodeId, c: char) -> Option<NodeId> {
        self.nodes[node.0].children.get(&c).copied()
    }

    /// Iterates over the children of `node` in character order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (char, NodeId)> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .map(|(&c, &child)| (c, child))
    }

    /// Returns the payload stored at `node`.
    #[must_use]
    pub fn payload(&self, node: NodeId) -> Option<&V> {
        self.nodes[node.0].payload.as_ref()
    }

    /// Returns the failure link of `node`, or the root if none was computed.
    #[must_use]
    pub fn fail(&self, node: NodeId) -> NodeId {
        self.nodes[node.0].fail.unwrap_or(NodeId::ROOT)
    }

    pub(crate) fn set_fail(&mut self, node: NodeId, target: NodeId) {
        self.nodes[node.0].fail = Some(target);
    }

    fn alloc_child(&mut self, parent: NodeId, c: char) -> NodeId {
        let node = Node::new(Some(parent), Some(c));
        let id = if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        };
        self.nodes[parent.0].children.insert(c, id);
        id
    }

    fn release(&mut self, node: NodeId) {
        let entry = &mut self.nodes[node.0];
        entry.parent = None;
        entry.ch = None;
        entry.fail = None;
        self.free.push(node);
    }
}
