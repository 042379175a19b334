// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena-backed intrusive tree: structure and linkage only, no positions.

use alloc::vec::Vec;

/// Identifier for a node in a [`Tree`] (generational).
///
/// Handles stay valid until the node is [discarded](Tree::discard); after that
/// the slot may be reused with a bumped generation, and the old handle reports
/// as stale through [`Tree::is_alive`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    generation: u32,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    previous_sibling: Option<NodeId>,
    value: T,
}

impl<T> Node<T> {
    fn new(generation: u32, value: T) -> Self {
        Self {
            generation,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            previous_sibling: None,
            value,
        }
    }

    fn is_detached(&self) -> bool {
        self.parent.is_none() && self.next_sibling.is_none() && self.previous_sibling.is_none()
    }
}

/// A tree of values with doubly linked sibling lists.
///
/// Every node records its parent, its first and last child, and its previous
/// and next sibling, so all structural queries and edits are constant time.
/// Nodes are created detached by [`Tree::insert`] and then linked with
/// [`Tree::append`], [`Tree::prepend`], [`Tree::insert_before`], or
/// [`Tree::insert_after`].
///
/// Misuse of the linking API (linking a node that is already attached, passing
/// a reference node that is not a child of the given parent, or using a stale
/// [`NodeId`]) is a programming error and panics.
///
/// ## Example
///
/// ```rust
/// use understory_paging::Tree;
///
/// let mut tree = Tree::new();
/// let root = tree.insert("root");
/// let b = tree.insert("b");
/// let a = tree.insert("a");
/// tree.append(root, b);
/// tree.insert_before(root, Some(b), a);
///
/// let names: Vec<_> = tree.children_of(root).map(|id| *tree.get(id).unwrap()).collect();
/// assert_eq!(names, ["a", "b"]);
/// ```
pub struct Tree<T> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> core::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Create a new detached node holding `value`.
    ///
    /// The node has no parent and no siblings until it is linked into a
    /// parent's child list.
    pub fn insert(&mut self, value: T) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, value));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, value)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let idx = idx as u32;
        NodeId::new(idx, generation)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Returns the value stored at a live node.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node_opt(id).map(|n| &n.value)
    }

    /// Returns the value stored at a live node, mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_opt_mut(id).map(|n| &mut n.value)
    }

    /// Returns the parent of a node, or `None` for detached nodes, roots, and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Returns the first child of a node.
    pub fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.first_child)
    }

    /// Returns the last child of a node.
    pub fn last_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.last_child)
    }

    /// Returns the sibling following a node.
    pub fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.next_sibling)
    }

    /// Returns the sibling preceding a node.
    pub fn previous_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.previous_sibling)
    }

    /// Returns true if a live node has no parent and no siblings.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(Node::is_detached)
    }

    /// Iterate the children of a node, first to last.
    ///
    /// Stale ids yield nothing.
    pub fn children_of(&self, id: NodeId) -> Children<'_, T> {
        Children {
            tree: self,
            next: self.first_child_of(id),
        }
    }

    /// Iterate a node and its ancestors, from the node up to its root.
    ///
    /// Stale ids yield nothing.
    pub fn ancestors_of(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.is_alive(id).then_some(id),
        }
    }

    /// Link `child` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        let next = self.node(parent).first_child;
        self.link(parent, None, next, child);
    }

    /// Link `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let previous = self.node(parent).last_child;
        self.link(parent, previous, None, child);
    }

    /// Link `child` immediately before `reference` in `parent`'s child list.
    ///
    /// A `reference` of `None` appends.
    ///
    /// # Panics
    ///
    /// Panics if `reference` is not a child of `parent`, or if `child` is
    /// already attached.
    pub fn insert_before(&mut self, parent: NodeId, reference: Option<NodeId>, child: NodeId) {
        let Some(reference) = reference else {
            self.append(parent, child);
            return;
        };
        self.assert_child_of(parent, reference);
        let previous = self.node(reference).previous_sibling;
        self.link(parent, previous, Some(reference), child);
    }

    /// Link `child` immediately after `reference` in `parent`'s child list.
    ///
    /// A `reference` of `None` prepends.
    ///
    /// # Panics
    ///
    /// Panics if `reference` is not a child of `parent`, or if `child` is
    /// already attached.
    pub fn insert_after(&mut self, parent: NodeId, reference: Option<NodeId>, child: NodeId) {
        let Some(reference) = reference else {
            self.prepend(parent, child);
            return;
        };
        self.assert_child_of(parent, reference);
        let next = self.node(reference).next_sibling;
        self.link(parent, Some(reference), next, child);
    }

    /// Detach a node from its parent.
    ///
    /// The node's own subtree is left intact; only its parent and sibling links
    /// (and its former neighbours' links to it) change. Detached nodes and
    /// stale ids are ignored.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        let Some(parent) = node.parent else {
            return;
        };
        let (previous, next) = (node.previous_sibling, node.next_sibling);

        match previous {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).previous_sibling = previous,
            None => self.node_mut(parent).last_child = previous,
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.previous_sibling = None;
        node.next_sibling = None;
    }

    /// Remove a node (and its subtree) from the tree, freeing their slots.
    ///
    /// Attached nodes are detached first. Every id in the subtree becomes stale.
    pub fn discard(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.remove(id);
        let mut stack = alloc::vec![id];
        while let Some(id) = stack.pop() {
            stack.extend(self.children_of(id));
            self.nodes[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node<T> {
        self.node_opt(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node<T>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn assert_child_of(&self, parent: NodeId, reference: NodeId) {
        assert_eq!(
            self.node(reference).parent,
            Some(parent),
            "reference node is not a child of the given parent"
        );
    }

    fn link(
        &mut self,
        parent: NodeId,
        previous: Option<NodeId>,
        next: Option<NodeId>,
        child: NodeId,
    ) {
        assert!(
            self.node(child).is_detached(),
            "cannot link a node that is already attached"
        );
        assert!(
            !self.ancestors_of(parent).any(|a| a == child),
            "cannot link a node beneath itself"
        );

        match previous {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        match next {
            Some(n) => self.node_mut(n).previous_sibling = Some(child),
            None => self.node_mut(parent).last_child = Some(child),
        }

        let node = self.node_mut(child);
        node.parent = Some(parent);
        node.previous_sibling = previous;
        node.next_sibling = next;
    }
}

/// Iterator over the children of a node; see [`Tree::children_of`].
#[derive(Clone, Debug)]
pub struct Children<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Children<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling_of(current);
        Some(current)
    }
}

/// Iterator over a node and its ancestors; see [`Tree::ancestors_of`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent_of(current);
        Some(current)
    }
}
