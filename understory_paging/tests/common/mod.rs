// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A recording host document for integration tests.

#![allow(
    dead_code,
    unreachable_pub,
    reason = "Shared helpers for test binaries."
)]

use std::cmp::Ordering;
use std::collections::HashSet;

use proptest::prelude::*;
use understory_paging::{ActiveRegion, BlockTree, Cursor, NodeId, Point, Position, Tree};

/// Generated document shape.
#[derive(Clone, Debug)]
pub struct Shape {
    /// Length of the block's own content, before its children.
    pub header: u8,
    /// Extra header length while paged in.
    pub grow: u8,
    pub children: Vec<Shape>,
}

pub fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0_u8..4, 0_u8..3).prop_map(|(header, grow)| Shape {
        header,
        grow,
        children: Vec::new(),
    });
    leaf.prop_recursive(4, 48, 5, |inner| {
        (0_u8..4, 0_u8..3, prop::collection::vec(inner, 1..5)).prop_map(
            |(header, grow, children)| Shape {
                header,
                grow,
                children,
            },
        )
    })
}

#[derive(Clone, Debug)]
pub struct Item {
    header: f64,
    grow: f64,
    start: f64,
    end: f64,
    pub paged: bool,
}

/// Paging calls seen by the host, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    In(NodeId),
    Out(NodeId),
}

/// A host document: headers stacked over their children.
///
/// Children are laid out relative to their parent's start. Paging checks the
/// engine's contract (parents before children on the way in, children before
/// parents on the way out, no double paging) and records every call.
#[derive(Debug)]
pub struct Doc {
    pub tree: Tree<Item>,
    pub root: NodeId,
    pub log: Vec<Op>,
    /// Grow headers while paged in, re-laying out after every paging call.
    pub resize: bool,
}

impl Doc {
    pub fn build(shape: &Shape) -> Self {
        let mut tree = Tree::new();
        let root = insert(&mut tree, shape);
        let mut doc = Self {
            tree,
            root,
            log: Vec::new(),
            resize: false,
        };
        doc.relayout();
        doc
    }

    pub fn with_resize(mut self) -> Self {
        self.resize = true;
        self
    }

    pub fn item(&self, id: NodeId) -> &Item {
        self.tree.get(id).unwrap()
    }

    pub fn is_paged(&self, id: NodeId) -> bool {
        self.item(id).paged
    }

    /// Blocks attached under the root, in preorder.
    pub fn blocks(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.tree.children_of(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Attached blocks currently paged in.
    pub fn paged_set(&self) -> HashSet<NodeId> {
        self.blocks()
            .into_iter()
            .filter(|&id| self.is_paged(id))
            .collect()
    }

    /// Every point of the tree in document order.
    pub fn points(&self) -> Vec<Point<NodeId>> {
        let mut cursor = Cursor::at(Point::start_of(self.root));
        let mut points = vec![cursor.point()];
        while cursor.has_next(self) {
            cursor.next(self);
            points.push(cursor.point());
        }
        points
    }

    /// Absolute extent of a block.
    pub fn extent(&self, id: NodeId) -> (f64, f64) {
        (
            Point::start_of(id).absolute_location(self),
            Point::end_of(id).absolute_location(self),
        )
    }

    fn relayout(&mut self) {
        layout(&mut self.tree, self.root, 0.0);
    }

    /// Panics unless exactly the blocks meeting the window are paged in.
    pub fn assert_paged_matches(&self, region: &ActiveRegion<NodeId>) {
        let (Some(start), Some(end)) = (region.start(), region.end()) else {
            for id in self.blocks() {
                assert!(!self.is_paged(id), "{id:?} paged in with no active region");
            }
            return;
        };
        for id in self.blocks() {
            let meets = Point::end_of(id).compare(self, &start) != Ok(Ordering::Less)
                && Point::start_of(id).compare(self, &end) != Ok(Ordering::Greater);
            assert_eq!(
                self.is_paged(id),
                meets,
                "{id:?} between {start:?} and {end:?}"
            );
        }
    }
}

fn insert(tree: &mut Tree<Item>, shape: &Shape) -> NodeId {
    let id = tree.insert(Item {
        header: f64::from(shape.header),
        grow: f64::from(shape.grow),
        start: 0.0,
        end: 0.0,
        paged: false,
    });
    for child in &shape.children {
        let child = insert(tree, child);
        tree.append(id, child);
    }
    id
}

/// Place `id` at `at`, returning its end.
fn layout(tree: &mut Tree<Item>, id: NodeId, at: f64) -> f64 {
    let item = tree.get(id).unwrap();
    let mut offset = item.header + if item.paged { item.grow } else { 0.0 };
    let children: Vec<_> = tree.children_of(id).collect();
    for child in children {
        offset = layout(tree, child, offset);
    }
    let item = tree.get_mut(id).unwrap();
    item.start = at;
    item.end = at + offset;
    item.end
}

impl BlockTree for Doc {
    type Id = NodeId;

    fn parent(&self, block: NodeId) -> Option<NodeId> {
        self.tree.parent_of(block)
    }

    fn first_child(&self, block: NodeId) -> Option<NodeId> {
        self.tree.first_child_of(block)
    }

    fn last_child(&self, block: NodeId) -> Option<NodeId> {
        self.tree.last_child_of(block)
    }

    fn next_sibling(&self, block: NodeId) -> Option<NodeId> {
        self.tree.next_sibling_of(block)
    }

    fn previous_sibling(&self, block: NodeId) -> Option<NodeId> {
        self.tree.previous_sibling_of(block)
    }

    fn start(&self, block: NodeId) -> f64 {
        self.item(block).start
    }

    fn end(&self, block: NodeId) -> f64 {
        self.item(block).end
    }

    fn children_origin(&self, block: NodeId) -> f64 {
        self.item(block).start
    }

    fn page_in(&mut self, block: NodeId) {
        assert!(!self.is_paged(block), "{block:?} paged in twice");
        if let Some(parent) = self.tree.parent_of(block) {
            assert!(
                self.is_paged(parent),
                "{block:?} paged in before its parent"
            );
        }
        self.tree.get_mut(block).unwrap().paged = true;
        self.log.push(Op::In(block));
        if self.resize {
            self.relayout();
        }
    }

    fn page_out(&mut self, block: NodeId) {
        assert!(
            self.is_paged(block),
            "{block:?} paged out while not paged in"
        );
        for child in self.tree.children_of(block) {
            assert!(
                !self.is_paged(child),
                "{block:?} paged out before child {child:?}"
            );
        }
        self.tree.get_mut(block).unwrap().paged = false;
        self.log.push(Op::Out(block));
        if self.resize {
            self.relayout();
        }
    }
}
