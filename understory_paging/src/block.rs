// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The block contract the paging engine operates on.

use core::fmt::Debug;
use core::hash::Hash;

use crate::tree::{NodeId, Tree};

/// A pageable block: a numeric extent plus materialization side effects.
///
/// Extents are expressed in the coordinate space of the block's parent, relative
/// to the parent's [`children_origin`](Block::children_origin). What an extent
/// measures (pixels, character offsets, logical units) is up to the host.
///
/// Implement this for the payload of a [`Tree`] to get a [`BlockTree`] for free.
pub trait Block {
    /// Start of this block, in parent-relative coordinates.
    fn start(&self) -> f64;

    /// End of this block, in parent-relative coordinates. Never less than [`Block::start`].
    fn end(&self) -> f64;

    /// Offset added to children's coordinates to place them in this block's parent space.
    fn children_origin(&self) -> f64;

    /// Materialize this block only, not its children.
    fn page_in(&mut self);

    /// Release this block only.
    ///
    /// All of its children have already been paged out when this is called.
    fn page_out(&mut self);
}

/// A tree of blocks, seen through handles.
///
/// This is the full capability contract of the paging engine: structural
/// readers, positional readers, and the two lifecycle calls. The engine never
/// edits structure itself; hosts edit their tree and report edits through
/// [`ActiveRegion::on_after_block_added`](crate::ActiveRegion::on_after_block_added)
/// and [`ActiveRegion::on_before_block_removed`](crate::ActiveRegion::on_before_block_removed).
///
/// Sibling lists are assumed to be laid out in order: each sibling's start and
/// end are no less than those of the sibling before it, and children lie within
/// their parent's extent. See [`validate_layout`](crate::validate_layout).
pub trait BlockTree {
    /// Handle type for blocks.
    type Id: Copy + Eq + Hash + Debug;

    /// Parent of a block.
    fn parent(&self, block: Self::Id) -> Option<Self::Id>;

    /// First child of a block.
    fn first_child(&self, block: Self::Id) -> Option<Self::Id>;

    /// Last child of a block.
    fn last_child(&self, block: Self::Id) -> Option<Self::Id>;

    /// Sibling after a block.
    fn next_sibling(&self, block: Self::Id) -> Option<Self::Id>;

    /// Sibling before a block.
    fn previous_sibling(&self, block: Self::Id) -> Option<Self::Id>;

    /// See [`Block::start`].
    fn start(&self, block: Self::Id) -> f64;

    /// See [`Block::end`].
    fn end(&self, block: Self::Id) -> f64;

    /// See [`Block::children_origin`].
    fn children_origin(&self, block: Self::Id) -> f64;

    /// See [`Block::page_in`].
    fn page_in(&mut self, block: Self::Id);

    /// See [`Block::page_out`].
    fn page_out(&mut self, block: Self::Id);

    /// Whether a block has no parent and no siblings.
    fn is_root(&self, block: Self::Id) -> bool {
        self.parent(block).is_none()
            && self.previous_sibling(block).is_none()
            && self.next_sibling(block).is_none()
    }
}

impl<B: Block> Tree<B> {
    fn block(&self, id: NodeId) -> &B {
        self.get(id).expect("dangling NodeId")
    }

    fn block_mut(&mut self, id: NodeId) -> &mut B {
        self.get_mut(id).expect("dangling NodeId")
    }
}

impl<B: Block> BlockTree for Tree<B> {
    type Id = NodeId;

    fn parent(&self, block: NodeId) -> Option<NodeId> {
        self.parent_of(block)
    }

    fn first_child(&self, block: NodeId) -> Option<NodeId> {
        self.first_child_of(block)
    }

    fn last_child(&self, block: NodeId) -> Option<NodeId> {
        self.last_child_of(block)
    }

    fn next_sibling(&self, block: NodeId) -> Option<NodeId> {
        self.next_sibling_of(block)
    }

    fn previous_sibling(&self, block: NodeId) -> Option<NodeId> {
        self.previous_sibling_of(block)
    }

    fn start(&self, block: NodeId) -> f64 {
        self.block(block).start()
    }

    fn end(&self, block: NodeId) -> f64 {
        self.block(block).end()
    }

    fn children_origin(&self, block: NodeId) -> f64 {
        self.block(block).children_origin()
    }

    fn page_in(&mut self, block: NodeId) {
        self.block_mut(block).page_in();
    }

    fn page_out(&mut self, block: NodeId) {
        self.block_mut(block).page_out();
    }

    fn is_root(&self, block: NodeId) -> bool {
        Self::is_root(self, block)
    }
}
