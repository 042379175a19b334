// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Paging: keep only the visible part of a lazily materialized block tree alive.
//!
//! Long documents, threaded conversations, and other tall hierarchical content are often
//! modeled as a tree of blocks, each occupying a 1D extent (a vertical range, say) and
//! nested inside its parent's extent. Materializing every block is wasteful; this crate
//! tracks a contiguous window of "paged in" blocks around a viewport and, as the viewport
//! moves, pages in exactly the blocks that enter the window and pages out exactly those
//! that leave it.
//!
//! - Blocks are addressed through the [`BlockTree`] trait, so hosts can keep their own
//!   tree. A small arena [`Tree`] is provided that implements it for any [`Block`] payload.
//! - The window is delimited by two [`Point`]s: a side ([`Side::Start`] or [`Side::End`])
//!   of a block. Points are totally ordered in document order, and a block is paged in
//!   exactly when its extent meets the window in that order.
//! - Paging may resize blocks. [`ActiveRegion::activate`] repeats until stable and reports
//!   how far content moved, so callers can keep the same thing on screen.
//!
//! ## Not a layout engine
//!
//! This crate does not measure or position blocks. Hosts lay out their blocks however
//! they like and report extents through [`BlockTree::start`], [`BlockTree::end`], and
//! [`BlockTree::children_origin`]. Siblings are assumed to be laid out in order and
//! children within their parent; [`validate_layout`] checks this, and runs automatically
//! in debug builds (see [`PagingOptions`]). Float inputs are assumed to be finite.
//!
//! ## API overview
//!
//! - [`ActiveRegion`]: the paging state machine.
//!   - [`ActiveRegion::activate`] pages against a viewport [`Region`].
//!   - [`ActiveRegion::grow_up`] / [`ActiveRegion::grow_down`] extend the window by a
//!     number of blocks, for prefetching.
//!   - [`ActiveRegion::reset`] pages everything out.
//!   - [`ActiveRegion::on_after_block_added`] / [`ActiveRegion::on_before_block_removed`]
//!     keep the window consistent across structural edits.
//! - [`Cursor`]: a movable [`Point`] with a cached absolute origin.
//! - [`Position`]: location and ordering queries shared by points and cursors;
//!   see also [`is_between`] and [`is_descendant`].
//! - [`locate_start_within`], [`locate_end_within`], [`locate_start_after`], and
//!   [`locate_end_before`]: find the point nearest an absolute position, skipping
//!   whole subtrees by extent.
//! - [`Overlap`]: how two [`Region`]s relate.
//!
//! Blocks are paged in parents first and paged out children first; in each paging step
//! all page-outs happen before any page-in. Diagnostics are emitted through [`tracing`]
//! at `debug` and `trace` level.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod active_region;
mod block;
mod check;
mod error;
mod locate;
mod options;
mod point;
mod region;
mod tree;

pub use active_region::ActiveRegion;
pub use block::{Block, BlockTree};
pub use check::validate_layout;
pub use error::{LayoutError, PagingError};
pub use locate::{locate_end_before, locate_end_within, locate_start_after, locate_start_within};
pub use options::PagingOptions;
pub use point::{Cursor, Point, Position, Side, is_between, is_descendant};
pub use region::{Overlap, Region};
pub use tree::{Ancestors, Children, NodeId, Tree};
