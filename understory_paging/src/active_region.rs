// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A contiguous paged-in window over a block tree.

use alloc::collections::VecDeque;
use alloc::vec;

use hashbrown::HashSet;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::block::BlockTree;
use crate::check::validate_layout;
use crate::locate::{locate_end_before, locate_start_after, locate_start_within};
use crate::options::PagingOptions;
use crate::point::{Cursor, Point, Position, Side, common_ancestor, is_between, is_descendant};
use crate::region::{Overlap, Region};

/// Leading boundary of the window.
///
/// Blocks are included when this moves backward onto their end, and excluded
/// when it moves forward off their end.
#[derive(Clone, Debug)]
struct Leading<Id>(Cursor<Id>);

impl<Id: Copy + Eq> Leading<Id> {
    fn trawl_next<T>(&mut self, tree: &T, excluded: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let Point { side, block } = self.0.point();
        if side == Side::End {
            excluded.push_back(block);
        }
        self.0.next(tree);
    }

    fn trawl_previous<T>(&mut self, tree: &T, included: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.0.previous(tree);
        let Point { side, block } = self.0.point();
        if side == Side::End {
            included.push_back(block);
        }
    }

    /// Move forward while the next point is still strictly before `position`.
    fn trawl_next_until<T>(&mut self, tree: &T, position: f64, excluded: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.0.has_next(tree) {
            let old = self.0.point();
            self.0.next(tree);
            if self.0.absolute_location(tree) >= position {
                // Overshot; step back.
                self.0.previous(tree);
                break;
            }
            if old.side == Side::End {
                excluded.push_back(old.block);
            }
        }
    }

    /// Move backward until strictly before `position`, or at the very start.
    fn trawl_previous_until<T>(&mut self, tree: &T, position: f64, included: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.0.has_previous(tree) && self.0.absolute_location(tree) >= position {
            self.trawl_previous(tree, included);
        }
    }
}

/// Trailing boundary of the window.
///
/// Blocks are included when this moves forward onto their start, and excluded
/// when it moves backward off their start.
#[derive(Clone, Debug)]
struct Trailing<Id>(Cursor<Id>);

impl<Id: Copy + Eq> Trailing<Id> {
    fn trawl_previous<T>(&mut self, tree: &T, excluded: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let Point { side, block } = self.0.point();
        if side == Side::Start {
            excluded.push_back(block);
        }
        self.0.previous(tree);
    }

    fn trawl_next<T>(&mut self, tree: &T, included: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.0.next(tree);
        let Point { side, block } = self.0.point();
        if side == Side::Start {
            included.push_back(block);
        }
    }

    /// Move backward while the previous point is still strictly after `position`.
    fn trawl_previous_until<T>(&mut self, tree: &T, position: f64, excluded: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.0.has_previous(tree) {
            let old = self.0.point();
            self.0.previous(tree);
            if self.0.absolute_location(tree) <= position {
                self.0.next(tree);
                break;
            }
            if old.side == Side::Start {
                excluded.push_back(old.block);
            }
        }
    }

    /// Move forward until strictly after `position`, or at the very end.
    fn trawl_next_until<T>(&mut self, tree: &T, position: f64, included: &mut VecDeque<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.0.has_next(tree) && self.0.absolute_location(tree) <= position {
            self.trawl_next(tree, included);
        }
    }
}

/// Maintains a continuous paged-in window within a block tree.
///
/// The window is delimited by two points, a start and an end. A block is paged
/// in exactly when its extent, taken as its start and end points, meets the
/// window in document order; in particular every ancestor of a boundary is
/// paged in. Moving the window pages in only the blocks that enter it and
/// pages out only the blocks that leave it.
///
/// The region does not own the tree. Every call takes the tree explicitly, and
/// the host must report structural edits through
/// [`on_after_block_added`](Self::on_after_block_added) and
/// [`on_before_block_removed`](Self::on_before_block_removed) while the region
/// is active. Calling back into the region from [`BlockTree::page_in`] or
/// [`BlockTree::page_out`] is not supported.
///
/// Misuse (growing an inactive region, activating against a root that has a
/// parent, or reporting blocks from another tree) is a programming error and
/// panics.
///
/// ## Example
///
/// ```rust
/// use understory_paging::{ActiveRegion, Block, Region, Tree};
///
/// #[derive(Debug)]
/// struct Section {
///     start: f64,
///     end: f64,
///     paged: bool,
/// }
///
/// impl Block for Section {
///     fn start(&self) -> f64 { self.start }
///     fn end(&self) -> f64 { self.end }
///     fn children_origin(&self) -> f64 { 0.0 }
///     fn page_in(&mut self) { self.paged = true; }
///     fn page_out(&mut self) { self.paged = false; }
/// }
///
/// let section = |start, end| Section { start, end, paged: false };
/// let mut tree = Tree::new();
/// let root = tree.insert(section(0.0, 10.0));
/// let a = tree.insert(section(0.0, 4.0));
/// let b = tree.insert(section(4.0, 10.0));
/// tree.append(root, a);
/// tree.append(root, b);
///
/// let mut region = ActiveRegion::over(root);
/// region.activate(&mut tree, Region::new(1.0, 2.0));
/// assert!(tree.get(root).unwrap().paged);
/// assert!(tree.get(a).unwrap().paged);
/// assert!(!tree.get(b).unwrap().paged);
///
/// region.activate(&mut tree, Region::new(5.0, 6.0));
/// assert!(!tree.get(a).unwrap().paged);
/// assert!(tree.get(b).unwrap().paged);
/// ```
#[derive(Clone, Debug)]
pub struct ActiveRegion<Id> {
    root: Id,
    start: Leading<Id>,
    end: Trailing<Id>,
    to_page_in: VecDeque<Id>,
    to_page_out: VecDeque<Id>,
    options: PagingOptions,
}

impl<Id> ActiveRegion<Id>
where
    Id: Copy + Eq + core::hash::Hash + core::fmt::Debug,
{
    /// Create an inactive region over the tree rooted at `root`.
    pub fn over(root: Id) -> Self {
        Self::with_options(root, PagingOptions::default())
    }

    /// Create an inactive region with explicit [`PagingOptions`].
    pub fn with_options(root: Id, options: PagingOptions) -> Self {
        Self {
            root,
            start: Leading(Cursor::unplaced()),
            end: Trailing(Cursor::unplaced()),
            to_page_in: VecDeque::new(),
            to_page_out: VecDeque::new(),
            options,
        }
    }

    /// The root of the managed tree.
    pub fn root(&self) -> Id {
        self.root
    }

    /// The options this region runs with.
    pub fn options(&self) -> PagingOptions {
        self.options
    }

    /// Whether a window has been established.
    pub fn is_active(&self) -> bool {
        self.start.0.is_placed()
    }

    /// The start boundary, if active.
    pub fn start(&self) -> Option<Point<Id>> {
        self.start.0.get()
    }

    /// The end boundary, if active.
    pub fn end(&self) -> Option<Point<Id>> {
        self.end.0.get()
    }

    /// The absolute extent of the window, or `None` if inactive.
    pub fn active_region<T>(&self, tree: &T) -> Option<Region>
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.invalidate_position_cache();
        self.is_active().then(|| {
            Region::new(
                self.start.0.absolute_location(tree),
                self.end.0.absolute_location(tree),
            )
        })
    }

    /// Extend the window past its end by up to `n` blocks, paging them in.
    ///
    /// Stops early at the end of the tree. Returns `0.0`: nothing before the
    /// end boundary moves.
    ///
    /// # Panics
    ///
    /// Panics if the region is inactive.
    pub fn grow_down<T>(&mut self, tree: &mut T, n: usize) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        debug_assert!(self.to_page_in.is_empty(), "page-in queue not drained");
        assert!(self.is_active(), "no active region");
        self.maybe_check_layout(tree);
        self.invalidate_position_cache();

        while self.to_page_in.len() < n && self.end.0.has_next(tree) {
            self.end.trawl_next(tree, &mut self.to_page_in);
        }
        self.page(tree);
        0.0
    }

    /// Extend the window before its start by up to `n` blocks, paging them in.
    ///
    /// Stops early at the start of the tree. Returns how far the end boundary
    /// moved, since the newly paged-in blocks may have changed size.
    ///
    /// # Panics
    ///
    /// Panics if the region is inactive.
    pub fn grow_up<T>(&mut self, tree: &mut T, n: usize) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        debug_assert!(self.to_page_in.is_empty(), "page-in queue not drained");
        assert!(self.is_active(), "no active region");
        self.maybe_check_layout(tree);
        self.invalidate_position_cache();

        let old_end = self.end.0.absolute_location(tree);
        while self.to_page_in.len() < n && self.start.0.has_previous(tree) {
            self.start.trawl_previous(tree, &mut self.to_page_in);
        }
        self.page(tree);
        self.end.0.absolute_location(tree) - old_end
    }

    /// Page in every block meeting `viewport` and page out the rest.
    ///
    /// Only blocks entering or leaving the window are touched. Paging may resize
    /// blocks, which moves everything after them; when that happens the
    /// viewport is shifted by the same amount and activation repeats until no
    /// further paging is needed.
    ///
    /// Returns the total distance a point preserved across the call (one of
    /// the window's boundaries) moved due to paging, or `0.0` if nothing was
    /// paged.
    ///
    /// # Panics
    ///
    /// Panics if the region's root has a parent or siblings.
    pub fn activate<T>(&mut self, tree: &mut T, viewport: Region) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.maybe_check_layout(tree);

        let mut viewport = viewport;
        let mut shift = 0.0;
        let mut rounds = 0_usize;
        loop {
            let preserve = self.plan(tree, viewport);

            debug_assert!(
                self.encloses_clipped(tree, viewport),
                "active region does not cover viewport {viewport:?}"
            );
            if cfg!(debug_assertions) {
                let incoming: HashSet<Id> = self.to_page_in.iter().copied().collect();
                debug_assert!(
                    !self.to_page_out.iter().any(|b| incoming.contains(b)),
                    "block queued for both page-in and page-out"
                );
            }

            if self.to_page_in.is_empty() && self.to_page_out.is_empty() {
                return shift;
            }

            let before = preserve.absolute_location(tree);
            self.page(tree);
            let delta = preserve.absolute_location(tree) - before;
            shift += delta;
            viewport = viewport.moved_by(delta);

            rounds += 1;
            if let Some(max) = self.options.max_rounds
                && rounds >= max.get()
            {
                warn!(rounds, shift, "activation did not settle; giving up");
                return shift;
            }
        }
    }

    /// Page out the whole window and become inactive.
    ///
    /// Does nothing if already inactive.
    pub fn reset<T>(&mut self, tree: &mut T)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        if !self.is_active() {
            return;
        }
        self.shrink_to_start(tree);
        let mut block = Some(self.start.0.point().block);
        while let Some(b) = block {
            self.to_page_out.push_back(b);
            block = tree.parent(b);
        }
        self.end.0.clear();
        self.start.0.clear();
        self.page(tree);
        debug!("active region reset");
    }

    /// Report that the subtree at `added` has just been linked into the tree.
    ///
    /// If the subtree starts strictly inside the window, the whole subtree is
    /// paged in immediately, parents before children.
    ///
    /// # Panics
    ///
    /// Panics if `added` is not in the managed tree.
    pub fn on_after_block_added<T>(&mut self, tree: &mut T, added: Id)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        if !self.is_active() {
            return;
        }
        let inside = is_between(&*tree, &self.start.0, &self.end.0, &Point::start_of(added))
            .expect("added block is not in the managed tree");
        if inside {
            self.page_in_completely(tree, added);
            self.invalidate_position_cache();
        }
    }

    /// Report that the subtree at `block` is about to be unlinked.
    ///
    /// Boundaries inside the subtree are moved just outside it so they stay
    /// valid after removal. Removing the root deactivates the region without
    /// paging anything out.
    pub fn on_before_block_removed<T>(&mut self, tree: &T, block: Id)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        if !self.is_active() {
            return;
        }
        if block == self.root {
            self.start.0.clear();
            self.end.0.clear();
            debug!("root removed; active region cleared");
            return;
        }

        let start_inside = is_descendant(tree, block, self.start.0.point().block);
        let end_inside = is_descendant(tree, block, self.end.0.point().block);
        match (start_inside, end_inside) {
            (true, true) => {
                let parent = tree
                    .parent(block)
                    .expect("removed block must be attached below the root");
                let collapsed = Point::start_of(parent);
                self.start.0.set(collapsed);
                self.end.0.set(collapsed);
            }
            (true, false) => {
                self.start.0.set(Point::end_of(block));
                self.start.0.next(tree);
            }
            (false, true) => {
                self.end.0.set(Point::start_of(block));
                self.end.0.previous(tree);
            }
            (false, false) => {}
        }
    }

    // --- internals ---

    /// Invalidates positions cached in the boundaries.
    ///
    /// Needed on every entry point whose control flow queries positions.
    fn invalidate_position_cache(&self) {
        self.start.0.invalidate_origin();
        self.end.0.invalidate_origin();
    }

    fn maybe_check_layout<T>(&self, tree: &T)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        if self.options.check_layout
            && let Err(err) = validate_layout(tree, self.root)
        {
            panic!("invalid block layout: {err}");
        }
    }

    /// Queue the paging for one round and return the point to preserve.
    fn plan<T>(&mut self, tree: &T, viewport: Region) -> Point<Id>
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let Some(active) = self.active_region(tree) else {
            let init = locate_start_within(tree, self.root, viewport.start)
                .expect("active region root must be a root block");
            debug!(?viewport, ?init, "initializing active region");
            self.init(tree, init);
            self.expand_to(tree, viewport);
            return self.start.0.point();
        };

        let overlap = Overlap::classify(viewport, active);
        debug!(?viewport, ?active, ?overlap, "adjusting active region");
        let preserve = match overlap {
            Overlap::FullyAfter => {
                let new_start = locate_start_after(tree, &self.end.0, viewport.start)
                    .expect("viewport starts after the active region");
                self.shrink_to_end(tree);
                self.move_active_point(tree, new_start);
                self.expand_to(tree, viewport);
                self.start.0.point()
            }
            Overlap::FullyBefore => {
                let new_end = locate_end_before(tree, &self.start.0, viewport.end)
                    .expect("viewport ends before the active region");
                self.shrink_to_start(tree);
                self.move_active_point(tree, new_end);
                self.expand_to(tree, viewport);
                self.end.0.point()
            }
            Overlap::Enclosed => {
                let preserve = self.start.0.point();
                self.start
                    .trawl_next_until(tree, viewport.start, &mut self.to_page_out);
                self.end
                    .trawl_previous_until(tree, viewport.end, &mut self.to_page_out);
                preserve
            }
            Overlap::Encloses => {
                self.expand_to(tree, viewport);
                self.start.0.point()
            }
            Overlap::IntersectsBefore => {
                let preserve = self.start.0.point();
                self.start
                    .trawl_previous_until(tree, viewport.start, &mut self.to_page_in);
                self.end
                    .trawl_previous_until(tree, viewport.end, &mut self.to_page_out);
                preserve
            }
            Overlap::IntersectsAfter => {
                self.start
                    .trawl_next_until(tree, viewport.start, &mut self.to_page_out);
                self.end
                    .trawl_next_until(tree, viewport.end, &mut self.to_page_in);
                self.start.0.point()
            }
        };
        trace!(
            page_in = self.to_page_in.len(),
            page_out = self.to_page_out.len(),
            "planned paging round"
        );
        preserve
    }

    /// Place both boundaries at `init` and queue its ancestry, root first.
    fn init<T>(&mut self, tree: &T, init: Point<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        debug_assert!(!self.is_active(), "already initialized");
        self.start.0.set(init);
        self.end.0.set(init);
        let mut ancestry: SmallVec<[Id; 16]> = SmallVec::new();
        let mut block = Some(init.block);
        while let Some(b) = block {
            ancestry.push(b);
            block = tree.parent(b);
        }
        self.to_page_in.extend(ancestry.into_iter().rev());
    }

    /// Grow a collapsed (or any) window out to cover `viewport`.
    fn expand_to<T>(&mut self, tree: &T, viewport: Region)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.start
            .trawl_previous_until(tree, viewport.start, &mut self.to_page_in);
        self.end
            .trawl_next_until(tree, viewport.end, &mut self.to_page_in);
    }

    fn shrink_to_start<T>(&mut self, tree: &T)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.end.0.get() != self.start.0.get() {
            self.end.trawl_previous(tree, &mut self.to_page_out);
        }
    }

    fn shrink_to_end<T>(&mut self, tree: &T)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        while self.start.0.get() != self.end.0.get() {
            self.start.trawl_next(tree, &mut self.to_page_out);
        }
    }

    /// Move a collapsed window to `point`.
    ///
    /// Ancestors unique to the old point are paged out, deepest first, and
    /// ancestors unique to the new point are paged in, shallowest first.
    fn move_active_point<T>(&mut self, tree: &T, point: Point<Id>)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        debug_assert_eq!(
            self.start.0.get(),
            self.end.0.get(),
            "window is not collapsed"
        );
        let old = self.start.0.point().block;
        let lca = match common_ancestor(tree, old, point.block) {
            Ok(lca) => lca.ancestor,
            Err(err) => panic!("cannot move active region to {point:?}: {err}"),
        };

        let mut block = Some(old);
        while let Some(b) = block
            && b != lca
        {
            self.to_page_out.push_back(b);
            block = tree.parent(b);
        }

        let mut fresh: SmallVec<[Id; 16]> = SmallVec::new();
        let mut block = Some(point.block);
        while let Some(b) = block
            && b != lca
        {
            fresh.push(b);
            block = tree.parent(b);
        }
        self.to_page_in.extend(fresh.into_iter().rev());

        self.start.0.set(point);
        self.end.0.set(point);
    }

    /// Page out, then page in, everything queued.
    fn page<T>(&mut self, tree: &mut T)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        // Outs go first so a block can be released before its replacement is built.
        while let Some(block) = self.to_page_out.pop_front() {
            trace!(?block, "page out");
            tree.page_out(block);
        }
        while let Some(block) = self.to_page_in.pop_front() {
            trace!(?block, "page in");
            tree.page_in(block);
        }
        self.invalidate_position_cache();
    }

    fn page_in_completely<T>(&self, tree: &mut T, block: Id)
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let mut stack = vec![block];
        while let Some(b) = stack.pop() {
            trace!(block = ?b, "page in (added)");
            tree.page_in(b);
            let mut child = tree.last_child(b);
            while let Some(c) = child {
                stack.push(c);
                child = tree.previous_sibling(c);
            }
        }
    }

    /// Whether the window covers `viewport` once clipped to the root's extent.
    fn encloses_clipped<T>(&self, tree: &T, viewport: Region) -> bool
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let bounds = Region::new(tree.start(self.root), tree.end(self.root));
        self.active_region(tree).is_some_and(|active| {
            Overlap::classify(active, viewport.clip_to(bounds)) == Overlap::Encloses
        })
    }
}
