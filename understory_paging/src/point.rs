// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Points on block boundaries: ordering, absolute locations, and cursor movement.

use core::cell::Cell;
use core::cmp::Ordering;

use crate::block::BlockTree;
use crate::error::PagingError;

/// A side of a block.
///
/// `Start` orders before `End`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    /// The start of a block.
    Start,
    /// The end of a block.
    End,
}

impl Side {
    /// The location of this side of `block`, relative to its parent.
    pub fn of<T: BlockTree + ?Sized>(self, tree: &T, block: T::Id) -> f64 {
        match self {
            Self::Start => tree.start(block),
            Self::End => tree.end(block),
        }
    }
}

/// A side of a particular block.
///
/// This is a plain value. Absolute locations are recomputed from the tree on
/// every query; use a [`Cursor`] to walk and cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point<Id> {
    /// Which side of the block.
    pub side: Side,
    /// The block.
    pub block: Id,
}

impl<Id> Point<Id> {
    /// Create a point.
    pub const fn new(side: Side, block: Id) -> Self {
        Self { side, block }
    }

    /// The start of `block`.
    pub const fn start_of(block: Id) -> Self {
        Self::new(Side::Start, block)
    }

    /// The end of `block`.
    pub const fn end_of(block: Id) -> Self {
        Self::new(Side::End, block)
    }
}

/// Behavior shared by [`Point`] and [`Cursor`]: locations and ordering.
pub trait Position<Id: Copy + Eq> {
    /// The block side this position currently designates.
    fn point(&self) -> Point<Id>;

    /// Absolute offset of the coordinate space this position's location is expressed in.
    ///
    /// That is the sum of the children origins of every strict ancestor of the block.
    fn origin<T>(&self, tree: &T) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        origin_of(tree, self.point().block)
    }

    /// Location of this position, relative to its block's parent.
    fn location<T>(&self, tree: &T) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        let point = self.point();
        point.side.of(tree, point.block)
    }

    /// Absolute location of this position.
    fn absolute_location<T>(&self, tree: &T) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        self.origin(tree) + self.location(tree)
    }

    /// Compare two positions in document order.
    ///
    /// Points on the same block order `Start` before `End`. A start point of an
    /// ancestor precedes everything inside it, and an end point follows it.
    /// Otherwise the children of the lowest common ancestor that lead to each
    /// point are compared by sibling order.
    ///
    /// This is not constant time: it walks both ancestor chains and then, in the
    /// worst case, a run of siblings, so it may approach linear time on very
    /// deep or very wide trees.
    ///
    /// Returns [`PagingError::Disjoint`] if the two points are in different trees.
    fn compare<T, P>(&self, tree: &T, other: &P) -> Result<Ordering, PagingError>
    where
        T: BlockTree<Id = Id> + ?Sized,
        P: Position<Id> + ?Sized,
    {
        compare_points(tree, self.point(), other.point())
    }
}

impl<Id: Copy + Eq> Position<Id> for Point<Id> {
    fn point(&self) -> Self {
        *self
    }
}

/// Sum of children origins over the strict ancestors of `block`.
pub(crate) fn origin_of<T: BlockTree + ?Sized>(tree: &T, block: T::Id) -> f64 {
    let mut origin = 0.0;
    let mut parent = tree.parent(block);
    while let Some(p) = parent {
        origin += tree.children_origin(p);
        parent = tree.parent(p);
    }
    origin
}

fn depth_of<T: BlockTree + ?Sized>(tree: &T, block: T::Id) -> usize {
    let mut depth = 0;
    let mut parent = tree.parent(block);
    while let Some(p) = parent {
        depth += 1;
        parent = tree.parent(p);
    }
    depth
}

/// The lowest common ancestor of two blocks, with the child of it on each side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CommonAncestor<Id> {
    pub(crate) ancestor: Id,
    /// Child of `ancestor` on the path to the first block; `None` if the first block is `ancestor`.
    pub(crate) first_child: Option<Id>,
    /// Child of `ancestor` on the path to the second block; `None` if the second block is `ancestor`.
    pub(crate) second_child: Option<Id>,
}

pub(crate) fn common_ancestor<T: BlockTree + ?Sized>(
    tree: &T,
    first: T::Id,
    second: T::Id,
) -> Result<CommonAncestor<T::Id>, PagingError> {
    let (mut a, mut b) = (first, second);
    let (mut a_child, mut b_child) = (None, None);
    let (mut a_depth, mut b_depth) = (depth_of(tree, a), depth_of(tree, b));

    // Level the deeper chain, then climb both in lockstep.
    while a_depth > b_depth {
        a_child = Some(a);
        a = tree.parent(a).ok_or(PagingError::Disjoint)?;
        a_depth -= 1;
    }
    while b_depth > a_depth {
        b_child = Some(b);
        b = tree.parent(b).ok_or(PagingError::Disjoint)?;
        b_depth -= 1;
    }
    while a != b {
        match (tree.parent(a), tree.parent(b)) {
            (Some(pa), Some(pb)) => {
                a_child = Some(a);
                b_child = Some(b);
                a = pa;
                b = pb;
            }
            _ => return Err(PagingError::Disjoint),
        }
    }
    Ok(CommonAncestor {
        ancestor: a,
        first_child: a_child,
        second_child: b_child,
    })
}

fn compare_points<T: BlockTree + ?Sized>(
    tree: &T,
    a: Point<T::Id>,
    b: Point<T::Id>,
) -> Result<Ordering, PagingError> {
    if a.block == b.block {
        return Ok(a.side.cmp(&b.side));
    }
    let lca = common_ancestor(tree, a.block, b.block)?;
    Ok(match (lca.first_child, lca.second_child) {
        // `b` is inside `a`'s block.
        (None, _) => match a.side {
            Side::Start => Ordering::Less,
            Side::End => Ordering::Greater,
        },
        // `a` is inside `b`'s block.
        (_, None) => match b.side {
            Side::Start => Ordering::Greater,
            Side::End => Ordering::Less,
        },
        (Some(a_child), Some(b_child)) => {
            let mut sibling = tree.next_sibling(a_child);
            while let Some(s) = sibling {
                if s == b_child {
                    return Ok(Ordering::Less);
                }
                sibling = tree.next_sibling(s);
            }
            Ordering::Greater
        }
    })
}

/// Whether `point` lies strictly between `start` and `end`.
///
/// Like [`Position::compare`], this is not constant time.
pub fn is_between<T, A, B, C>(tree: &T, start: &A, end: &B, point: &C) -> Result<bool, PagingError>
where
    T: BlockTree + ?Sized,
    A: Position<T::Id> + ?Sized,
    B: Position<T::Id> + ?Sized,
    C: Position<T::Id> + ?Sized,
{
    let after_start = start.compare(tree, point)? == Ordering::Less;
    Ok(after_start && point.compare(tree, end)? == Ordering::Less)
}

/// Whether `block` is `ancestor` or one of its descendants.
pub fn is_descendant<T: BlockTree + ?Sized>(tree: &T, ancestor: T::Id, block: T::Id) -> bool {
    let mut current = Some(block);
    while let Some(b) = current {
        if b == ancestor {
            return true;
        }
        current = tree.parent(b);
    }
    false
}

/// A movable point.
///
/// A cursor is either unplaced or designates a [`Point`]. It walks the tree in
/// document order with [`Cursor::next`] and [`Cursor::previous`], and caches
/// its absolute [origin](Position::origin), adjusting the cache as it crosses
/// parent/child boundaries.
///
/// The cache is only as fresh as the tree: any change to an ancestor's extent or
/// children origin, including one caused by paging, leaves it stale until
/// [`Cursor::invalidate_origin`] is called.
#[derive(Clone, Debug)]
pub struct Cursor<Id> {
    at: Option<Point<Id>>,
    cached_origin: Cell<Option<f64>>,
}

impl<Id> Default for Cursor<Id> {
    fn default() -> Self {
        Self::unplaced()
    }
}

impl<Id: Copy + Eq> Position<Id> for Cursor<Id> {
    /// # Panics
    ///
    /// Panics if the cursor is unplaced.
    fn point(&self) -> Point<Id> {
        self.at.expect("cursor is not placed")
    }

    fn origin<T>(&self, tree: &T) -> f64
    where
        T: BlockTree<Id = Id> + ?Sized,
    {
        if let Some(origin) = self.cached_origin.get() {
            return origin;
        }
        let origin = origin_of(tree, self.point().block);
        self.cached_origin.set(Some(origin));
        origin
    }
}

impl<Id> Cursor<Id> {
    /// A cursor that designates nothing.
    pub const fn unplaced() -> Self {
        Self {
            at: None,
            cached_origin: Cell::new(None),
        }
    }

    /// Whether this cursor designates a point.
    pub const fn is_placed(&self) -> bool {
        self.at.is_some()
    }

    /// Drop any cached origin.
    ///
    /// Call this whenever the tree may have changed since the last location query.
    pub fn invalidate_origin(&self) {
        self.cached_origin.set(None);
    }

    /// Unplace this cursor.
    pub fn clear(&mut self) {
        self.at = None;
        self.invalidate_origin();
    }

    fn shift_origin(&self, shift: f64) {
        if let Some(origin) = self.cached_origin.get() {
            self.cached_origin.set(Some(origin + shift));
        }
    }
}

impl<Id: Copy + Eq> Cursor<Id> {
    /// A cursor placed at `point`.
    pub const fn at(point: Point<Id>) -> Self {
        Self {
            at: Some(point),
            cached_origin: Cell::new(None),
        }
    }

    /// The designated point, if placed.
    pub const fn get(&self) -> Option<Point<Id>> {
        self.at
    }

    /// Place this cursor at `point`.
    pub fn set(&mut self, point: Point<Id>) {
        self.at = Some(point);
        self.invalidate_origin();
    }

    /// Whether [`Cursor::next`] may be called.
    pub fn has_next<T: BlockTree<Id = Id> + ?Sized>(&self, tree: &T) -> bool {
        let Point { side, block } = self.point();
        !(side == Side::End && tree.is_root(block))
    }

    /// Whether [`Cursor::previous`] may be called.
    pub fn has_previous<T: BlockTree<Id = Id> + ?Sized>(&self, tree: &T) -> bool {
        let Point { side, block } = self.point();
        !(side == Side::Start && tree.is_root(block))
    }

    /// Move to the next point in document order.
    ///
    /// # Panics
    ///
    /// Panics at the end of the root; guard with [`Cursor::has_next`].
    pub fn next<T: BlockTree<Id = Id> + ?Sized>(&mut self, tree: &T) {
        let Point { side, block } = self.point();
        let next = match side {
            Side::Start => match tree.first_child(block) {
                Some(child) => {
                    self.shift_origin(tree.children_origin(block));
                    Point::start_of(child)
                }
                None => Point::end_of(block),
            },
            Side::End => {
                if let Some(sibling) = tree.next_sibling(block) {
                    Point::start_of(sibling)
                } else if let Some(parent) = tree.parent(block) {
                    self.shift_origin(-tree.children_origin(parent));
                    Point::end_of(parent)
                } else {
                    panic!("next() called without has_next()");
                }
            }
        };
        self.at = Some(next);
    }

    /// Move to the previous point in document order.
    ///
    /// # Panics
    ///
    /// Panics at the start of the root; guard with [`Cursor::has_previous`].
    pub fn previous<T: BlockTree<Id = Id> + ?Sized>(&mut self, tree: &T) {
        let Point { side, block } = self.point();
        let previous = match side {
            Side::End => match tree.last_child(block) {
                Some(child) => {
                    self.shift_origin(tree.children_origin(block));
                    Point::end_of(child)
                }
                None => Point::start_of(block),
            },
            Side::Start => {
                if let Some(sibling) = tree.previous_sibling(block) {
                    Point::end_of(sibling)
                } else if let Some(parent) = tree.parent(block) {
                    self.shift_origin(-tree.children_origin(parent));
                    Point::start_of(parent)
                } else {
                    panic!("previous() called without has_previous()");
                }
            }
        };
        self.at = Some(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::tree::{NodeId, Tree};
    use alloc::vec;
    use alloc::vec::Vec;

    #[derive(Clone, Debug)]
    struct Span {
        start: f64,
        end: f64,
        children_origin: f64,
    }

    impl Block for Span {
        fn start(&self) -> f64 {
            self.start
        }
        fn end(&self) -> f64 {
            self.end
        }
        fn children_origin(&self) -> f64 {
            self.children_origin
        }
        fn page_in(&mut self) {}
        fn page_out(&mut self) {}
    }

    fn span(start: f64, end: f64) -> Span {
        // Children are laid out relative to this block's own start.
        Span {
            start,
            end,
            children_origin: start,
        }
    }

    /// ```text
    /// root [0, 30]
    /// ├── a [0, 10]
    /// │   ├── a1 [0, 4]
    /// │   └── a2 [4, 10]
    /// └── b [10, 30]
    ///     └── b1 [5, 15]
    /// ```
    fn fixture() -> (Tree<Span>, [NodeId; 6]) {
        let mut tree = Tree::new();
        let root = tree.insert(span(0.0, 30.0));
        let a = tree.insert(span(0.0, 10.0));
        let a1 = tree.insert(span(0.0, 4.0));
        let a2 = tree.insert(span(4.0, 10.0));
        let b = tree.insert(span(10.0, 30.0));
        let b1 = tree.insert(span(5.0, 15.0));
        tree.append(root, a);
        tree.append(root, b);
        tree.append(a, a1);
        tree.append(a, a2);
        tree.append(b, b1);
        (tree, [root, a, a1, a2, b, b1])
    }

    fn document_order(tree: &Tree<Span>, root: NodeId) -> Vec<Point<NodeId>> {
        let mut cursor = Cursor::at(Point::start_of(root));
        let mut points = vec![cursor.point()];
        while cursor.has_next(tree) {
            cursor.next(tree);
            points.push(cursor.point());
        }
        points
    }

    #[test]
    fn walks_every_point_in_document_order() {
        let (tree, [root, a, a1, a2, b, b1]) = fixture();
        let points = document_order(&tree, root);
        assert_eq!(
            points,
            vec![
                Point::start_of(root),
                Point::start_of(a),
                Point::start_of(a1),
                Point::end_of(a1),
                Point::start_of(a2),
                Point::end_of(a2),
                Point::end_of(a),
                Point::start_of(b),
                Point::start_of(b1),
                Point::end_of(b1),
                Point::end_of(b),
                Point::end_of(root),
            ]
        );

        // Walking back retraces the same points.
        let mut cursor = Cursor::at(Point::end_of(root));
        let mut back = vec![cursor.point()];
        while cursor.has_previous(&tree) {
            cursor.previous(&tree);
            back.push(cursor.point());
        }
        back.reverse();
        assert_eq!(points, back);
    }

    #[test]
    fn ordering_agrees_with_document_order() {
        let (tree, [root, ..]) = fixture();
        let points = document_order(&tree, root);
        for (i, p) in points.iter().enumerate() {
            for (j, q) in points.iter().enumerate() {
                assert_eq!(p.compare(&tree, q), Ok(i.cmp(&j)), "{p:?} vs {q:?}");
            }
        }
    }

    #[test]
    fn cached_origin_tracks_movement() {
        let (tree, [root, _, a1, _, b, b1]) = fixture();
        let mut cursor = Cursor::at(Point::start_of(root));
        // Prime the cache, then walk and compare against a fresh computation.
        let _ = cursor.absolute_location(&tree);
        while cursor.has_next(&tree) {
            cursor.next(&tree);
            let fresh = cursor.point().absolute_location(&tree);
            assert_eq!(cursor.absolute_location(&tree), fresh);
        }
        while cursor.has_previous(&tree) {
            cursor.previous(&tree);
            let fresh = cursor.point().absolute_location(&tree);
            assert_eq!(cursor.absolute_location(&tree), fresh);
        }

        assert_eq!(Point::end_of(a1).absolute_location(&tree), 4.0);
        assert_eq!(Point::start_of(b).absolute_location(&tree), 10.0);
        assert_eq!(Point::start_of(b1).absolute_location(&tree), 15.0);
        assert_eq!(Point::end_of(b1).absolute_location(&tree), 25.0);
    }

    #[test]
    fn stale_cache_until_invalidated() {
        let (mut tree, [_, _, _, _, b, b1]) = fixture();
        let cursor = Cursor::at(Point::start_of(b1));
        assert_eq!(cursor.absolute_location(&tree), 15.0);

        tree.get_mut(b).unwrap().children_origin = 12.0;
        assert_eq!(
            cursor.absolute_location(&tree),
            15.0,
            "cache is not refreshed implicitly"
        );
        cursor.invalidate_origin();
        assert_eq!(cursor.absolute_location(&tree), 17.0);
    }

    #[test]
    fn disjoint_points_do_not_compare() {
        let (mut tree, [root, ..]) = fixture();
        let stranger = tree.insert(span(0.0, 1.0));
        assert_eq!(
            Point::start_of(root).compare(&tree, &Point::start_of(stranger)),
            Err(PagingError::Disjoint)
        );
    }

    #[test]
    fn betweenness_and_descent() {
        let (tree, [root, a, a1, a2, b, b1]) = fixture();
        let start = Point::end_of(a1);
        let end = Point::start_of(b1);
        assert_eq!(
            is_between(&tree, &start, &end, &Point::start_of(a2)),
            Ok(true)
        );
        assert_eq!(
            is_between(&tree, &start, &end, &Point::start_of(b)),
            Ok(true)
        );
        assert_eq!(is_between(&tree, &start, &end, &start), Ok(false));
        assert_eq!(
            is_between(&tree, &start, &end, &Point::end_of(b1)),
            Ok(false)
        );

        assert!(is_descendant(&tree, root, b1));
        assert!(is_descendant(&tree, a, a));
        assert!(!is_descendant(&tree, a, b1));
    }

    #[test]
    #[should_panic(expected = "without has_next")]
    fn next_past_the_end_panics() {
        let (tree, [root, ..]) = fixture();
        let mut cursor = Cursor::at(Point::end_of(root));
        cursor.next(&tree);
    }
}
