// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Searching for the point nearest an absolute position.
//!
//! All searches skip whole subtrees using block extents: at each level the
//! candidate sibling is found by scanning from whichever end of the sibling run
//! is nearer the target, and only that sibling's subtree is descended into.

use crate::block::BlockTree;
use crate::error::PagingError;
use crate::point::{Point, Position};

/// Find the rightmost point in the tree at `root` that is strictly before `position`.
///
/// `position` is absolute. If no point is strictly before it, the start of
/// `root` is returned.
///
/// Returns [`PagingError::NotRoot`] if `root` has a parent or siblings.
pub fn locate_start_within<T: BlockTree + ?Sized>(
    tree: &T,
    root: T::Id,
    position: f64,
) -> Result<Point<T::Id>, PagingError> {
    if !tree.is_root(root) {
        return Err(PagingError::NotRoot);
    }
    let found = locate_start(tree, root, root, position);
    Ok(found.unwrap_or(Point::start_of(root)))
}

/// Find the leftmost point in the tree at `root` that is strictly after `position`.
///
/// `position` is absolute. If no point is strictly after it, the end of `root`
/// is returned.
///
/// Returns [`PagingError::NotRoot`] if `root` has a parent or siblings.
pub fn locate_end_within<T: BlockTree + ?Sized>(
    tree: &T,
    root: T::Id,
    position: f64,
) -> Result<Point<T::Id>, PagingError> {
    if !tree.is_root(root) {
        return Err(PagingError::NotRoot);
    }
    let found = locate_end(tree, root, root, position);
    Ok(found.unwrap_or(Point::end_of(root)))
}

/// Find the last point, at or after `point`, that is strictly before `position`.
///
/// Equivalent to stepping forward from `point` until passing `position` and
/// then stepping back once, but climbs out of subtrees that end before
/// `position` instead of visiting them.
///
/// Returns [`PagingError::NotBefore`] unless `point` is strictly before `position`.
pub fn locate_start_after<T, P>(
    tree: &T,
    point: &P,
    position: f64,
) -> Result<Point<T::Id>, PagingError>
where
    T: BlockTree + ?Sized,
    P: Position<T::Id> + ?Sized,
{
    // Rebase into the coordinate space of the point's block.
    let mut position = position - point.origin(tree);
    if !(point.location(tree) < position) {
        return Err(PagingError::NotBefore);
    }
    let mut block = point.point().block;

    if tree.end(block) >= position {
        // The answer lies between the start and end of this block.
        let found = locate_start(tree, block, block, position);
        return Ok(found.unwrap_or(Point::start_of(block)));
    }

    // Climb while the parent also ends before the position; every later sibling
    // on the way up is skipped. Invariant: `block` ends before `position`.
    loop {
        let Some(parent) = tree.parent(block) else {
            // Nothing follows the end of the root.
            return Ok(Point::end_of(block));
        };
        let parent_position = tree.children_origin(parent) + position;
        if tree.end(parent) < parent_position {
            block = parent;
            position = parent_position;
            continue;
        }
        // The parent ends at or after the position, so any better answer lies in
        // a later sibling of `block`.
        let answer = tree.next_sibling(block).and_then(|next| {
            let last = tree.last_child(parent)?;
            locate_start(tree, next, last, position)
        });
        return Ok(answer.unwrap_or(Point::end_of(block)));
    }
}

/// Find the first point, at or before `point`, that is strictly after `position`.
///
/// The mirror image of [`locate_start_after`].
///
/// Returns [`PagingError::NotAfter`] unless `point` is strictly after `position`.
pub fn locate_end_before<T, P>(
    tree: &T,
    point: &P,
    position: f64,
) -> Result<Point<T::Id>, PagingError>
where
    T: BlockTree + ?Sized,
    P: Position<T::Id> + ?Sized,
{
    let mut position = position - point.origin(tree);
    if !(point.location(tree) > position) {
        return Err(PagingError::NotAfter);
    }
    let mut block = point.point().block;

    if tree.start(block) <= position {
        let found = locate_end(tree, block, block, position);
        return Ok(found.unwrap_or(Point::end_of(block)));
    }

    // Invariant: `block` starts after `position`.
    loop {
        let Some(parent) = tree.parent(block) else {
            // Nothing precedes the start of the root.
            return Ok(Point::start_of(block));
        };
        let parent_position = tree.children_origin(parent) + position;
        if tree.start(parent) > parent_position {
            block = parent;
            position = parent_position;
            continue;
        }
        let answer = tree.previous_sibling(block).and_then(|previous| {
            let first = tree.first_child(parent)?;
            locate_end(tree, first, previous, position)
        });
        return Ok(answer.unwrap_or(Point::start_of(block)));
    }
}

/// Rightmost point strictly before `position` within the sibling run `first..=last`.
///
/// `position` is relative to the siblings' parent. Returns `None` if the run
/// starts at or after `position`.
fn locate_start<T: BlockTree + ?Sized>(
    tree: &T,
    mut first: T::Id,
    mut last: T::Id,
    mut position: f64,
) -> Option<Point<T::Id>> {
    // Best answer found so far in an enclosing block.
    let mut enclosing = None;
    loop {
        let from_first = position - tree.start(first);
        let to_last = tree.end(last) - position;

        if from_first <= 0.0 {
            //      [first] ... [last]
            //   <--|
            return enclosing;
        }
        if to_last < 0.0 {
            //      [first] ... [last]
            //                         |-->
            return Some(Point::end_of(last));
        }

        // The last sibling starting before the position holds the answer.
        let oldest = if first == last {
            first
        } else if from_first <= to_last {
            let mut oldest = first;
            while let Some(next) = tree.next_sibling(oldest)
                && tree.start(next) < position
            {
                oldest = next;
            }
            oldest
        } else {
            // `first` starts before the position, so this stops at or before it.
            let mut oldest = last;
            while tree.start(oldest) >= position {
                match tree.previous_sibling(oldest) {
                    Some(previous) => oldest = previous,
                    None => break,
                }
            }
            oldest
        };

        if tree.end(oldest) < position {
            return Some(Point::end_of(oldest));
        }
        //   [oldest]
        //     |<-->|
        enclosing = Some(Point::start_of(oldest));
        position -= tree.children_origin(oldest);
        match (tree.first_child(oldest), tree.last_child(oldest)) {
            (Some(f), Some(l)) => {
                first = f;
                last = l;
            }
            _ => return enclosing,
        }
    }
}

/// Leftmost point strictly after `position` within the sibling run `first..=last`.
///
/// `position` is relative to the siblings' parent. Returns `None` if the run
/// ends at or before `position`.
fn locate_end<T: BlockTree + ?Sized>(
    tree: &T,
    mut first: T::Id,
    mut last: T::Id,
    mut position: f64,
) -> Option<Point<T::Id>> {
    let mut enclosing = None;
    loop {
        let from_first = position - tree.start(first);
        let to_last = tree.end(last) - position;

        if to_last <= 0.0 {
            //      [first] ... [last]
            //                       |-->
            return enclosing;
        }
        if from_first < 0.0 {
            //        [first] ... [last]
            //   <--|
            return Some(Point::start_of(first));
        }

        // The first sibling ending after the position holds the answer.
        let youngest = if first == last {
            first
        } else if to_last <= from_first {
            let mut youngest = last;
            while let Some(previous) = tree.previous_sibling(youngest)
                && tree.end(previous) > position
            {
                youngest = previous;
            }
            youngest
        } else {
            // `last` ends after the position, so this stops at or before it.
            let mut youngest = first;
            while tree.end(youngest) <= position {
                match tree.next_sibling(youngest) {
                    Some(next) => youngest = next,
                    None => break,
                }
            }
            youngest
        };

        if tree.start(youngest) > position {
            return Some(Point::start_of(youngest));
        }
        enclosing = Some(Point::end_of(youngest));
        position -= tree.children_origin(youngest);
        match (tree.first_child(youngest), tree.last_child(youngest)) {
            (Some(f), Some(l)) => {
                first = f;
                last = l;
            }
            _ => return enclosing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::point::Cursor;
    use crate::tree::{NodeId, Tree};
    use alloc::vec;
    use alloc::vec::Vec;

    #[derive(Clone, Debug)]
    struct Span(f64, f64);

    impl Block for Span {
        fn start(&self) -> f64 {
            self.0
        }
        fn end(&self) -> f64 {
            self.1
        }
        fn children_origin(&self) -> f64 {
            self.0
        }
        fn page_in(&mut self) {}
        fn page_out(&mut self) {}
    }

    /// A root with `n` sections of width 10, each split into two halves.
    fn sections(n: usize) -> (Tree<Span>, NodeId) {
        let mut tree = Tree::new();
        #[allow(clippy::cast_precision_loss, reason = "Small test sizes.")]
        let width = 10.0 * n as f64;
        let root = tree.insert(Span(0.0, width));
        for i in 0..n {
            #[allow(clippy::cast_precision_loss, reason = "Small test sizes.")]
            let at = 10.0 * i as f64;
            let section = tree.insert(Span(at, at + 10.0));
            tree.append(root, section);
            let left = tree.insert(Span(0.0, 5.0));
            let right = tree.insert(Span(5.0, 10.0));
            tree.append(section, left);
            tree.append(section, right);
        }
        (tree, root)
    }

    fn all_points(tree: &Tree<Span>, root: NodeId) -> Vec<Point<NodeId>> {
        let mut cursor = Cursor::at(Point::start_of(root));
        let mut points = vec![cursor.point()];
        while cursor.has_next(tree) {
            cursor.next(tree);
            points.push(cursor.point());
        }
        points
    }

    /// Linear reference for `locate_start_within`.
    fn rightmost_before(tree: &Tree<Span>, root: NodeId, position: f64) -> Point<NodeId> {
        all_points(tree, root)
            .into_iter()
            .rev()
            .find(|p| p.absolute_location(tree) < position)
            .unwrap_or(Point::start_of(root))
    }

    /// Linear reference for `locate_end_within`.
    fn leftmost_after(tree: &Tree<Span>, root: NodeId, position: f64) -> Point<NodeId> {
        all_points(tree, root)
            .into_iter()
            .find(|p| p.absolute_location(tree) > position)
            .unwrap_or(Point::end_of(root))
    }

    #[test]
    fn within_matches_linear_scan() {
        let (tree, root) = sections(6);
        for step in -4..=124 {
            let position = f64::from(step) * 0.5;
            assert_eq!(
                locate_start_within(&tree, root, position),
                Ok(rightmost_before(&tree, root, position)),
                "start within at {position}"
            );
            assert_eq!(
                locate_end_within(&tree, root, position),
                Ok(leftmost_after(&tree, root, position)),
                "end within at {position}"
            );
        }
    }

    #[test]
    fn after_and_before_match_linear_scan() {
        let (tree, root) = sections(5);
        let points = all_points(&tree, root);
        for (i, from) in points.iter().enumerate() {
            let here = from.absolute_location(&tree);
            for step in -2..=104 {
                let position = f64::from(step) * 0.5;
                if here < position {
                    // Last point at or after `from` that is still before the position.
                    let expected = points[i..]
                        .iter()
                        .take_while(|p| p.absolute_location(&tree) < position)
                        .last()
                        .copied();
                    assert_eq!(
                        locate_start_after(&tree, from, position).ok(),
                        expected,
                        "start after {from:?} at {position}"
                    );
                } else {
                    assert_eq!(
                        locate_start_after(&tree, from, position),
                        Err(PagingError::NotBefore)
                    );
                }
                if here > position {
                    let expected = points[..=i]
                        .iter()
                        .rev()
                        .take_while(|p| p.absolute_location(&tree) > position)
                        .last()
                        .copied();
                    assert_eq!(
                        locate_end_before(&tree, from, position).ok(),
                        expected,
                        "end before {from:?} at {position}"
                    );
                }
            }
        }
    }

    #[test]
    fn non_root_is_rejected() {
        let (tree, root) = sections(2);
        let child = tree.first_child_of(root).unwrap();
        assert_eq!(
            locate_start_within(&tree, child, 1.0),
            Err(PagingError::NotRoot)
        );
        assert_eq!(
            locate_end_within(&tree, child, 1.0),
            Err(PagingError::NotRoot)
        );
    }
}
