// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout validation for block trees.

use alloc::vec;

use hashbrown::HashSet;

use crate::block::BlockTree;
use crate::error::LayoutError;

/// Check the layout assumptions the paging engine relies on.
///
/// Walks the tree under `root` and reports the first block that
/// - ends before it starts,
/// - starts or ends before its previous sibling does,
/// - lies outside its parent's extent (once placed by the parent's children origin), or
/// - is reached twice.
///
/// Search and activation results are unspecified on trees that fail this check.
/// This is a full walk, so it is meant for debug builds and tests; see
/// [`PagingOptions::check_layout`](crate::PagingOptions::check_layout).
pub fn validate_layout<T: BlockTree + ?Sized>(
    tree: &T,
    root: T::Id,
) -> Result<(), LayoutError<T::Id>> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(block) = stack.pop() {
        if !seen.insert(block) {
            return Err(LayoutError::Cycle(block));
        }
        let (start, end) = (tree.start(block), tree.end(block));
        if end < start {
            return Err(LayoutError::Inverted(block));
        }

        let origin = tree.children_origin(block);
        let mut previous: Option<(f64, f64)> = None;
        let mut child = tree.first_child(block);
        while let Some(c) = child {
            let (c_start, c_end) = (tree.start(c), tree.end(c));
            if let Some((p_start, p_end)) = previous
                && (c_start < p_start || c_end < p_end)
            {
                return Err(LayoutError::OutOfOrder(c));
            }
            if origin + c_start < start || origin + c_end > end {
                return Err(LayoutError::Uncontained(c));
            }
            previous = Some((c_start, c_end));
            stack.push(c);
            child = tree.next_sibling(c);
        }
    }
    Ok(())
}
