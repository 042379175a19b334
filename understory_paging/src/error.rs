// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt::Debug;

use thiserror::Error;

/// Argument errors from point comparison and search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PagingError {
    /// A search was started from a block that has a parent or siblings.
    #[error("search root has a parent or siblings")]
    NotRoot,
    /// Two points were compared, or related, across different trees.
    #[error("points share no common ancestor")]
    Disjoint,
    /// A forward search started from a point that is not strictly before its target.
    #[error("starting point is not strictly before the target position")]
    NotBefore,
    /// A backward search started from a point that is not strictly after its target.
    #[error("starting point is not strictly after the target position")]
    NotAfter,
}

/// A sibling layout violation found by [`validate_layout`](crate::validate_layout).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LayoutError<Id: Debug> {
    /// The block ends before it starts.
    #[error("block {0:?} ends before it starts")]
    Inverted(Id),
    /// The block starts or ends before its previous sibling does.
    #[error("block {0:?} is out of order with its previous sibling")]
    OutOfOrder(Id),
    /// The block extends outside its parent's extent.
    #[error("block {0:?} is not contained in its parent")]
    Uncontained(Id),
    /// The block was reached twice while walking the tree.
    #[error("block {0:?} is reachable along more than one path")]
    Cycle(Id),
}
