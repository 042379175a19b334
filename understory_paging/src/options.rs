// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for an [`ActiveRegion`](crate::ActiveRegion).

use core::num::NonZeroUsize;

/// Options controlling how an [`ActiveRegion`](crate::ActiveRegion) runs.
///
/// ```rust
/// use core::num::NonZeroUsize;
/// use understory_paging::PagingOptions;
///
/// let options = PagingOptions::new()
///     .with_check_layout(true)
///     .with_max_rounds(NonZeroUsize::new(8));
/// assert_eq!(options.max_rounds.map(NonZeroUsize::get), Some(8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagingOptions {
    /// Validate sibling layout with [`validate_layout`](crate::validate_layout)
    /// at the top of every activation and grow step, panicking on violations.
    ///
    /// Defaults to on in debug builds and off in release builds.
    pub check_layout: bool,
    /// Upper bound on paging rounds in one [`activate`](crate::ActiveRegion::activate) call.
    ///
    /// Paging can resize blocks, which shifts the viewport and triggers another
    /// round. `None` (the default) repeats until no paging is needed. When the
    /// bound is hit, a warning is logged and the shift so far is returned.
    pub max_rounds: Option<NonZeroUsize>,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            check_layout: cfg!(debug_assertions),
            max_rounds: None,
        }
    }
}

impl PagingOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn layout validation on or off.
    #[must_use]
    pub fn with_check_layout(mut self, check_layout: bool) -> Self {
        self.check_layout = check_layout;
        self
    }

    /// Bound the number of paging rounds per activation.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: Option<NonZeroUsize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}
