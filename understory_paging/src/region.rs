// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-dimensional regions and how two of them overlap.

/// A closed range of absolute positions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Region {
    /// Low end.
    pub start: f64,
    /// High end. Never less than `start`.
    pub end: f64,
}

impl Region {
    /// Create a region.
    ///
    /// Inputs are expected to be finite with `start <= end`.
    pub fn new(start: f64, end: f64) -> Self {
        debug_assert!(start <= end, "region start {start} is after its end {end}");
        Self { start, end }
    }

    /// The length of this region.
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Whether this region is a single position.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// This region translated by `delta`.
    #[must_use]
    pub fn moved_by(self, delta: f64) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// This region with both ends clamped into `bounds`.
    #[must_use]
    pub fn clip_to(self, bounds: Self) -> Self {
        Self {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }
}

/// How a region relates to a reference region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Overlap {
    /// Ends strictly before the reference starts.
    FullyBefore,
    /// Starts strictly after the reference ends.
    FullyAfter,
    /// Lies within the reference, without covering all of it.
    Enclosed,
    /// Covers all of the reference (inclusive at both ends).
    Encloses,
    /// Starts before the reference and ends inside it.
    IntersectsBefore,
    /// Starts inside the reference and ends after it.
    IntersectsAfter,
}

impl Overlap {
    /// Classify `region` against `reference`.
    ///
    /// Shared edges count as overlapping. A region equal to its reference
    /// classifies as [`Overlap::Encloses`].
    pub fn classify(region: Region, reference: Region) -> Self {
        if region.end < reference.start {
            Self::FullyBefore
        } else if region.start > reference.end {
            Self::FullyAfter
        } else if region.start <= reference.start && region.end >= reference.end {
            Self::Encloses
        } else if region.start >= reference.start && region.end <= reference.end {
            Self::Enclosed
        } else if region.start < reference.start {
            Self::IntersectsBefore
        } else {
            Self::IntersectsAfter
        }
    }
}
