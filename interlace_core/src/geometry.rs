// Copyright 2026 the Interlace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid extents and block rectangles.
//!
//! A [`Geometry`] is the pixel grid a run covers. A [`Block`] is one fill
//! request handed to the sink. Blocks are never clamped to the grid: early
//! blocks may overhang the right and bottom edges, and consumers clip them
//! with [`Block::clip_to`] or [`Block::clipped_rect`] while drawing.

use kurbo::Rect;

use crate::error::InterlaceError;

/// The extent of the pixel grid covered by a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    /// Creates a geometry, rejecting grids with no pixels.
    pub const fn new(width: u32, height: u32) -> Result<Self, InterlaceError> {
        if width == 0 || height == 0 {
            return Err(InterlaceError::EmptyGeometry { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(self) -> u32 {
        self.height
    }

    /// Number of pixels in the grid.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// The grid as a rectangle anchored at the origin.
    #[must_use]
    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// An axis-aligned block of pixels, identified by its top-left corner and
/// size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Block {
    /// Creates a block.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the pixel at `(x, y)` lies inside this block.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The part of this block that lies inside `geometry`, or `None` if the
    /// block is entirely outside it.
    #[must_use]
    pub fn clip_to(self, geometry: Geometry) -> Option<Self> {
        if !geometry.contains(self.x, self.y) {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: self.right().min(geometry.width()) - self.x,
            height: self.bottom().min(geometry.height()) - self.y,
        })
    }

    /// The block as a rectangle in pixel space.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.width),
            f64::from(self.y) + f64::from(self.height),
        )
    }

    /// The block intersected with the grid bounds, ready to hand to a 2D
    /// drawing API. Returns `None` when nothing of the block is visible.
    #[must_use]
    pub fn clipped_rect(self, geometry: Geometry) -> Option<Rect> {
        let rect = self.to_rect().intersect(geometry.bounds());
        if rect.area() > 0.0 { Some(rect) } else { None }
    }
}
