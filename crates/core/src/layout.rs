//! Grid layout of command windows.
//!
//! [`compute`] is a pure function of the terminal size, the number of
//! commands and the minimum window size. It is re-run on every redraw,
//! and identical inputs always give identical regions.

use crate::config::{DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH};

/// A rectangle in character cells. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Region {
    pub fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u16 {
        self.x1.saturating_sub(self.x0) + 1
    }

    pub fn height(&self) -> u16 {
        self.y1.saturating_sub(self.y0) + 1
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutThresholds {
    pub min_width: u16,
    pub min_height: u16,
}

impl Default for LayoutThresholds {
    fn default() -> Self {
        Self {
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub cols: u16,
    pub rows: u16,
    pub window_width: u16,
    pub window_height: u16,
    /// One region per command, in command order.
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// The terminal cannot fit the grid; only a full-screen notice is shown.
    TooSmall { notice: Region },
    Grid(Grid),
}

impl Layout {
    pub fn is_too_small(&self) -> bool {
        matches!(self, Layout::TooSmall { .. })
    }
}

/// Tiles `count` windows over a `width` x `height` terminal, row-major.
pub fn compute(width: u16, height: u16, count: usize, thresholds: LayoutThresholds) -> Layout {
    let too_small = || Layout::TooSmall {
        notice: Region::new(0, 0, width.saturating_sub(1), height.saturating_sub(1)),
    };

    if width == 0 || height == 0 || width < thresholds.min_width || height < thresholds.min_height
    {
        return too_small();
    }

    if count == 0 {
        return Layout::Grid(Grid {
            cols: 0,
            rows: 0,
            window_width: 0,
            window_height: 0,
            regions: Vec::new(),
        });
    }

    let count = u32::try_from(count).unwrap_or(u32::MAX);
    let (width32, height32) = (u32::from(width), u32::from(height));
    let min_width = u32::from(thresholds.min_width);

    let mut cols = count;
    let mut rows = 1;
    if width32 / cols < min_width {
        // width >= min_width > 0 here, so at least one column fits
        cols = width32 / min_width;
        rows = count.div_ceil(cols);
    }

    let window_width = width32 / cols;
    let window_height = if rows == 1 {
        height32 - 1
    } else {
        height32 / rows
    };

    // zero thresholds still need at least one cell per window
    if window_width == 0
        || window_height == 0
        || window_width < min_width
        || window_height < u32::from(thresholds.min_height)
    {
        return too_small();
    }

    let regions = (0..count)
        .map(|i| {
            let (col, row) = (i % cols, i / cols);
            Region::new(
                cell(col * window_width),
                cell(row * window_height),
                cell((col + 1) * window_width - 1),
                cell((row + 1) * window_height - 1),
            )
        })
        .collect();

    Layout::Grid(Grid {
        cols: cell(cols),
        rows: cell(rows),
        window_width: cell(window_width),
        window_height: cell(window_height),
        regions,
    })
}

// Grid coordinates never exceed the terminal size, which fits in u16.
fn cell(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
