use std::collections::VecDeque;

use itertools::Itertools;
use multi_watch_core::dashboard::ViewOptions;
use multi_watch_core::layout::Region;
use ratatui::layout::Rect;

/// Lines kept per view; older lines are dropped first.
pub const MAX_LINES: usize = 10_000;

/// One window's placement, settings and line buffer.
#[derive(Debug, Clone)]
pub struct View {
    region: Region,
    title: String,
    wrap: bool,
    autoscroll: bool,
    lines: VecDeque<String>,
}

impl View {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            title: String::new(),
            wrap: false,
            autoscroll: false,
            lines: VecDeque::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn configure(&mut self, options: ViewOptions) {
        self.title = options.title;
        self.wrap = options.wrap;
        self.autoscroll = options.autoscroll;
    }

    pub fn push_line(&mut self, line: String) {
        if self.lines.len() == MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The screen rectangle of the view.
    pub fn area(&self) -> Rect {
        Rect::new(
            self.region.x0,
            self.region.y0,
            self.region.width(),
            self.region.height(),
        )
    }

    /// The rows shown in a `width` x `height` content area.
    ///
    /// With autoscroll the last rows are shown, otherwise the first.
    pub fn visible_rows(&self, width: u16, height: u16) -> Vec<String> {
        let (width, height) = (usize::from(width), usize::from(height));
        if width == 0 || height == 0 {
            return Vec::new();
        }

        if !self.autoscroll {
            return self
                .lines
                .iter()
                .flat_map(|line| self.rows(line, width))
                .take(height)
                .collect();
        }

        // walk back from the newest line so only what fits gets wrapped
        let mut rows = Vec::with_capacity(height);
        'lines: for line in self.lines.iter().rev() {
            for row in self.rows(line, width).into_iter().rev() {
                rows.push(row);
                if rows.len() == height {
                    break 'lines;
                }
            }
        }
        rows.reverse();
        rows
    }

    fn rows(&self, line: &str, width: usize) -> Vec<String> {
        if !self.wrap {
            return vec![line.chars().take(width).collect()];
        }
        if line.is_empty() {
            return vec![String::new()];
        }

        let mut rows = Vec::new();
        for chunk in &line.chars().chunks(width) {
            rows.push(chunk.collect());
        }
        rows
    }
}
