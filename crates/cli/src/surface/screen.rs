use indexmap::IndexMap;
use log::debug;
use multi_watch_core::dashboard::{Surface, ViewOptions};
use multi_watch_core::error::{Error, Result};
use multi_watch_core::layout::Region;
use multi_watch_core::output::ViewUpdate;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::view::View;

/// The set of views on screen. Map order is z-order, last drawn on top.
#[derive(Debug, Default)]
pub struct Screen {
    size: (u16, u16),
    views: IndexMap<String, View>,
}

impl Screen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: (width, height),
            views: IndexMap::new(),
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// View names from bottom to top.
    pub fn z_order(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Append { view, line } => match self.views.get_mut(&view) {
                Some(target) => target.push_line(line),
                None => debug!("Dropping line for unknown view `{view}`"),
            },
            ViewUpdate::Clear { view } => match self.views.get_mut(&view) {
                Some(target) => target.clear(),
                None => debug!("Dropping clear for unknown view `{view}`"),
            },
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let bounds = frame.area();

        for view in self.views.values() {
            let area = view.area().intersection(bounds);
            if area.is_empty() {
                continue;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title(view.title().to_string());
            let inner = block.inner(area);
            let rows: Vec<Line> = view
                .visible_rows(inner.width, inner.height)
                .into_iter()
                .map(Line::from)
                .collect();

            frame.render_widget(Clear, area);
            frame.render_widget(Paragraph::new(rows).block(block), area);
        }
    }
}

impl Surface for Screen {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn set_view(&mut self, name: &str, region: Region) -> Result<bool> {
        if let Some(view) = self.views.get_mut(name) {
            view.set_region(region);
            return Ok(false);
        }

        self.views.insert(name.to_string(), View::new(region));
        Ok(true)
    }

    fn configure_view(&mut self, name: &str, options: ViewOptions) -> Result<()> {
        let view = self
            .views
            .get_mut(name)
            .ok_or_else(|| Error::UnknownView(name.to_string()))?;
        view.configure(options);
        Ok(())
    }

    fn set_view_on_top(&mut self, name: &str) -> Result<()> {
        let index = self
            .views
            .get_index_of(name)
            .ok_or_else(|| Error::UnknownView(name.to_string()))?;
        let last = self.views.len() - 1;
        self.views.move_index(index, last);
        Ok(())
    }

    fn delete_view(&mut self, name: &str) -> bool {
        self.views.shift_remove(name).is_some()
    }
}
