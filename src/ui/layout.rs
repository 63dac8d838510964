//! Pane geometry: orientation, split ratio, zoom and scroll offsets.
//!
//! Pure state with clamped setters. The renderer reports content and
//! viewport heights back each frame so scrolling never runs past the end.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::config::PipelineSettings;

const DEFAULT_SPLIT_PERCENT: u16 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Issues left, detail right.
    #[default]
    Horizontal,
    /// Issues above, detail below.
    Vertical,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Issues,
    Detail,
}

/// A scrollable region's offset, clamped against its last known size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scroll {
    offset: u16,
    content: u16,
    viewport: u16,
}

impl Scroll {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn viewport(&self) -> u16 {
        self.viewport
    }

    fn max_offset(&self) -> u16 {
        self.content.saturating_sub(self.viewport)
    }

    /// Record the rendered size and re-clamp the offset.
    pub fn set_metrics(&mut self, content: u16, viewport: u16) {
        self.content = content;
        self.viewport = viewport;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn down(&mut self, lines: u16) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset());
    }

    pub fn up(&mut self, lines: u16) {
        self.offset = self.offset.saturating_sub(lines);
    }

    /// Half the viewport, at least one line.
    pub fn half_page(&self) -> u16 {
        (self.viewport / 2).max(1)
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Layout state of the two main panes and the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneLayout {
    orientation: Orientation,
    /// Share of the issues pane, per orientation.
    horizontal_percent: u16,
    vertical_percent: u16,
    zoom: Option<Pane>,
    min_percent: u16,
    max_percent: u16,
    pub detail_scroll: Scroll,
    pub popup_scroll: Scroll,
}

impl Default for PaneLayout {
    fn default() -> Self {
        Self::new(&PipelineSettings::default())
    }
}

impl PaneLayout {
    pub fn new(settings: &PipelineSettings) -> Self {
        let min_percent = settings.min_pane_percent;
        let max_percent = settings.max_pane_percent.max(min_percent);
        let split = DEFAULT_SPLIT_PERCENT.clamp(min_percent, max_percent);
        Self {
            orientation: Orientation::default(),
            horizontal_percent: split,
            vertical_percent: split,
            zoom: None,
            min_percent,
            max_percent,
            detail_scroll: Scroll::default(),
            popup_scroll: Scroll::default(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn toggle_orientation(&mut self) {
        self.orientation = self.orientation.toggled();
    }

    pub fn zoom(&self) -> Option<Pane> {
        self.zoom
    }

    /// Zoom `pane` to full screen, or restore the split if it already is.
    pub fn toggle_zoom(&mut self, pane: Pane) {
        self.zoom = if self.zoom == Some(pane) {
            None
        } else {
            Some(pane)
        };
    }

    /// Issues pane share for the current orientation.
    pub fn issues_percent(&self) -> u16 {
        match self.orientation {
            Orientation::Horizontal => self.horizontal_percent,
            Orientation::Vertical => self.vertical_percent,
        }
    }

    /// Grow `pane` by `delta` percent (negative shrinks), within bounds.
    pub fn resize(&mut self, pane: Pane, delta: i16) {
        let delta = match pane {
            Pane::Issues => delta,
            Pane::Detail => -delta,
        };
        let (min, max) = (self.min_percent, self.max_percent);
        let current = match self.orientation {
            Orientation::Horizontal => &mut self.horizontal_percent,
            Orientation::Vertical => &mut self.vertical_percent,
        };
        let next = (*current as i32 + delta as i32).clamp(min as i32, max as i32);
        *current = next as u16;
    }

    /// Split the main area into `(issues, detail)`; a zoomed-out pane gets
    /// `None`.
    pub fn split(&self, area: Rect) -> (Option<Rect>, Option<Rect>) {
        match self.zoom {
            Some(Pane::Issues) => return (Some(area), None),
            Some(Pane::Detail) => return (None, Some(area)),
            None => {}
        }
        let direction = match self.orientation {
            Orientation::Horizontal => Direction::Horizontal,
            Orientation::Vertical => Direction::Vertical,
        };
        let issues = self.issues_percent();
        let chunks = Layout::default()
            .direction(direction)
            .constraints([
                Constraint::Percentage(issues),
                Constraint::Percentage(100 - issues),
            ])
            .split(area);
        (Some(chunks[0]), Some(chunks[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_clamps_to_bounds() {
        let mut layout = PaneLayout::default();
        assert_eq!(layout.issues_percent(), 50);

        for _ in 0..20 {
            layout.resize(Pane::Issues, 5);
        }
        assert_eq!(layout.issues_percent(), 90);

        for _ in 0..20 {
            layout.resize(Pane::Detail, 5);
        }
        assert_eq!(layout.issues_percent(), 10);
    }

    #[test]
    fn test_ratio_is_per_orientation() {
        let mut layout = PaneLayout::default();
        layout.resize(Pane::Issues, 10);
        layout.toggle_orientation();
        assert_eq!(layout.orientation(), Orientation::Vertical);
        assert_eq!(layout.issues_percent(), 50);
        layout.toggle_orientation();
        assert_eq!(layout.issues_percent(), 60);
    }

    #[test]
    fn test_zoom_toggles() {
        let mut layout = PaneLayout::default();
        layout.toggle_zoom(Pane::Detail);
        assert_eq!(layout.zoom(), Some(Pane::Detail));
        layout.toggle_zoom(Pane::Issues);
        assert_eq!(layout.zoom(), Some(Pane::Issues));
        layout.toggle_zoom(Pane::Issues);
        assert_eq!(layout.zoom(), None);
    }

    #[test]
    fn test_split_respects_zoom_and_ratio() {
        let area = Rect::new(0, 0, 100, 40);
        let mut layout = PaneLayout::default();
        let (issues, detail) = layout.split(area);
        assert_eq!(issues.unwrap().width, 50);
        assert_eq!(detail.unwrap().x, 50);

        layout.toggle_zoom(Pane::Detail);
        assert_eq!(layout.split(area), (None, Some(area)));
    }

    #[test]
    fn test_scroll_clamps_to_content() {
        let mut scroll = Scroll::default();
        scroll.set_metrics(30, 10);
        scroll.down(50);
        assert_eq!(scroll.offset(), 20);
        assert_eq!(scroll.half_page(), 5);

        scroll.set_metrics(15, 10);
        assert_eq!(scroll.offset(), 5);
        scroll.up(100);
        assert_eq!(scroll.offset(), 0);
    }

    #[test]
    fn test_custom_bounds_from_settings() {
        let settings = PipelineSettings {
            min_pane_percent: 20,
            max_pane_percent: 70,
            ..PipelineSettings::default()
        };
        let mut layout = PaneLayout::new(&settings);
        layout.resize(Pane::Issues, 40);
        assert_eq!(layout.issues_percent(), 70);
    }
}
