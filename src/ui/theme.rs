//! Colors and shared styles.

use ratatui::style::{Color, Modifier, Style};

/// Color theme for the application.
pub struct Theme {
    pub accent: Color,
    pub dim: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// Background of the selected row.
    pub selection: Color,
}

const THEME: Theme = Theme {
    accent: Color::Cyan,
    dim: Color::DarkGray,
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::Red,
    selection: Color::DarkGray,
};

pub fn theme() -> &'static Theme {
    &THEME
}

impl Theme {
    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.dim)
        }
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Color of a workflow status, guessed from its name.
    pub fn status_color(&self, status: &str) -> Color {
        let status = status.to_lowercase();
        if ["done", "closed", "resolved"].iter().any(|s| status.contains(s)) {
            self.success
        } else if status.contains("block") {
            self.error
        } else if ["progress", "review"].iter().any(|s| status.contains(s)) {
            self.warning
        } else {
            Color::Reset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colors() {
        let t = theme();
        assert_eq!(t.status_color("Done"), Color::Green);
        assert_eq!(t.status_color("In Progress"), Color::Yellow);
        assert_eq!(t.status_color("Blocked"), Color::Red);
        assert_eq!(t.status_color("To Do"), Color::Reset);
    }
}
