//! UI modes and how the run ends.

use super::edit::EditTarget;

/// The current mode of the state machine.
///
/// `Normal` shows both panes. The filter and search modes edit a bar under
/// the panes; every other mode draws a popup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    FilterFocused,
    SearchActive,
    Comments,
    Transitions,
    EditMenu,
    EditInput(EditTarget),
    Boards,
    CustomFields,
    ActionsHelp,
}

impl Mode {
    pub fn is_popup(&self) -> bool {
        !matches!(self, Mode::Normal | Mode::FilterFocused | Mode::SearchActive)
    }

    pub fn title(&self) -> String {
        match self {
            Mode::Normal => "Detail".to_string(),
            Mode::FilterFocused => "Filter".to_string(),
            Mode::SearchActive => "Search".to_string(),
            Mode::Comments => "Comments".to_string(),
            Mode::Transitions => "Transitions".to_string(),
            Mode::EditMenu => "Edit".to_string(),
            Mode::EditInput(target) => format!("Edit {}", target.label()),
            Mode::Boards => "Boards".to_string(),
            Mode::CustomFields => "Custom Fields".to_string(),
            Mode::ActionsHelp => "Actions".to_string(),
        }
    }
}

/// Why the event loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Quit,
    /// Choose mode confirmed this issue key.
    Chosen(String),
}
