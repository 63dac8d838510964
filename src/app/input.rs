//! Key handling, one function per mode.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::events::keys::{alt, ctrl, plain};
use crate::ui::layout::Pane;

use super::edit::EditTarget;
use super::filter::{find_match, SearchDirection};
use super::mode::{Mode, RunOutcome};
use super::{App, EDIT_MENU};

const SCROLL_LINES: u16 = 1;
const RESIZE_STEP: i16 = 5;

impl App {
    /// Handle a key press. Returns an outcome when the run should end.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<RunOutcome> {
        if ctrl(&key, 'c') {
            return Some(RunOutcome::Quit);
        }
        match self.mode.clone() {
            Mode::Normal => return self.normal_key(key, now),
            Mode::FilterFocused => self.filter_key(key, now),
            Mode::SearchActive => self.search_key(key, now),
            Mode::Comments => self.comments_key(key, now),
            Mode::Transitions => self.transitions_key(key),
            Mode::EditMenu => self.edit_menu_key(key),
            Mode::EditInput(target) => self.edit_input_key(key, &target),
            Mode::Boards => self.boards_key(key),
            Mode::CustomFields => self.custom_fields_key(key),
            Mode::ActionsHelp => self.help_key(key),
        }
        None
    }

    fn normal_key(&mut self, key: KeyEvent, now: Instant) -> Option<RunOutcome> {
        if ctrl(&key, 'd') {
            let lines = self.layout.detail_scroll.half_page();
            self.layout.detail_scroll.down(lines);
            return None;
        }
        if ctrl(&key, 'u') {
            let lines = self.layout.detail_scroll.half_page();
            self.layout.detail_scroll.up(lines);
            return None;
        }
        if alt(&key, 'h') {
            self.layout.resize(Pane::Issues, -RESIZE_STEP);
            return None;
        }
        if alt(&key, 'l') {
            self.layout.resize(Pane::Issues, RESIZE_STEP);
            return None;
        }

        match key.code {
            KeyCode::Down => self.select_next(now),
            KeyCode::Up => self.select_prev(now),
            KeyCode::Tab => self.layout.toggle_orientation(),
            KeyCode::Esc => return Some(RunOutcome::Quit),
            KeyCode::Enter => {
                if self.choose_mode {
                    return self.selected_key().map(RunOutcome::Chosen);
                }
                self.open_selected();
            }
            _ => match plain(&key) {
                Some('q') => return Some(RunOutcome::Quit),
                Some('j') => self.select_next(now),
                Some('k') => self.select_prev(now),
                Some('J') => self.layout.detail_scroll.down(SCROLL_LINES),
                Some('K') => self.layout.detail_scroll.up(SCROLL_LINES),
                Some('f') => self.mode = Mode::FilterFocused,
                Some('F') => {
                    self.apply_filter("", now);
                    self.status = "Filter cleared".to_string();
                }
                Some('/') => {
                    self.search_input = self.last_search.clone().unwrap_or_default();
                    self.mode = Mode::SearchActive;
                }
                Some('n') => self.repeat_search(SearchDirection::Forward, now),
                Some('N') => self.repeat_search(SearchDirection::Backward, now),
                Some('c') => self.enter_mode(Mode::Comments),
                Some('t') => self.enter_mode(Mode::Transitions),
                Some('e') => self.enter_mode(Mode::EditMenu),
                Some('u') => self.enter_mode(Mode::CustomFields),
                Some('b') => self.enter_mode(Mode::Boards),
                Some('?') => self.enter_mode(Mode::ActionsHelp),
                Some('r') => self.reload(),
                Some('o') => self.open_selected(),
                Some('1') => self.layout.toggle_zoom(Pane::Issues),
                Some('2') => self.layout.toggle_zoom(Pane::Detail),
                _ => {}
            },
        }
        None
    }

    fn filter_key(&mut self, key: KeyEvent, now: Instant) {
        if ctrl(&key, 'u') {
            self.apply_filter("", now);
            return;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                let mut text = self.filter.clone();
                text.pop();
                self.apply_filter(&text, now);
            }
            _ => {
                if let Some(c) = plain(&key) {
                    let text = format!("{}{}", self.filter, c);
                    self.apply_filter(&text, now);
                }
            }
        }
    }

    fn search_key(&mut self, key: KeyEvent, now: Instant) {
        if ctrl(&key, 'u') {
            self.search_input.clear();
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.search_input.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let query = std::mem::take(&mut self.search_input);
                if query.trim().is_empty() {
                    return;
                }
                self.last_search = Some(query);
                self.repeat_search(SearchDirection::Forward, now);
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            _ => {
                if let Some(c) = plain(&key) {
                    self.search_input.push(c);
                }
            }
        }
    }

    fn repeat_search(&mut self, direction: SearchDirection, now: Instant) {
        let Some(query) = self.last_search.clone() else {
            self.status = "No previous search".to_string();
            return;
        };
        match find_match(
            self.caches.issue_list(),
            &self.visible,
            self.selected,
            &query,
            direction,
        ) {
            Some(position) => {
                self.select(position, now);
                self.status = format!("/{}", query);
            }
            None => self.status = format!("No match for '{}'", query),
        }
    }

    /// Keys shared by list popups. Returns true when handled.
    fn popup_nav_key(&mut self, key: &KeyEvent) -> bool {
        match plain(key) {
            Some('n') => self.popup_next(),
            Some('p') => self.popup_prev(),
            _ => match key.code {
                KeyCode::Esc => self.close_popup(),
                _ => return false,
            },
        }
        true
    }

    fn comments_key(&mut self, key: KeyEvent, now: Instant) {
        if self.popup_nav_key(&key) {
            return;
        }
        match plain(&key) {
            Some('q') => self.close_popup(),
            Some('j') => self.select_next(now),
            Some('k') => self.select_prev(now),
            Some('a') => self.start_edit(EditTarget::Comment),
            Some('r') => {
                if let Some(key) = self.selected_key() {
                    self.pipeline
                        .reload(crate::tasks::Intent::FetchComments(key), &mut self.caches);
                }
            }
            _ => {}
        }
    }

    fn transitions_key(&mut self, key: KeyEvent) {
        if self.popup_nav_key(&key) {
            return;
        }
        match key.code {
            KeyCode::Enter => self.apply_selected_transition(),
            _ => {
                if plain(&key) == Some('q') {
                    self.close_popup();
                }
            }
        }
    }

    fn edit_menu_key(&mut self, key: KeyEvent) {
        if self.popup_nav_key(&key) {
            return;
        }
        if key.code == KeyCode::Enter {
            self.choose_edit_entry(self.popup_selected);
            return;
        }
        match plain(&key) {
            Some('q') => self.close_popup(),
            Some(c) => {
                if let Some(index) = EDIT_MENU.iter().position(|(shortcut, _)| *shortcut == c) {
                    self.choose_edit_entry(index);
                }
            }
            None => {}
        }
    }

    fn choose_edit_entry(&mut self, index: usize) {
        let target = match index {
            0 => EditTarget::Summary,
            1 => EditTarget::Description,
            2 => EditTarget::Labels,
            3 => EditTarget::Components,
            _ => {
                self.enter_mode(Mode::CustomFields);
                return;
            }
        };
        self.start_edit(target);
    }

    fn edit_input_key(&mut self, key: KeyEvent, target: &EditTarget) {
        if ctrl(&key, 's') {
            self.submit_edit();
            return;
        }
        if ctrl(&key, 'u') {
            if let Some(session) = self.edit.as_mut() {
                session.clear();
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.cancel_edit(),
            KeyCode::Enter if target.is_multiline() => {
                if let Some(session) = self.edit.as_mut() {
                    session.newline();
                }
            }
            KeyCode::Enter => self.submit_edit(),
            KeyCode::Backspace => {
                if let Some(session) = self.edit.as_mut() {
                    session.backspace();
                }
            }
            _ => {
                if let (Some(c), Some(session)) = (plain(&key), self.edit.as_mut()) {
                    session.push(c);
                }
            }
        }
    }

    fn boards_key(&mut self, key: KeyEvent) {
        if self.popup_nav_key(&key) {
            return;
        }
        match key.code {
            KeyCode::Down => self.popup_next(),
            KeyCode::Up => self.popup_prev(),
            KeyCode::Enter => {
                let name = self
                    .boards()
                    .get(self.popup_selected)
                    .map(|b| b.name.clone());
                match name {
                    Some(name) => self.switch_board(&name),
                    None => self.status = "No boards configured".to_string(),
                }
            }
            _ => match plain(&key) {
                Some('j') => self.popup_next(),
                Some('k') => self.popup_prev(),
                Some('q') => self.close_popup(),
                _ => {}
            },
        }
    }

    fn custom_fields_key(&mut self, key: KeyEvent) {
        if self.popup_nav_key(&key) {
            return;
        }
        match key.code {
            KeyCode::Enter => {
                let spec = self.custom_fields().get(self.popup_selected).cloned();
                match spec {
                    Some(spec) => self.start_edit(EditTarget::Custom(spec)),
                    None => self.status = "No custom fields configured".to_string(),
                }
            }
            _ => {
                if plain(&key) == Some('q') {
                    self.close_popup();
                }
            }
        }
    }

    fn help_key(&mut self, key: KeyEvent) {
        if ctrl(&key, 'd') {
            let lines = self.layout.popup_scroll.half_page();
            self.layout.popup_scroll.down(lines);
            return;
        }
        if ctrl(&key, 'u') {
            let lines = self.layout.popup_scroll.half_page();
            self.layout.popup_scroll.up(lines);
            return;
        }
        match key.code {
            KeyCode::Esc => self.close_popup(),
            KeyCode::Down => self.layout.popup_scroll.down(SCROLL_LINES),
            KeyCode::Up => self.layout.popup_scroll.up(SCROLL_LINES),
            _ => match plain(&key) {
                Some('q') | Some('?') => self.close_popup(),
                Some('j') => self.layout.popup_scroll.down(SCROLL_LINES),
                Some('k') => self.layout.popup_scroll.up(SCROLL_LINES),
                _ => {}
            },
        }
    }
}
