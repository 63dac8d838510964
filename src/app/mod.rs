//! Application state and result handling.
//!
//! [`App`] is the single owned state value of a run. The main loop passes
//! it key events ([`App::handle_key`]), worker results
//! ([`App::handle_worker_message`]) and ticks ([`App::tick`]), and renders
//! from it each frame. Network work only leaves through the [`Pipeline`].

pub mod edit;
pub mod filter;
mod input;
pub mod mode;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::api::error::RequestError;
use crate::api::types::{Comment, FieldValue, Issue, IssueDetail, Transition};
use crate::cache::{CacheEntry, Caches, SCOPE_KEY};
use crate::config::{BoardConfig, Config, CustomFieldSpec, QuerySource};
use crate::tasks::{Applied, FetchKind, Intent, Pipeline, RequestTarget, WorkerMessage, Written};
use crate::ui::layout::PaneLayout;
use crate::ui::notification::Notifications;

pub use edit::{EditSession, EditTarget, ValidationError};
pub use mode::{Mode, RunOutcome};

/// Entries of the edit menu, in display order.
pub const EDIT_MENU: &[(char, &str)] = &[
    ('s', "Summary"),
    ('d', "Description"),
    ('l', "Labels"),
    ('m', "Components"),
    ('u', "Custom fields"),
];

pub struct App {
    config: Arc<Config>,
    pipeline: Pipeline,
    caches: Caches,
    mode: Mode,
    source: QuerySource,
    choose_mode: bool,
    /// Position of the selection within `visible`.
    selected: usize,
    visible: Vec<usize>,
    filter: String,
    search_input: String,
    last_search: Option<String>,
    edit: Option<EditSession>,
    /// Highlighted row of the active popup list.
    popup_selected: usize,
    /// Key the selection follows across reloads and filter changes.
    anchor_key: Option<String>,
    /// Last submitted comment body, cleared once the server accepts it.
    /// A failed submission offers it again on the next compose.
    comment_draft: Option<(String, String)>,
    layout: PaneLayout,
    status: String,
    notifications: Notifications,
}

impl App {
    pub fn new(config: Arc<Config>, pipeline: Pipeline, source: QuerySource, choose_mode: bool) -> Self {
        let layout = PaneLayout::new(&config.pipeline);
        Self {
            config,
            pipeline,
            caches: Caches::new(),
            mode: Mode::Normal,
            source,
            choose_mode,
            selected: 0,
            visible: Vec::new(),
            filter: String::new(),
            search_input: String::new(),
            last_search: None,
            edit: None,
            popup_selected: 0,
            anchor_key: None,
            comment_draft: None,
            layout,
            status: String::new(),
            notifications: Notifications::new(),
        }
    }

    /// Request the first issue list.
    pub fn start(&mut self) {
        info!(source = %self.source.describe(), choose = self.choose_mode, "starting");
        self.status = format!("Loading issues ({})", self.source.describe());
        self.pipeline
            .request(Intent::LoadIssues(self.source.clone()), &mut self.caches);
    }

    // Read access for the renderer.

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn source(&self) -> &QuerySource {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_choose_mode(&self) -> bool {
        self.choose_mode
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn popup_selected(&self) -> usize {
        self.popup_selected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut PaneLayout {
        &mut self.layout
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// The issue list entry, loading or failed.
    pub fn issue_list_entry(&self) -> Option<&CacheEntry<Vec<Issue>>> {
        self.caches.issues.get(SCOPE_KEY)
    }

    /// Visible rows in list order.
    pub fn visible_issues(&self) -> Vec<&Issue> {
        let issues = self.caches.issue_list();
        self.visible.iter().filter_map(|&i| issues.get(i)).collect()
    }

    pub fn visible_indices(&self) -> &[usize] {
        &self.visible
    }

    /// Selection position within the visible rows.
    pub fn selected_position(&self) -> usize {
        self.selected
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        let index = *self.visible.get(self.selected)?;
        self.caches.issue_list().get(index)
    }

    pub fn selected_key(&self) -> Option<String> {
        self.selected_issue().map(|i| i.key.clone())
    }

    pub fn selected_detail(&self) -> Option<&CacheEntry<IssueDetail>> {
        let key = self.selected_issue()?.key.as_str();
        self.caches.details.get(key)
    }

    pub fn selected_comments(&self) -> Option<&CacheEntry<Vec<Comment>>> {
        let key = self.selected_issue()?.key.as_str();
        self.caches.comments.get(key)
    }

    pub fn selected_transitions(&self) -> Option<&CacheEntry<Vec<Transition>>> {
        let key = self.selected_issue()?.key.as_str();
        self.caches.transitions.get(key)
    }

    pub fn boards(&self) -> &[BoardConfig] {
        self.caches
            .boards
            .value(SCOPE_KEY)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn custom_fields(&self) -> &[CustomFieldSpec] {
        self.caches
            .custom_fields
            .value(SCOPE_KEY)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Earliest time the loop must wake for a debounced request.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pipeline.next_deadline()
    }

    /// Periodic work: fire due debounced requests and expire toasts.
    pub fn tick(&mut self, now: Instant) {
        self.pipeline.flush_due(now, &mut self.caches);
        self.notifications.tick(now);
    }

    // Selection and filtering.

    /// Select a visible row by position. Out-of-range positions are ignored.
    pub fn select(&mut self, position: usize, now: Instant) {
        if position >= self.visible.len() {
            return;
        }
        self.selected = position;
        self.on_selection_changed(now);
    }

    pub fn select_next(&mut self, now: Instant) {
        let len = self.visible.len();
        if len > 0 {
            self.select((self.selected + 1) % len, now);
        }
    }

    pub fn select_prev(&mut self, now: Instant) {
        let len = self.visible.len();
        if len > 0 {
            self.select((self.selected + len - 1) % len, now);
        }
    }

    /// Recompute visible rows for `text`, keeping the selected key if it is
    /// still visible.
    pub fn apply_filter(&mut self, text: &str, now: Instant) {
        self.filter = text.to_string();
        self.recompute_visible();
        self.on_selection_changed(now);
    }

    fn recompute_visible(&mut self) {
        let anchor = self.anchor_key.clone();
        self.visible = filter::visible_indices(self.caches.issue_list(), &self.filter);
        self.selected = anchor
            .and_then(|key| {
                let issues = self.caches.issue_list();
                self.visible
                    .iter()
                    .position(|&i| issues.get(i).map(|issue| issue.key == key).unwrap_or(false))
            })
            .unwrap_or(0);
    }

    /// React to the selected key changing: reset per-issue view state and
    /// schedule the reads the current mode shows.
    fn on_selection_changed(&mut self, now: Instant) {
        let key = self.selected_key();
        if key.is_none() || key == self.anchor_key {
            return;
        }
        let previous = std::mem::replace(&mut self.anchor_key, key.clone());
        let Some(key) = key else { return };
        debug!(key = %key, "selection changed");

        self.layout.detail_scroll.reset();
        if matches!(self.mode, Mode::Comments | Mode::Transitions) {
            self.popup_selected = 0;
            self.layout.popup_scroll.reset();
        }

        self.pipeline
            .request_debounced(Intent::FetchDetail(key.clone()), &mut self.caches, now);
        match self.mode {
            Mode::Comments => {
                self.pipeline
                    .request_debounced(Intent::FetchComments(key), &mut self.caches, now);
            }
            Mode::Transitions => {
                if let Some(previous) = previous {
                    self.drop_transitions(&previous);
                }
                self.pipeline
                    .request_debounced(Intent::FetchTransitions(key), &mut self.caches, now);
            }
            _ => {}
        }
    }

    /// Fetch whatever the selection needs right away (after a list load).
    fn request_for_selection(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        self.pipeline
            .request(Intent::FetchDetail(key.clone()), &mut self.caches);
        match self.mode {
            Mode::Comments => {
                self.pipeline
                    .request(Intent::FetchComments(key), &mut self.caches);
            }
            Mode::Transitions => {
                self.pipeline
                    .request(Intent::FetchTransitions(key), &mut self.caches);
            }
            _ => {}
        }
    }

    /// Transitions are never reused across visits.
    fn drop_transitions(&mut self, key: &str) {
        self.caches.transitions.remove(key);
        self.pipeline
            .invalidate(&RequestTarget::new(FetchKind::Transitions, key));
    }

    // Commands.

    /// Drop all issue data and fetch the list again, keeping the selected
    /// key when it comes back.
    pub fn reload(&mut self) {
        if let Some(key) = self.selected_key() {
            self.anchor_key = Some(key);
        }
        self.caches.clear_issue_data();
        self.pipeline.invalidate_all();
        self.visible.clear();
        self.selected = 0;
        self.status = format!("Reloading issues ({})", self.source.describe());
        self.pipeline
            .reload(Intent::LoadIssues(self.source.clone()), &mut self.caches);
    }

    /// Switch to a configured board. Leaves raw query mode if active.
    pub fn switch_board(&mut self, name: &str) {
        let replaced_query = self.source.is_query_mode();
        info!(board = name, replaced_query, "switching board");
        self.source = QuerySource::Board(Some(name.to_string()));
        self.mode = Mode::Normal;
        self.anchor_key = None;
        self.reload();
        self.status = if replaced_query {
            format!("Switched to board '{}' (replaced active raw query mode)", name)
        } else {
            format!("Switched to board '{}'", name)
        };
    }

    pub fn open_selected(&mut self) {
        match self.selected_key() {
            Some(key) => {
                self.status = format!("Opening {} in browser", key);
                self.pipeline
                    .request(Intent::OpenInBrowser(key), &mut self.caches);
            }
            None => self.status = "No issue selected".to_string(),
        }
    }

    pub(crate) fn enter_mode(&mut self, mode: Mode) {
        debug!(from = ?self.mode, to = ?mode, "mode change");
        self.popup_selected = 0;
        self.layout.popup_scroll.reset();
        let key = self.selected_key();

        match (&mode, key) {
            (Mode::Comments, Some(key)) => {
                self.pipeline
                    .request(Intent::FetchComments(key), &mut self.caches);
            }
            (Mode::Transitions, Some(key)) => {
                self.drop_transitions(&key);
                self.pipeline
                    .request(Intent::FetchTransitions(key), &mut self.caches);
            }
            (Mode::Boards, _) => {
                self.pipeline.request(Intent::LoadBoards, &mut self.caches);
            }
            (Mode::CustomFields, _) => {
                self.pipeline
                    .request(Intent::LoadCustomFields, &mut self.caches);
            }
            _ => {}
        }
        self.mode = mode;
    }

    /// Close a popup back to `Normal`.
    pub(crate) fn close_popup(&mut self) {
        if self.mode == Mode::Transitions {
            if let Some(key) = self.selected_key() {
                self.drop_transitions(&key);
            }
        }
        self.edit = None;
        self.mode = Mode::Normal;
    }

    /// Open the editor for `target` on the selected issue.
    pub(crate) fn start_edit(&mut self, target: EditTarget) {
        let Some(key) = self.selected_key() else {
            self.status = "No issue selected".to_string();
            return;
        };
        let return_to = self.mode.clone();
        let mut session = EditSession::start(
            target.clone(),
            key.clone(),
            self.caches.details.value(&key),
            return_to,
        );
        if target == EditTarget::Comment {
            if let Some((_, body)) = self.comment_draft.as_ref().filter(|(k, _)| *k == key) {
                session.buffer = body.clone();
            }
        }
        self.edit = Some(session);
        self.mode = Mode::EditInput(target);
    }

    /// Esc in the editor: discard and go back.
    pub(crate) fn cancel_edit(&mut self) {
        let return_to = self
            .edit
            .take()
            .map(|s| s.return_to)
            .unwrap_or(Mode::Normal);
        self.mode = return_to;
    }

    /// Validate and submit the edit session.
    pub(crate) fn submit_edit(&mut self) {
        let Some(session) = self.edit.as_ref() else {
            return;
        };
        let key = session.key.clone();
        let intent = match &session.target {
            EditTarget::Comment => session
                .comment_body()
                .map(|body| Intent::SubmitComment {
                    key: key.clone(),
                    body,
                }),
            _ => session.field_update().map(|update| Intent::UpdateField {
                key: key.clone(),
                update,
            }),
        };

        match intent {
            Ok(intent) => {
                let label = session.target.label();
                if let Intent::SubmitComment { key, body } = &intent {
                    self.comment_draft = Some((key.clone(), body.clone()));
                }
                self.status = format!("Submitting {} for {}", label, key);
                self.edit = None;
                self.mode = Mode::Normal;
                self.pipeline.request(intent, &mut self.caches);
            }
            Err(e) => {
                warn!(key = %key, "rejected edit: {}", e);
                self.status = format!("Not submitted: {}", e);
                self.notifications.error(e.to_string());
            }
        }
    }

    pub(crate) fn apply_selected_transition(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let transition = self
            .caches
            .transitions
            .value(&key)
            .and_then(|list| list.get(self.popup_selected))
            .cloned();
        let Some(transition) = transition else {
            self.status = format!("No transition selected for {}", key);
            return;
        };

        self.status = format!("Applying '{}' to {}", transition.name, key);
        self.close_popup();
        self.pipeline
            .request(Intent::ApplyTransition { key, transition }, &mut self.caches);
    }

    /// Length of the list the active popup shows, for n/p movement.
    pub(crate) fn popup_len(&self) -> usize {
        match self.mode {
            Mode::Comments => self.selected_comments().and_then(CacheEntry::value).map_or(0, Vec::len),
            Mode::Transitions => self
                .selected_transitions()
                .and_then(CacheEntry::value)
                .map_or(0, Vec::len),
            Mode::Boards => self.boards().len(),
            Mode::CustomFields => self.custom_fields().len(),
            Mode::EditMenu => EDIT_MENU.len(),
            _ => 0,
        }
    }

    pub(crate) fn popup_next(&mut self) {
        let len = self.popup_len();
        if len > 0 {
            self.popup_selected = (self.popup_selected + 1) % len;
        }
    }

    pub(crate) fn popup_prev(&mut self) {
        let len = self.popup_len();
        if len > 0 {
            self.popup_selected = (self.popup_selected + len - 1) % len;
        }
    }

    // Worker results.

    /// Apply one worker message. Stale results are dropped by the pipeline.
    pub fn handle_worker_message(&mut self, message: WorkerMessage) {
        let Some(applied) = self.pipeline.apply(message, &mut self.caches) else {
            return;
        };
        match applied {
            Applied::Fetched { target, error } => self.on_fetched(target, error),
            Applied::Written(written) => self.on_written(written),
            Applied::Opened { key, url, result } => match result {
                Ok(()) => {
                    self.status = format!("Opened {} ({})", key, url);
                    self.notifications.info(format!("Opened {} in browser", key));
                }
                Err(e) => {
                    self.status = format!("Could not open {}: {}", key, e);
                    self.notifications.error(e.to_string());
                }
            },
        }
    }

    fn on_fetched(&mut self, target: RequestTarget, error: Option<RequestError>) {
        if let Some(e) = &error {
            if target.kind == FetchKind::Issues || self.selected_key().as_deref() == Some(target.key.as_str()) {
                self.status = format!("Failed to load {} for {}: {}", target.kind.label(), target.key, e);
            }
        }

        if target.kind != FetchKind::Issues {
            return;
        }
        match error {
            None => {
                self.recompute_visible();
                self.anchor_key = self.selected_key();
                self.status = format!(
                    "Loaded {} issues ({})",
                    self.caches.issue_list().len(),
                    self.source.describe()
                );
                self.request_for_selection();
            }
            Some(e) => {
                self.visible.clear();
                self.selected = 0;
                self.notifications.error(e.banner());
            }
        }
    }

    fn on_written(&mut self, written: Written) {
        match written {
            Written::Comment { key, result } => match result {
                Ok(comment) => {
                    // A read still in flight predates the comment; supersede it.
                    if !self.caches.append_comment(&key, comment)
                        && self.caches.comments.get(&key).is_some()
                    {
                        self.pipeline
                            .reload(Intent::FetchComments(key.clone()), &mut self.caches);
                    }
                    self.comment_draft = None;
                    self.status = format!("Added comment to {}", key);
                    self.notifications.success(format!("Comment added to {}", key));
                }
                Err(e) => {
                    self.write_failed("add comment to", &key, &e);
                }
            },
            Written::Transition {
                key,
                transition,
                result,
            } => match result {
                Ok(()) => {
                    self.caches
                        .update_issue_row(&key, |issue| issue.status = transition.to_status.clone());
                    self.drop_transitions(&key);
                    self.pipeline
                        .reload(Intent::FetchDetail(key.clone()), &mut self.caches);
                    self.status = format!("{} moved to '{}'", key, transition.to_status);
                    self.notifications.success(self.status.clone());
                }
                Err(e) => self.write_failed("transition", &key, &e),
            },
            Written::Field { key, update, result } => match result {
                Ok(()) => {
                    if let Some(FieldValue::Text(summary)) =
                        update.fields.get("summary")
                    {
                        let summary = summary.clone();
                        self.caches.update_issue_row(&key, |issue| issue.summary = summary);
                    }
                    self.pipeline
                        .reload(Intent::FetchDetail(key.clone()), &mut self.caches);
                    self.status = format!("Updated {} for {}", update.label, key);
                    self.notifications.success(self.status.clone());
                }
                Err(e) => self.write_failed(&format!("update {} for", update.label), &key, &e),
            },
        }
    }

    /// Leave caches as they are; the next explicit refresh shows server state.
    fn write_failed(&mut self, action: &str, key: &str, error: &RequestError) {
        warn!(key, kind = error.kind.label(), "write failed: {}", error);
        self.status = format!("Failed to {} {}: {}", action, key, error.banner());
        self.notifications.error(format!("Failed to {} {}", action, key));
    }
}
