//! Main application state and logic

use std::collections::VecDeque;

use tta_core::{
    EntityFilter, EntityNode, GameSession, RestoreOutcome, Response, SessionError,
};

use crate::commands::ConsoleCommand;
use crate::ui::theme::ConsoleTheme;
use crate::ui::{FocusedPanel, View};

const HISTORY_LIMIT: usize = 100;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigation and hotkeys
    #[default]
    Normal,
    /// Free text player commands
    Insert,
    /// `:` meta commands
    Command,
}

/// Main application state
pub struct App {
    pub session: GameSession,

    // UI state
    pub theme: ConsoleTheme,
    pub view: View,
    pub focused_panel: FocusedPanel,
    pub show_help: bool,

    // Console scrolling
    pub console_scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Selections
    pub timeline_selected: usize,
    pub graph_selected: usize,
    pub entity_filter: EntityFilter,
    pub entity_selected: usize,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>,

    // Status
    status_message: Option<String>,
    /// Last rejected entity edit, shown until an edit succeeds.
    pub edit_error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: GameSession) -> Self {
        let mut app = Self {
            session,
            theme: ConsoleTheme::default(),
            view: View::default(),
            focused_panel: FocusedPanel::default(),
            show_help: false,
            console_scroll: 0,
            scroll_locked_to_bottom: true,
            timeline_selected: 0,
            graph_selected: 0,
            entity_filter: EntityFilter::default(),
            entity_selected: 0,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(HISTORY_LIMIT),
            history_index: None,
            saved_input: None,
            status_message: None,
            edit_error: None,
            should_quit: false,
        };
        app.set_status("Press 'i' to enter a command, ':' for meta commands, '?' for help");
        app.scroll_to_bottom();
        app
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.clear_input();
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Console => View::Database,
            View::Database => View::Console,
        };
        self.clamp_selections();
    }

    pub fn cycle_focus(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Console => FocusedPanel::Graph,
            FocusedPanel::Graph => FocusedPanel::Timeline,
            FocusedPanel::Timeline => FocusedPanel::Console,
        };
    }

    pub fn cycle_focus_reverse(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Console => FocusedPanel::Timeline,
            FocusedPanel::Graph => FocusedPanel::Console,
            FocusedPanel::Timeline => FocusedPanel::Graph,
        };
    }

    // ========================================================================
    // Console scrolling
    // ========================================================================

    /// Scroll to the newest entry and stay there as entries arrive
    pub fn scroll_to_bottom(&mut self) {
        // The widget caps this to the real maximum
        self.console_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.console_scroll = 0;
        self.scroll_locked_to_bottom = false;
    }

    /// Rough line count of the transcript, assuming ~60 columns
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .session
            .transcript()
            .entries()
            .iter()
            .map(|entry| {
                entry
                    .content
                    .lines()
                    .map(|line| (line.len() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.console_scroll = self.console_scroll.min(max_scroll).saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.console_scroll = self
            .console_scroll
            .saturating_add(lines)
            .min(max_scroll + 100);
    }

    // ========================================================================
    // Selections
    // ========================================================================

    /// Move the selection of whatever is focused (j)
    pub fn select_next(&mut self) {
        match (self.view, self.focused_panel) {
            (View::Database, _) => {
                let count = self.filtered_count();
                if count > 0 {
                    self.entity_selected = (self.entity_selected + 1).min(count - 1);
                }
            }
            (View::Console, FocusedPanel::Console) => self.scroll_down(1),
            (View::Console, FocusedPanel::Graph) => {
                let count = self.session.graph().nodes().len();
                if count > 0 {
                    self.graph_selected = (self.graph_selected + 1).min(count - 1);
                }
            }
            (View::Console, FocusedPanel::Timeline) => {
                let count = self.session.commits().len();
                if count > 0 {
                    self.timeline_selected = (self.timeline_selected + 1).min(count - 1);
                }
            }
        }
    }

    /// Move the selection of whatever is focused (k)
    pub fn select_prev(&mut self) {
        match (self.view, self.focused_panel) {
            (View::Database, _) => self.entity_selected = self.entity_selected.saturating_sub(1),
            (View::Console, FocusedPanel::Console) => self.scroll_up(1),
            (View::Console, FocusedPanel::Graph) => {
                self.graph_selected = self.graph_selected.saturating_sub(1)
            }
            (View::Console, FocusedPanel::Timeline) => {
                self.timeline_selected = self.timeline_selected.saturating_sub(1)
            }
        }
    }

    /// Entity highlighted in the graph panel, while it is focused
    pub fn graph_selected(&self) -> Option<&EntityNode> {
        if self.focused_panel != FocusedPanel::Graph {
            return None;
        }
        self.session.graph().nodes().get(self.graph_selected)
    }

    /// Entity highlighted in the database table
    pub fn selected_entity(&self) -> Option<&EntityNode> {
        self.session
            .graph()
            .filter(&self.entity_filter)
            .nth(self.entity_selected)
    }

    fn filtered_count(&self) -> usize {
        self.session.graph().filter(&self.entity_filter).count()
    }

    /// Keep selections inside their lists after the world changed
    fn clamp_selections(&mut self) {
        let entities = self.filtered_count();
        self.entity_selected = self.entity_selected.min(entities.saturating_sub(1));
        let nodes = self.session.graph().nodes().len();
        self.graph_selected = self.graph_selected.min(nodes.saturating_sub(1));
        let commits = self.session.commits().len();
        self.timeline_selected = self.timeline_selected.min(commits.saturating_sub(1));
    }

    /// Restore the commit highlighted in the timeline (newest first)
    pub fn restore_selected(&mut self) {
        let hash = self
            .session
            .commits()
            .history()
            .nth(self.timeline_selected)
            .map(|c| c.hash.as_str().to_string());
        match hash {
            Some(hash) => self.restore(&hash),
            None => self.set_status("No commit selected"),
        }
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Report a finished player command
    pub fn on_response(&mut self, response: &Response) {
        let mut message = format!(
            "Committed {} \"{}\"",
            response.commit.short(),
            response.commit_message
        );
        if !response.new_nodes.is_empty() {
            message.push_str(&format!(" (+{} entities)", response.new_nodes.len()));
        }
        self.set_status(message);
        self.timeline_selected = 0;
        self.after_world_change();
    }

    pub fn on_session_error(&mut self, error: SessionError) {
        if let SessionError::InvalidEdit(message) = &error {
            self.edit_error = Some(message.clone());
        }
        self.set_status(format!("Error: {error}"));
    }

    fn after_world_change(&mut self) {
        self.clamp_selections();
        if self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
    }

    fn restore(&mut self, hash: &str) {
        match self.session.restore(hash) {
            Ok(RestoreOutcome::Restored) => {
                let short = self
                    .session
                    .commits()
                    .active()
                    .map(|c| c.hash.short().to_string())
                    .unwrap_or_default();
                self.set_status(format!("Restored {short}"));
                self.after_world_change();
            }
            Ok(RestoreOutcome::Skipped) => {
                self.set_status("Commit has no snapshot; nothing restored");
            }
            Err(e) => self.on_session_error(e),
        }
    }

    /// Run a parsed `:` command
    pub fn run_console_command(&mut self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Fork(name) => match self.session.fork(name.as_deref()) {
                Ok(commit) => {
                    let message = format!("{} ({})", commit.message, commit.hash.short());
                    self.set_status(message);
                    self.timeline_selected = 0;
                    self.after_world_change();
                }
                Err(e) => self.on_session_error(e),
            },
            ConsoleCommand::Restore(hash) => self.restore(&hash),
            ConsoleCommand::New => self.create_entity(),
            ConsoleCommand::Delete(id) => match self.session.delete_node(&id) {
                Ok(links) => {
                    self.set_status(format!("Deleted {id} and {links} links"));
                    self.after_world_change();
                }
                Err(e) => self.on_session_error(e),
            },
            ConsoleCommand::Edit { id, json } => match self.session.patch_entity(&id, &json) {
                Ok(()) => {
                    self.edit_error = None;
                    self.set_status(format!("Patched {id}"));
                    self.after_world_change();
                }
                Err(e) => self.on_session_error(e),
            },
            ConsoleCommand::Save { id, content } => match self.session.save_file(&id, &content) {
                Ok(()) => self.set_status(format!("Saved {id}")),
                Err(e) => self.on_session_error(e),
            },
            ConsoleCommand::Type(kind) => {
                self.entity_filter.kind = kind;
                self.entity_selected = 0;
                self.view = View::Database;
                self.set_status(format!("Type filter: {}", kind.map_or("All", |k| k.name())));
            }
            ConsoleCommand::Search(text) => {
                self.entity_filter.search = text;
                self.entity_selected = 0;
                self.view = View::Database;
                self.clear_status();
            }
            ConsoleCommand::Entities { kind, search } => {
                self.entity_filter = EntityFilter { kind, search };
                self.entity_selected = 0;
                self.view = View::Database;
                self.clear_status();
            }
            ConsoleCommand::Status => {
                let state = self.session.state();
                let message = format!(
                    "HP {}/{} | {} | {} commits on {}",
                    state.hp,
                    state.max_hp,
                    state.location,
                    self.session.commits().len(),
                    self.session.current_branch()
                );
                self.set_status(message);
            }
            ConsoleCommand::Log => {
                self.view = View::Console;
                self.focused_panel = FocusedPanel::Console;
                self.scroll_to_bottom();
            }
            ConsoleCommand::Graph => {
                self.view = View::Console;
                self.focused_panel = FocusedPanel::Graph;
            }
            ConsoleCommand::Files => {
                let names: Vec<&str> = self
                    .session
                    .files()
                    .outline()
                    .into_iter()
                    .map(|(_, node)| node.name.as_str())
                    .collect();
                let message = format!("Files: {}", names.join(", "));
                self.set_status(message);
            }
            ConsoleCommand::Help => self.show_help = true,
            ConsoleCommand::Quit => self.should_quit = true,
        }
    }

    /// Insert a blank entity and select it in the table
    pub fn create_entity(&mut self) {
        match self.session.create_node() {
            Ok(id) => {
                self.set_status(format!("Inserted {id}"));
                self.after_world_change();
                if let Some(index) = self
                    .session
                    .graph()
                    .filter(&self.entity_filter)
                    .position(|node| node.id == id)
                {
                    self.entity_selected = index;
                }
            }
            Err(e) => self.on_session_error(e),
        }
    }

    /// Parse and run the text typed in command mode
    pub fn process_command(&mut self, input: &str) {
        let line = input.strip_prefix(':').unwrap_or(input);
        match ConsoleCommand::parse(line) {
            Ok(command) => self.run_console_command(command),
            Err(message) => self.set_status(message),
        }
    }

    // ========================================================================
    // Input editing
    // ========================================================================

    /// Take the typed command, remembering it in the history
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.trim().is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        self.input_history.push_front(input.clone());
        if self.input_history.len() > HISTORY_LIMIT {
            self.input_history.pop_back();
        }
        self.history_index = None;
        self.saved_input = None;

        Some(input)
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }

    pub fn type_char(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor_position);
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.remove_at_cursor();
        }
    }

    pub fn delete(&mut self) {
        if self.cursor_position < self.input_buffer.chars().count() {
            self.remove_at_cursor();
        }
    }

    fn remove_at_cursor(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Recall an older command
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let index = match self.history_index {
            None => 0,
            Some(i) => (i + 1).min(self.input_history.len() - 1),
        };
        if let Some(entry) = self.input_history.get(index) {
            self.input_buffer = entry.clone();
            self.cursor_end();
            self.history_index = Some(index);
        }
    }

    /// Walk back towards the command being typed
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.cursor_end();
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.cursor_end();
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
