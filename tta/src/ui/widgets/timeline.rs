//! Commit timeline widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use tta_core::CommitLog;

use crate::ui::theme::ConsoleTheme;

/// Commit history, newest first. Enter restores the selected commit.
pub struct TimelineWidget<'a> {
    commits: &'a CommitLog,
    branch: &'a str,
    selected: usize,
    theme: &'a ConsoleTheme,
    focused: bool,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(commits: &'a CommitLog, branch: &'a str, theme: &'a ConsoleTheme) -> Self {
        Self {
            commits,
            branch,
            selected: 0,
            theme,
            focused: false,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Total commits, commits on the current branch, and the branch count.
    fn title(&self) -> String {
        format!(
            " Timeline ({}) on {} ({}) | {} branches ",
            self.commits.len(),
            self.branch,
            self.commits.on_branch(self.branch).count(),
            self.commits.branches().len()
        )
    }
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = self.title();
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let items: Vec<ListItem> = self
            .commits
            .history()
            .map(|commit| {
                let marker = if commit.active {
                    Span::styled(
                        "● ",
                        Style::default()
                            .fg(self.theme.active_commit)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled("○ ", self.theme.dim_style())
                };
                let message_style = if commit.active {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(
                        commit.hash.short().to_string(),
                        Style::default().fg(self.theme.hash),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        format!("[{}]", commit.branch),
                        Style::default().fg(self.theme.branch),
                    ),
                    Span::raw(" "),
                    Span::styled(commit.timestamp.clone(), self.theme.dim_style()),
                    Span::raw(" "),
                    Span::styled(commit.message.clone(), message_style),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if self.focused {
            state.select(Some(self.selected));
        }
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tta_core::genesis::{genesis_commits, genesis_world};

    #[test]
    fn test_title_counts_branch_commits() {
        let snapshot = genesis_world().snapshot();
        let mut commits = genesis_commits(&snapshot, "main");
        let total = commits.len();
        commits.fork(snapshot, "fork-42");
        let theme = ConsoleTheme::default();

        let title = TimelineWidget::new(&commits, "fork-42", &theme).title();
        assert_eq!(
            title,
            format!(" Timeline ({}) on fork-42 (1) | 2 branches ", total + 1)
        );
    }
}
