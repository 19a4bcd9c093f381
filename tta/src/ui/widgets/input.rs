//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::ConsoleTheme;

/// Input field widget
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a ConsoleTheme,
    placeholder: &'a str,
    is_active: bool,
    is_command_mode: bool,
    is_disabled: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a ConsoleTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            placeholder: "Enter a command...",
            is_active: true,
            is_command_mode: false,
            is_disabled: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn command_mode(mut self, is_command: bool) -> Self {
        self.is_command_mode = is_command;
        self
    }

    /// Greyed out while the engine is working.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.is_disabled = disabled;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active && !self.is_disabled));

        let inner = block.inner(area);
        block.render(area, buf);

        let prompt_style = self.theme.log_style(tta_core::LogType::User);

        let line = if self.is_disabled {
            Line::from(Span::styled(
                "  Processing... input disabled",
                self.theme.dim_style().add_modifier(Modifier::ITALIC),
            ))
        } else if self.content.is_empty() && !self.is_command_mode {
            Line::from(vec![
                Span::styled("> ", prompt_style),
                Span::styled(self.placeholder, self.theme.dim_style()),
            ])
        } else {
            let prefix = if self.is_command_mode { ":" } else { "> " };
            let display_content = if self.is_command_mode {
                self.content.strip_prefix(':').unwrap_or(self.content)
            } else {
                self.content
            };

            let adjusted_cursor = if self.is_command_mode && self.cursor_position > 0 {
                self.cursor_position - 1
            } else {
                self.cursor_position
            };

            // Use character-based slicing for unicode safety
            let before_cursor: String = display_content.chars().take(adjusted_cursor).collect();
            let at_cursor = display_content
                .chars()
                .nth(adjusted_cursor)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after_cursor: String = display_content.chars().skip(adjusted_cursor + 1).collect();

            Line::from(vec![
                Span::styled(prefix, prompt_style),
                Span::raw(before_cursor),
                Span::styled(
                    at_cursor,
                    Style::default()
                        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                        .fg(self.theme.user_text),
                ),
                Span::raw(after_cursor),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}
