//! Transcript display widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use tta_core::{LogEntry, LogType};

use crate::ui::theme::ConsoleTheme;

/// Widget for the scrolling transcript
pub struct ConsoleWidget<'a> {
    entries: &'a [LogEntry],
    scroll: usize,
    theme: &'a ConsoleTheme,
    focused: bool,
    loading: bool,
}

impl<'a> ConsoleWidget<'a> {
    pub fn new(entries: &'a [LogEntry], theme: &'a ConsoleTheme) -> Self {
        Self {
            entries,
            scroll: 0,
            theme,
            focused: false,
            loading: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl Widget for ConsoleWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Console [j/k scroll] "
        } else {
            " Console "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();

        for entry in self.entries {
            let style = self.theme.log_style(entry.kind);
            let prefix = match entry.kind {
                LogType::User => "> ",
                LogType::System => "# ",
                _ => "",
            };

            for (i, line) in entry.content.lines().enumerate() {
                let text = if i == 0 {
                    format!("{prefix}{line}")
                } else {
                    format!("{:width$}{line}", "", width = prefix.len())
                };
                lines.push(Line::from(Span::styled(text, style)));
            }
            lines.push(Line::from(""));
        }

        if self.loading {
            lines.push(Line::from(Span::styled(
                "Engine thinking...",
                self.theme.dim_style().add_modifier(Modifier::ITALIC),
            )));
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }
    }
}
