//! Player status and last execution trace

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use tta_core::{EntityNode, GameState};

use crate::ui::theme::ConsoleTheme;

const HP_BAR_WIDTH: usize = 20;

pub struct StatePanelWidget<'a> {
    state: &'a GameState,
    last_trace: Option<&'a str>,
    selected: Option<&'a EntityNode>,
    theme: &'a ConsoleTheme,
}

impl<'a> StatePanelWidget<'a> {
    pub fn new(state: &'a GameState, theme: &'a ConsoleTheme) -> Self {
        Self {
            state,
            last_trace: None,
            selected: None,
            theme,
        }
    }

    pub fn last_trace(mut self, trace: Option<&'a str>) -> Self {
        self.last_trace = trace;
        self
    }

    /// Entity picked in the graph panel.
    pub fn selected(mut self, node: Option<&'a EntityNode>) -> Self {
        self.selected = node;
        self
    }
}

impl Widget for StatePanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" State ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let ratio = if self.state.max_hp > 0 {
            (self.state.hp as f32 / self.state.max_hp as f32).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (ratio * HP_BAR_WIDTH as f32).round() as usize;
        let hp_style = Style::default()
            .fg(self.theme.hp_color(ratio))
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("HP "),
                Span::styled("█".repeat(filled), hp_style),
                Span::styled("░".repeat(HP_BAR_WIDTH - filled), self.theme.dim_style()),
                Span::styled(format!(" {}/{}", self.state.hp, self.state.max_hp), hp_style),
            ]),
            Line::from(vec![
                Span::raw("Location: "),
                Span::styled(
                    self.state.location.clone(),
                    Style::default().fg(self.theme.location),
                ),
            ]),
            Line::from(format!("Inventory: {}", self.state.inventory.join(", "))),
        ];

        if let Some(trace) = self.last_trace {
            lines.push(Line::from(Span::styled("Last trace:", self.theme.dim_style())));
            for line in trace.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    self.theme.log_style(tta_core::LogType::Symbolic),
                )));
            }
        }

        if let Some(node) = self.selected {
            lines.push(Line::from(Span::styled(
                format!("{} [{}]", node.label, node.kind),
                self.theme.node_style(node.kind).add_modifier(Modifier::BOLD),
            )));
            for (key, value) in &node.data {
                lines.push(Line::from(format!("  {key}: {value}")));
            }
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
