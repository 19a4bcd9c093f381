//! Knowledge graph widget: entities and their links as text

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use tta_core::world::GraphStore;

use crate::ui::theme::ConsoleTheme;

pub struct GraphWidget<'a> {
    graph: &'a GraphStore,
    selected: Option<&'a str>,
    theme: &'a ConsoleTheme,
    focused: bool,
}

impl<'a> GraphWidget<'a> {
    pub fn new(graph: &'a GraphStore, theme: &'a ConsoleTheme) -> Self {
        Self {
            graph,
            selected: None,
            theme,
            focused: false,
        }
    }

    pub fn selected(mut self, id: Option<&'a str>) -> Self {
        self.selected = id;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for GraphWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(
            " Knowledge Graph ({} nodes, {} links) ",
            self.graph.nodes().len(),
            self.graph.links().len()
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let mut lines: Vec<Line> = Vec::new();

        for node in self.graph.nodes() {
            let mut style = self.theme.node_style(node.kind);
            if self.selected == Some(node.id.as_str()) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            lines.push(Line::from(vec![
                Span::styled(node.label.clone(), style),
                Span::styled(format!(" ({}, {})", node.kind, node.id), self.theme.dim_style()),
            ]));
        }

        if !self.graph.links().is_empty() {
            lines.push(Line::from(""));
        }
        for link in self.graph.links() {
            lines.push(Line::from(vec![
                Span::raw(self.graph.label_of(&link.source).to_string()),
                Span::styled(
                    format!(" --{}--> ", link.label),
                    Style::default().fg(self.theme.border_focused),
                ),
                Span::raw(self.graph.label_of(&link.target).to_string()),
            ]));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
