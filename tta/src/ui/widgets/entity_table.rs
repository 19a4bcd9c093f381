//! Database view: filtered entity table and the entity inspector

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Row, StatefulWidget, Table, TableState, Widget, Wrap,
    },
};

use tta_core::world::GraphStore;
use tta_core::{EntityFilter, EntityNode};

use crate::ui::theme::ConsoleTheme;

/// Entities matching the browser filter, one row each.
pub struct EntityTableWidget<'a> {
    graph: &'a GraphStore,
    filter: &'a EntityFilter,
    selected: usize,
    theme: &'a ConsoleTheme,
}

impl<'a> EntityTableWidget<'a> {
    pub fn new(graph: &'a GraphStore, filter: &'a EntityFilter, theme: &'a ConsoleTheme) -> Self {
        Self {
            graph,
            filter,
            selected: 0,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for EntityTableWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = self.filter.kind.map_or("All", |k| k.name());
        let title = if self.filter.search.is_empty() {
            format!(" Entities [{kind}] ")
        } else {
            format!(" Entities [{kind}] matching \"{}\" ", self.filter.search)
        };

        let rows: Vec<Row> = self
            .graph
            .filter(self.filter)
            .map(|node| {
                Row::new(vec![
                    Line::from(node.id.clone()),
                    Line::from(Span::styled(node.label.clone(), self.theme.node_style(node.kind))),
                    Line::from(node.kind.name()),
                    Line::from(format!("{:.0},{:.0}", node.x, node.y)),
                    Line::from(serde_json::Value::Object(node.data.clone()).to_string()),
                ])
            })
            .collect();

        let header = Row::new(vec!["ID", "Label", "Type", "Pos", "Data"])
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let table = Table::new(
            rows,
            [
                Constraint::Length(18),
                Constraint::Length(18),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(self.theme.border_style(true)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(Some(self.selected));
        StatefulWidget::render(table, area, buf, &mut state);
    }
}

/// Details of the selected entity, plus the last rejected edit.
pub struct InspectorWidget<'a> {
    node: Option<&'a EntityNode>,
    graph: &'a GraphStore,
    edit_error: Option<&'a str>,
    theme: &'a ConsoleTheme,
}

impl<'a> InspectorWidget<'a> {
    pub fn new(node: Option<&'a EntityNode>, graph: &'a GraphStore, theme: &'a ConsoleTheme) -> Self {
        Self {
            node,
            graph,
            edit_error: None,
            theme,
        }
    }

    pub fn edit_error(mut self, error: Option<&'a str>) -> Self {
        self.edit_error = error;
        self
    }
}

impl Widget for InspectorWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Inspector ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let mut lines: Vec<Line> = Vec::new();

        match self.node {
            Some(node) => {
                lines.push(Line::from(vec![
                    Span::styled(
                        node.label.clone(),
                        self.theme.node_style(node.kind).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  {} / {}", node.kind, node.id), self.theme.dim_style()),
                ]));
                lines.push(Line::from(""));

                let data = serde_json::Value::Object(node.data.clone());
                let pretty = serde_json::to_string_pretty(&data).unwrap_or_default();
                for line in pretty.lines() {
                    lines.push(Line::from(line.to_string()));
                }

                let links: Vec<_> = self.graph.links_of(&node.id).collect();
                if !links.is_empty() {
                    lines.push(Line::from(""));
                    for link in links {
                        lines.push(Line::from(format!(
                            "{} --{}--> {}",
                            self.graph.label_of(&link.source),
                            link.label,
                            self.graph.label_of(&link.target)
                        )));
                    }
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!(":edit {} {{...}}  :delete {}", node.id, node.id),
                    self.theme.dim_style(),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "No entity selected",
                self.theme.dim_style(),
            ))),
        }

        if let Some(error) = self.edit_error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Invalid edit: {error}"),
                self.theme.error_style(),
            )));
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
