//! Render orchestration for the console TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::ui::layout::{centered_rect_fixed, ConsoleLayout, DatabaseLayout};
use crate::ui::widgets::{
    ConsoleWidget, EntityTableWidget, GraphWidget, InputWidget, InspectorWidget,
    StatePanelWidget, TimelineWidget,
};

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Console,
    Database,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Console => "CONSOLE",
            View::Database => "DATABASE",
        }
    }
}

/// Which panel of the console view is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    Console,
    Graph,
    Timeline,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.view {
        View::Console => render_console_view(frame, app, area),
        View::Database => render_database_view(frame, app, area),
    }

    if app.show_help {
        render_help_overlay(frame, app, area);
    }
}

fn render_console_view(frame: &mut Frame, app: &App, area: Rect) {
    let layout = ConsoleLayout::calculate(area);
    let session = &app.session;

    render_title_bar(frame, app, layout.title_area);

    let console = ConsoleWidget::new(session.transcript().entries(), &app.theme)
        .scroll(app.console_scroll)
        .focused(matches!(app.focused_panel, FocusedPanel::Console))
        .loading(session.is_loading());
    frame.render_widget(console, layout.console_area);

    let selected = app.graph_selected();
    let state = StatePanelWidget::new(session.state(), &app.theme)
        .last_trace(session.last_trace())
        .selected(selected);
    frame.render_widget(state, layout.state_area);

    let graph = GraphWidget::new(session.graph(), &app.theme)
        .selected(selected.map(|node| node.id.as_str()))
        .focused(matches!(app.focused_panel, FocusedPanel::Graph));
    frame.render_widget(graph, layout.graph_area);

    let timeline = TimelineWidget::new(session.commits(), session.current_branch(), &app.theme)
        .selected(app.timeline_selected)
        .focused(matches!(app.focused_panel, FocusedPanel::Timeline));
    frame.render_widget(timeline, layout.timeline_area);

    render_status_bar(frame, app, layout.status_bar);
    render_input(frame, app, layout.input_area);
}

fn render_database_view(frame: &mut Frame, app: &App, area: Rect) {
    let layout = DatabaseLayout::calculate(area);
    let graph = app.session.graph();

    render_title_bar(frame, app, layout.title_area);

    let table = EntityTableWidget::new(graph, &app.entity_filter, &app.theme)
        .selected(app.entity_selected);
    frame.render_widget(table, layout.table_area);

    let inspector = InspectorWidget::new(app.selected_entity(), graph, &app.theme)
        .edit_error(app.edit_error.as_deref());
    frame.render_widget(inspector, layout.inspector_area);

    render_status_bar(frame, app, layout.status_bar);
    render_input(frame, app, layout.input_area);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let active = session
        .commits()
        .active()
        .map(|c| c.hash.short().to_string())
        .unwrap_or_else(|| "-------".to_string());

    let line = Line::from(vec![
        Span::styled(
            " TEXT ADVENTURE CONSOLE ",
            Style::default()
                .fg(app.theme.foreground)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        Span::styled(
            session.current_branch().to_string(),
            Style::default().fg(app.theme.branch),
        ),
        Span::raw(" @ "),
        Span::styled(active, Style::default().fg(app.theme.hash)),
        Span::raw(" | "),
        Span::styled(
            format!("engine: {}", session.engine_name()),
            app.theme.dim_style(),
        ),
        Span::raw(" | "),
        Span::styled(app.view.name(), Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Insert => "INSERT",
        InputMode::Command => "COMMAND",
    };

    let mut spans = vec![
        Span::styled(
            format!(" {mode} "),
            Style::default()
                .fg(Color::Black)
                .bg(app.theme.border_focused)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    match (app.status_message(), app.edit_error.as_deref()) {
        (Some(message), _) => spans.push(Span::raw(message.to_string())),
        (None, Some(error)) => spans.push(Span::styled(
            format!("Invalid edit: {error}"),
            app.theme.error_style(),
        )),
        (None, None) => spans.push(Span::styled(
            "i insert  : command  Tab focus  d database  n new entity  ? help",
            app.theme.dim_style(),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = matches!(app.input_mode, InputMode::Command);

    let input = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(is_active)
        .command_mode(is_command)
        .disabled(app.session.is_loading())
        .placeholder("Enter a command (e.g. 'attack goblin', 'look around')...");

    frame.render_widget(input, area);
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(58, 31, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        heading("Modes:"),
        Line::from("  i        INSERT mode (player commands)"),
        Line::from("  :        COMMAND mode"),
        Line::from("  Esc      back to NORMAL mode"),
        Line::from(""),
        heading("Navigation (NORMAL mode):"),
        Line::from("  j/k      scroll or move the selection"),
        Line::from("  g/G      jump to top/bottom"),
        Line::from("  Tab      cycle Console / Graph / Timeline"),
        Line::from("  Enter    restore the selected timeline commit"),
        Line::from("  d        toggle the database view"),
        Line::from("  n        insert a new entity"),
        Line::from("  q        quit"),
        Line::from(""),
        heading("Commands:"),
        Line::from("  :fork [name]        branch from the current world"),
        Line::from("  :restore <hash>     time travel to a commit"),
        Line::from("  :new                insert a new entity"),
        Line::from("  :delete <id>        delete an entity and its links"),
        Line::from("  :edit <id> <json>   replace an entity's data"),
        Line::from("  :save <file> <text> overwrite a project file"),
        Line::from("  :type <kind|All>    filter the entity table"),
        Line::from("  :search <text>      search the entity table"),
        Line::from("  :q                  quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
