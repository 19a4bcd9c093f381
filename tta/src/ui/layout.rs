//! Screen layout calculation

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the console view.
pub struct ConsoleLayout {
    pub title_area: Rect,
    pub console_area: Rect,
    pub state_area: Rect,
    pub graph_area: Rect,
    pub timeline_area: Rect,
    pub status_bar: Rect,
    pub input_area: Rect,
}

impl ConsoleLayout {
    /// Transcript on the left (60%), state, graph and timeline stacked on the right.
    pub fn calculate(area: Rect) -> Self {
        let (title_area, body, status_bar, input_area) = frame_rows(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(body);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9),
                Constraint::Min(6),
                Constraint::Percentage(35),
            ])
            .split(columns[1]);

        Self {
            title_area,
            console_area: columns[0],
            state_area: sidebar[0],
            graph_area: sidebar[1],
            timeline_area: sidebar[2],
            status_bar,
            input_area,
        }
    }
}

/// Areas of the database view.
pub struct DatabaseLayout {
    pub title_area: Rect,
    pub table_area: Rect,
    pub inspector_area: Rect,
    pub status_bar: Rect,
    pub input_area: Rect,
}

impl DatabaseLayout {
    /// Entity table on the left (65%), inspector on the right.
    pub fn calculate(area: Rect) -> Self {
        let (title_area, body, status_bar, input_area) = frame_rows(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(body);

        Self {
            title_area,
            table_area: columns[0],
            inspector_area: columns[1],
            status_bar,
            input_area,
        }
    }
}

fn frame_rows(area: Rect) -> (Rect, Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);
    (rows[0], rows[1], rows[2], rows[3])
}

/// Centered rectangle of a fixed size, clamped to `area`.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
