//! Color theme and styling for the console

use ratatui::style::{Color, Modifier, Style};
use tta_core::{LogType, NodeType};

/// Console color theme
#[derive(Debug, Clone)]
pub struct ConsoleTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // HP colors
    pub hp_healthy: Color,
    pub hp_wounded: Color,
    pub hp_critical: Color,

    // Transcript colors
    pub neural_text: Color,
    pub symbolic_text: Color,
    pub system_text: Color,
    pub user_text: Color,

    // Entity colors
    pub character: Color,
    pub location: Color,
    pub item: Color,
    pub concept: Color,

    // Timeline colors
    pub active_commit: Color,
    pub branch: Color,
    pub hash: Color,
    pub error: Color,
}

impl Default for ConsoleTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            hp_healthy: Color::Green,
            hp_wounded: Color::Yellow,
            hp_critical: Color::Red,

            neural_text: Color::White,
            symbolic_text: Color::LightGreen,
            system_text: Color::DarkGray,
            user_text: Color::Cyan,

            character: Color::LightRed,
            location: Color::LightBlue,
            item: Color::Yellow,
            concept: Color::Magenta,

            active_commit: Color::LightGreen,
            branch: Color::LightMagenta,
            hash: Color::Yellow,
            error: Color::Red,
        }
    }
}

impl ConsoleTheme {
    /// Style for a transcript entry
    pub fn log_style(&self, kind: LogType) -> Style {
        match kind {
            LogType::Neural => Style::default().fg(self.neural_text),
            LogType::Symbolic => Style::default().fg(self.symbolic_text),
            LogType::System => Style::default()
                .fg(self.system_text)
                .add_modifier(Modifier::DIM),
            LogType::User => Style::default()
                .fg(self.user_text)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// Style for an entity label
    pub fn node_style(&self, kind: NodeType) -> Style {
        let color = match kind {
            NodeType::Character => self.character,
            NodeType::Location => self.location,
            NodeType::Item => self.item,
            NodeType::Concept => self.concept,
        };
        Style::default().fg(color)
    }

    /// Get HP color based on ratio
    pub fn hp_color(&self, ratio: f32) -> Color {
        if ratio > 0.5 {
            self.hp_healthy
        } else if ratio > 0.25 {
            self.hp_wounded
        } else {
            self.hp_critical
        }
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().add_modifier(Modifier::DIM)
    }
}
