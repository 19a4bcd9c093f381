//! TUI widgets for the console

pub mod console;
pub mod entity_table;
pub mod graph;
pub mod input;
pub mod state_panel;
pub mod timeline;

pub use console::ConsoleWidget;
pub use entity_table::{EntityTableWidget, InspectorWidget};
pub use graph::GraphWidget;
pub use input::InputWidget;
pub use state_panel::StatePanelWidget;
pub use timeline::TimelineWidget;
