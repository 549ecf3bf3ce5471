// Terminal UI using Ratatui

pub mod dashboard;
pub mod events;
pub mod form;
pub mod modal;
pub mod state;
pub mod widgets;

pub use events::run_ui;
pub use modal::ConfirmModal;
pub use state::{AppState, logical_cpus};
