//! UI widgets for the chat widget.
//!
//! This module provides:
//! - [`ChatView`] - Launcher or panel, depending on visibility
//! - [`InputBar`] - Input footer with placeholder and send hint
//! - [`Launcher`] - Badge shown while the panel is closed

mod input_bar;
mod launcher;
mod panel;
pub mod transcript;

pub use input_bar::InputBar;
pub use launcher::Launcher;
pub use panel::{panel_rect, ChatView};
