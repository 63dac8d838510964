//! Terminal rendering.
//!
//! Everything here reads [`crate::app::App`]; the only state written back
//! is pane geometry (scroll metrics) in [`layout::PaneLayout`].

pub mod layout;
pub mod notification;
mod popup;
mod render;
pub mod theme;

pub use render::render;
