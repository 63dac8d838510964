//! Terminal input events.
//!
//! The render loop polls for input with a timeout bounded by the next
//! debounce deadline; no input within the timeout yields [`Event::Tick`].

mod handler;
pub mod keys;

use crossterm::event::KeyEvent;

pub use handler::EventHandler;

/// One thing the render loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
}
