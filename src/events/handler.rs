//! Event handler implementation.
//!
//! Polls crossterm for terminal events and converts them to [`Event`]s.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};

use super::Event;

/// Handles application events by polling crossterm for terminal events.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// The poll timeout: the tick rate, shortened to meet `deadline`.
    pub fn timeout_until(&self, deadline: Option<Duration>) -> Duration {
        match deadline {
            Some(remaining) => remaining.min(self.tick_rate),
            None => self.tick_rate,
        }
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> std::io::Result<Event> {
        if !event::poll(timeout)? {
            return Ok(Event::Tick);
        }
        match event::read()? {
            // Release/repeat reports on some platforms would double keys.
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            CrosstermEvent::Resize(width, height) => Ok(Event::Resize(width, height)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_bounded_by_tick_rate() {
        let handler = EventHandler::new(Duration::from_millis(100));
        assert_eq!(handler.timeout_until(None), Duration::from_millis(100));
        assert_eq!(
            handler.timeout_until(Some(Duration::from_millis(30))),
            Duration::from_millis(30)
        );
        assert_eq!(
            handler.timeout_until(Some(Duration::from_secs(5))),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_event_handler_default() {
        assert_eq!(EventHandler::default().tick_rate(), Duration::from_millis(100));
    }
}
