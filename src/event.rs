//! Terminal event polling.

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;

/// Application event
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard event
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// Bracketed paste
    Paste(String),
    /// Terminal resize event
    Resize(u16, u16),
    /// Terminal focus lost event
    FocusLost,
    /// Terminal focus gained event
    FocusGained,
    /// No input within the tick rate; deferred work runs here
    Tick,
}

/// Event handler for polling terminal events
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Create new event handler with specified tick rate
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Wait for next event
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // With the kitty keyboard protocol we also receive Release events
                CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Ok(Event::Key(key)),
                CrosstermEvent::Key(_) => Ok(Event::Tick),
                CrosstermEvent::Mouse(mouse) => Ok(Event::Mouse(mouse)),
                CrosstermEvent::Paste(text) => Ok(Event::Paste(text)),
                CrosstermEvent::Resize(width, height) => Ok(Event::Resize(width, height)),
                CrosstermEvent::FocusLost => Ok(Event::FocusLost),
                CrosstermEvent::FocusGained => Ok(Event::FocusGained),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}
