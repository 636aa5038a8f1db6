//! Active page tracking.
//!
//! Positions are 1-based indices into the book's page list (source order), not
//! the author-assigned page numbers. Holding the active position in a single
//! `Option` means there is never a moment with zero or two active pages once a
//! book is loaded.

use std::fmt;

/// Keys the navigator understands; anything else arrives as `Other`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Other(String),
}

impl Key {
    /// Map a key name as reported by an input surface (`"ArrowUp"`, `"x"`, ...)
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            other => Key::Other(other.to_string()),
        }
    }

    /// Step applied to the active position, or `None` for keys that are ignored
    fn step(&self) -> Option<i64> {
        match self {
            Key::ArrowUp | Key::PageUp => Some(1),
            Key::ArrowDown | Key::PageDown => Some(-1),
            Key::Other(_) => None,
        }
    }
}

/// A key press plus whether an earlier handler already claimed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            default_prevented: false,
        }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        KeyEvent::new(key)
    }
}

/// Page navigation state machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    page_count: usize,
    active: Option<usize>,
}

impl Navigator {
    /// Navigator with no book loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a freshly loaded book; page 1 becomes active when there is one.
    pub fn reset(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.active = (page_count > 0).then_some(1);
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Active 1-based position, `None` before a book is loaded
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, position: usize) -> bool {
        self.active == Some(position)
    }

    /// Move to `requested`, clamping into `[1, page_count]`.
    ///
    /// Returns the accepted position. Before a book is loaded there is nothing
    /// to select and the state is left untouched (returns 0).
    pub fn select_page(&mut self, requested: i64) -> usize {
        if self.page_count == 0 {
            return 0;
        }
        let max = self.page_count as i64;
        let accepted = requested.clamp(1, max) as usize;
        self.active = Some(accepted);
        accepted
    }

    /// Apply a key event.
    ///
    /// Returns the new active position when the key was consumed, `None` when
    /// it was ignored (unknown key, already handled upstream, or no book).
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<usize> {
        if event.default_prevented {
            return None;
        }
        let step = event.key.step()?;
        let current = self.active? as i64;
        Some(self.select_page(current + step))
    }
}

impl fmt::Display for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active {
            Some(pos) => write!(f, "{} / {}", pos, self.page_count),
            None => write!(f, "- / {}", self.page_count),
        }
    }
}
