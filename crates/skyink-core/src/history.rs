//! Command log for undo.
//!
//! An [`Edit`] is what a caller asks the editor to do; an [`UndoEntry`] is
//! the minimal record needed to reverse it. The log is a plain stack: there
//! is no redo and nothing here is persisted.

use crate::scene::{BodyKind, Scene};
use crate::strokes::Stroke;
use kurbo::Point;

/// A logged mutation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddStar(Point),
    /// Link two stars by index.
    AddLink(usize, usize),
    /// Place the sun, replacing any existing one.
    SetSun(Point),
    /// Place the moon, replacing any existing one.
    SetMoon(Point),
    AddPlanet(BodyKind, Point),
    /// Start a new paint or erase stroke.
    BeginStroke { is_erase: bool },
    /// Remove all bodies, stars and links, keeping strokes.
    ClearObjects,
    /// Remove all objects and all strokes.
    ClearAll,
}

/// Deep copy of everything a bulk clear can discard.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Scene copy without orbit state.
    pub scene: Scene,
    pub strokes: Vec<Stroke>,
}

/// Record that reverses exactly one applied [`Edit`].
#[derive(Debug, Clone)]
pub enum UndoEntry {
    AddStar { index: usize },
    AddLink { index: usize },
    SetSun { previous: Option<Point> },
    SetMoon { previous: Option<Point> },
    AddPlanet { index: usize },
    AddStroke,
    ClearObjects(Box<Snapshot>),
    ClearAll(Box<Snapshot>),
}

impl UndoEntry {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            UndoEntry::AddStar { .. } => "add-star",
            UndoEntry::AddLink { .. } => "add-link",
            UndoEntry::SetSun { .. } => "set-sun",
            UndoEntry::SetMoon { .. } => "set-moon",
            UndoEntry::AddPlanet { .. } => "add-planet",
            UndoEntry::AddStroke => "add-stroke",
            UndoEntry::ClearObjects(_) => "clear-objects",
            UndoEntry::ClearAll(_) => "clear-all",
        }
    }
}

/// Unbounded LIFO of undo entries.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<UndoEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut history = History::new();
        assert!(!history.can_undo());
        history.push(UndoEntry::AddStar { index: 0 });
        history.push(UndoEntry::AddStroke);
        assert_eq!(history.len(), 2);
        assert_eq!(history.peek().map(UndoEntry::label), Some("add-stroke"));
        assert!(matches!(history.pop(), Some(UndoEntry::AddStroke)));
        assert!(matches!(history.pop(), Some(UndoEntry::AddStar { index: 0 })));
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(UndoEntry::ClearAll(Box::default()));
        history.clear();
        assert!(history.is_empty());
    }
}
