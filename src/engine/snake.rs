use ratatui::layout::Position;
use std::collections::VecDeque;

/// The cells occupied by the snake, head first.
///
/// A `Snake` is never empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    pub(super) cells: VecDeque<Position>,
}

impl Snake {
    /// Create a snake of length 1 occupying just `head`
    pub(crate) fn new(head: Position) -> Snake {
        Snake {
            cells: VecDeque::from([head]),
        }
    }

    pub(crate) fn head(&self) -> Position {
        self.cells[0]
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over the cells behind the head, nearest first
    pub(crate) fn body(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().skip(1).copied()
    }

    pub(crate) fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    /// Move the head onto `head`.  Unless `grow` is true, the last cell of
    /// the tail is vacated so that the length stays the same.
    pub(crate) fn slither(&mut self, head: Position, grow: bool) {
        self.cells.push_front(head);
        if !grow {
            let _ = self.cells.pop_back();
        }
    }
}
