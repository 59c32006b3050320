//! Grid state of a single game of snake and the per-tick transition rule
mod direction;
mod snake;
pub(crate) use self::direction::Direction;
pub(crate) use self::snake::Snake;
use crate::consts;
use rand::{seq::IteratorRandom, Rng};
use ratatui::layout::{Position, Positions, Rect, Size};

/// The dimensions of the playing field.  Valid cells are those in
/// `[0, width) × [0, height)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) width: u16,
    pub(crate) height: u16,
}

impl Bounds {
    pub(crate) fn size(self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub(crate) fn center(self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    pub(crate) fn positions(self) -> Positions {
        Rect::from((Position::ORIGIN, self.size())).positions()
    }
}

impl From<Size> for Bounds {
    fn from(size: Size) -> Bounds {
        Bounds {
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GameState {
    bounds: Bounds,
    snake: Snake,
    direction: Direction,
    /// `None` only once the snake has filled the entire grid
    food: Option<Position>,
    score: u32,
    paused: bool,
    running: bool,
}

impl GameState {
    /// Start a new game: a length-1 snake in the center of the grid heading
    /// east, with food placed in a random empty cell.
    pub(crate) fn new<R: Rng + ?Sized>(bounds: Bounds, rng: &mut R) -> GameState {
        let mut state = GameState {
            bounds,
            snake: Snake::new(bounds.center()),
            direction: Direction::East,
            food: None,
            score: 0,
            paused: false,
            running: true,
        };
        state.place_food(rng);
        state
    }

    pub(crate) fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = GameState::new(self.bounds, rng);
    }

    /// Advance the game by one tick.
    pub(crate) fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepOutcome {
        if self.paused || !self.running {
            return StepOutcome::Idle;
        }
        let Some(head) = self.direction.advance(self.snake.head(), self.bounds) else {
            return self.end(GameOverReason::OutOfBounds);
        };
        if self.snake.contains(head) {
            return self.end(GameOverReason::SelfCollision);
        }
        let ate = self.food == Some(head);
        self.snake.slither(head, ate);
        if !ate {
            return StepOutcome::Moved;
        }
        self.score += consts::FOOD_REWARD;
        if !self.place_food(rng) {
            return self.end(GameOverReason::BoardFull);
        }
        StepOutcome::Ate
    }

    /// Point the snake in direction `d` for the next tick.  Returns `false`
    /// if the change was rejected because `d` would reverse the snake into
    /// itself.
    pub(crate) fn set_direction(&mut self, d: Direction) -> bool {
        if self.snake.len() > 1 && d == self.direction.reverse() {
            return false;
        }
        self.direction = d;
        true
    }

    /// Pause or unpause the game.  Has no effect once the game is over.
    pub(crate) fn toggle_pause(&mut self) {
        if self.running {
            self.paused = !self.paused;
        }
    }

    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn snake(&self) -> &Snake {
        &self.snake
    }

    #[cfg(test)]
    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn food(&self) -> Option<Position> {
        self.food
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn paused(&self) -> bool {
        self.paused
    }

    #[cfg(test)]
    pub(crate) fn running(&self) -> bool {
        self.running
    }

    fn end(&mut self, reason: GameOverReason) -> StepOutcome {
        self.running = false;
        self.paused = false;
        StepOutcome::GameOver(reason)
    }

    /// Put the food in a uniformly random cell not occupied by the snake.
    /// Returns `false` if there are no such cells.
    fn place_food<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let snake = &self.snake;
        self.food = self
            .bounds
            .positions()
            .filter(|&p| !snake.contains(p))
            .choose(rng);
        self.food.is_some()
    }
}

/// What happened during a call to [`GameState::step()`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StepOutcome {
    /// The game is paused or already over; nothing changed.
    Idle,
    Moved,
    /// The snake ate the food, grew, and new food was placed.
    Ate,
    GameOver(GameOverReason),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum GameOverReason {
    /// The snake tried to leave the grid.
    OutOfBounds,
    /// The snake ran into itself.
    SelfCollision,
    /// The snake filled the grid, leaving nowhere to put the food.
    BoardFull,
}
