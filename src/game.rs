//! The interactive game screen: drives a [`GameState`] from a fixed-period
//! tick, maps key presses onto it, and hands the final score to the
//! leaderboard when the game ends.
use crate::app::Screen;
use crate::command::Command;
use crate::consts;
use crate::engine::{Bounds, Direction, GameOverReason, GameState, StepOutcome};
use crate::leaderboard::{LeaderboardStore, ScoreRecord, Submission};
use crate::util::{center_rect, ellipsize};
use crossterm::event::{poll, read, Event};
use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Margin, Position, Rect, Size},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
    Frame,
};
use std::time::Instant;

#[derive(Clone, Debug)]
pub(crate) struct Game<R = rand::rngs::ThreadRng> {
    rng: R,
    state: GameState,
    phase: Phase,
    /// When the next tick is due.  `None` while no tick is scheduled.
    next_tick: Option<Instant>,
    player: String,
    store: LeaderboardStore,
    /// The most recently fetched top scores
    leaderboard: Vec<ScoreRecord>,
}

impl Game<rand::rngs::ThreadRng> {
    pub(crate) fn new(bounds: Bounds, store: LeaderboardStore, player: String) -> Self {
        Game::new_with_rng(bounds, store, player, rand::rng())
    }
}

impl<R: Rng> Game<R> {
    pub(crate) fn new_with_rng(
        bounds: Bounds,
        store: LeaderboardStore,
        player: String,
        mut rng: R,
    ) -> Game<R> {
        let state = GameState::new(bounds, &mut rng);
        let mut game = Game {
            rng,
            state,
            phase: Phase::Ready,
            next_tick: None,
            player,
            store,
            leaderboard: Vec::new(),
        };
        game.refresh_leaderboard();
        game
    }

    pub(crate) fn process_input(&mut self) -> std::io::Result<Option<Screen>> {
        if let Some(when) = self.deadline() {
            let wait = when.saturating_duration_since(Instant::now());
            if wait.is_zero() || !poll(wait)? {
                self.on_deadline();
                Ok(None)
            } else {
                Ok(self.handle_event(read()?))
            }
        } else {
            Ok(self.handle_event(read()?))
        }
    }

    /// Return the time at which [`Game::on_deadline()`] should next be
    /// called, scheduling the next tick if necessary
    fn deadline(&mut self) -> Option<Instant> {
        match self.phase {
            Phase::Ready | Phase::Over { pending: None, .. } => None,
            Phase::Playing => Some(
                *self
                    .next_tick
                    .get_or_insert_with(|| Instant::now() + consts::TICK_PERIOD),
            ),
            Phase::Over {
                pending: Some(when),
                ..
            } => Some(when),
        }
    }

    fn on_deadline(&mut self) {
        match self.phase {
            Phase::Playing => {
                self.next_tick = None;
                self.tick();
            }
            Phase::Over {
                pending: Some(_), ..
            } => self.finish_game_over(),
            _ => (),
        }
    }

    fn tick(&mut self) {
        if let StepOutcome::GameOver(reason) = self.state.step(&mut self.rng) {
            self.game_over(reason);
        }
    }

    fn handle_event(&mut self, event: Event) -> Option<Screen> {
        match Command::from_key_event(event.as_key_press_event()?)? {
            Command::Quit | Command::Q => return Some(Screen::Quit),
            Command::Start => self.start(),
            Command::Pause if self.phase == Phase::Playing => self.state.toggle_pause(),
            Command::Up => self.turn(Direction::North),
            Command::Down => self.turn(Direction::South),
            Command::Left => self.turn(Direction::West),
            Command::Right => self.turn(Direction::East),
            Command::Pause => (),
        }
        None
    }

    /// Reset the game and start the tick scheduler
    fn start(&mut self) {
        if matches!(self.phase, Phase::Over { pending: Some(_), .. }) {
            self.finish_game_over();
        }
        if self.phase != Phase::Ready {
            self.state.reset(&mut self.rng);
        }
        self.phase = Phase::Playing;
        self.next_tick = None;
    }

    fn turn(&mut self, direction: Direction) {
        if self.phase == Phase::Playing {
            let _ = self.state.set_direction(direction);
        }
    }

    /// Stop the tick scheduler.  The score is handed to the leaderboard once
    /// [`GAME_OVER_DELAY`][consts::GAME_OVER_DELAY] has passed, giving the
    /// final frame time to be drawn.
    fn game_over(&mut self, reason: GameOverReason) {
        self.next_tick = None;
        self.phase = Phase::Over {
            reason,
            pending: Some(Instant::now() + consts::GAME_OVER_DELAY),
        };
    }

    fn finish_game_over(&mut self) {
        if let Phase::Over {
            ref mut pending, ..
        } = self.phase
        {
            *pending = None;
        }
        let score = self.state.score();
        if score > 0 {
            let submission = Submission::new(&self.player, u64::from(score));
            log::debug!(
                "Submitting score {} for {:?}",
                submission.score(),
                submission.name()
            );
            if let Err(e) = self.store.submit(submission) {
                log::warn!("{:#}", anyhow::Error::new(e));
            }
        }
        self.refresh_leaderboard();
    }
}

impl<R> Game<R> {
    pub(crate) fn draw(&self, frame: &mut Frame<'_>) {
        frame.render_widget(self, frame.area());
    }

    fn refresh_leaderboard(&mut self) {
        self.leaderboard = self.store.top_n(consts::DEFAULT_TOP_LIMIT);
    }
}

/// Return the name to record on the leaderboard for `name`: trimmed, cut down
/// to [`MAX_NAME_LEN`][consts::MAX_NAME_LEN] characters, and replaced with
/// [`DEFAULT_PLAYER_NAME`][consts::DEFAULT_PLAYER_NAME] if blank
pub(crate) fn player_name(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.chars().take(consts::MAX_NAME_LEN).collect(),
        None => String::from(consts::DEFAULT_PLAYER_NAME),
    }
}

impl<R> Widget for &Game<R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [score_area, main_area, msg1_area, msg2_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);
        Line::styled(
            format!(" Score: {}", self.state.score()),
            consts::SCORE_BAR_STYLE,
        )
        .render(score_area, buf);

        let mut block_size = self.state.bounds().size();
        block_size.width = block_size.width.saturating_add(2);
        block_size.height = block_size.height.saturating_add(2);
        let [board_area, panel_area] = Layout::horizontal([
            Constraint::Length(block_size.width),
            Constraint::Length(consts::LEADERBOARD_PANEL_WIDTH),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(main_area);
        let block_area = center_rect(board_area, block_size);
        Block::bordered().render(block_area, buf);

        let mut board = Canvas {
            area: block_area.inner(Margin::new(1, 1)),
            buf,
        };
        for p in self.state.snake().body() {
            board.draw_cell(p, consts::SNAKE_BODY_SYMBOL, consts::SNAKE_STYLE);
        }
        if let Some(pos) = self.state.food() {
            board.draw_cell(pos, consts::FOOD_SYMBOL, consts::FOOD_STYLE);
        }
        let head = self.state.snake().head();
        match self.phase {
            Phase::Over {
                reason: GameOverReason::OutOfBounds | GameOverReason::SelfCollision,
                ..
            } => board.draw_cell(head, consts::COLLISION_SYMBOL, consts::COLLISION_STYLE),
            _ => board.draw_cell(head, consts::SNAKE_HEAD_SYMBOL, consts::SNAKE_HEAD_STYLE),
        }

        let panel_area = center_rect(
            panel_area,
            Size {
                width: consts::LEADERBOARD_PANEL_WIDTH,
                height: block_size.height,
            },
        );
        LeaderboardPanel(&self.leaderboard).render(panel_area, buf);

        let (msg1, msg2) = match self.phase {
            Phase::Ready => (
                Line::from(" Eat the food, but don't hit the walls or yourself!"),
                keys_line(&[("Enter", "Start"), ("q", "Quit")]),
            ),
            Phase::Playing if self.state.paused() => (
                Line::from(" — PAUSED —"),
                keys_line(&[("Space", "Resume"), ("Enter", "Restart"), ("q", "Quit")]),
            ),
            Phase::Playing => (
                Line::default(),
                keys_line(&[("←↓↑→/wasd", "Move"), ("Space", "Pause"), ("q", "Quit")]),
            ),
            Phase::Over { .. } => (
                Line::from(format!(" — GAME OVER — Score: {}", self.state.score())),
                keys_line(&[("Enter", "Play Again"), ("q", "Quit")]),
            ),
        };
        msg1.render(msg1_area, buf);
        msg2.render(msg2_area, buf);
    }
}

/// Render a list of key bindings as ` Start (Enter) — Quit (q)`
fn keys_line(bindings: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut line = Line::default();
    for (i, &(key, action)) in bindings.iter().enumerate() {
        line.push_span(if i == 0 { " " } else { " — " });
        line.push_span(action);
        line.push_span(" (");
        line.push_span(Span::styled(key, consts::KEY_STYLE));
        line.push_span(")");
    }
    line
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct LeaderboardPanel<'a>(&'a [ScoreRecord]);

impl Widget for LeaderboardPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(" Top Scores ");
        let inner = block.inner(area);
        block.render(area, buf);
        if self.0.is_empty() {
            Line::from(" No scores yet").render(inner, buf);
            return;
        }
        for (i, (rec, row)) in self.0.iter().zip(inner.rows()).enumerate() {
            let score = rec.score.to_string();
            // "NN. " + name + " " + score
            let name_width = usize::from(row.width)
                .saturating_sub(4)
                .saturating_sub(score.len() + 1);
            let name = ellipsize(&rec.name, name_width);
            Line::from(format!(
                "{rank:>2}. {name:name_width$} {score}",
                rank = i + 1
            ))
            .render(row, buf);
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn draw_cell(&mut self, pos: Position, symbol: char, style: Style) {
        let Some(x) = self.area.x.checked_add(pos.x) else {
            return;
        };
        let Some(y) = self.area.y.checked_add(pos.y) else {
            return;
        };
        if !self.area.contains(Position { x, y }) {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(symbol);
            cell.set_style(Style::reset().patch(style));
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    /// A fresh game is on the board, but the tick scheduler hasn't been
    /// started yet.
    Ready,
    Playing,
    Over {
        reason: GameOverReason,
        /// When the final score is due to be handed to the leaderboard.
        /// `None` once that's been done.
        pending: Option<Instant>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use tempfile::TempDir;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn new_game(width: u16, height: u16) -> (TempDir, Game<ChaCha12Rng>) {
        let tmpdir = tempfile::tempdir().unwrap();
        let store = LeaderboardStore::new(tmpdir.path().join("scores.json"));
        let game = Game::new_with_rng(
            Bounds { width, height },
            store,
            String::from("Alice"),
            ChaCha12Rng::seed_from_u64(RNG_SEED),
        );
        (tmpdir, game)
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn count_symbol(buf: &Buffer, symbol: char) -> usize {
        let symbol = symbol.to_string();
        buf.content.iter().filter(|c| c.symbol() == symbol).count()
    }

    #[test]
    fn waits_for_start() {
        let (_tmpdir, mut game) = new_game(10, 10);
        assert_eq!(game.phase, Phase::Ready);
        assert_eq!(game.deadline(), None);
        assert!(game.handle_event(key(KeyCode::Enter)).is_none());
        assert_eq!(game.phase, Phase::Playing);
        assert!(game.deadline().is_some());
    }

    #[test]
    fn tick_moves_snake() {
        let (_tmpdir, mut game) = new_game(10, 10);
        let _ = game.handle_event(key(KeyCode::Enter));
        assert_eq!(game.state.snake().head(), Position::new(5, 5));
        let _ = game.handle_event(key(KeyCode::Down));
        game.on_deadline();
        assert_eq!(game.state.snake().head(), Position::new(5, 6));
        assert_eq!(game.next_tick, None);
    }

    #[test]
    fn turning_ignored_before_start() {
        let (_tmpdir, mut game) = new_game(10, 10);
        let _ = game.handle_event(key(KeyCode::Up));
        assert_eq!(game.state.direction(), Direction::East);
    }

    #[test]
    fn space_toggles_pause() {
        let (_tmpdir, mut game) = new_game(10, 10);
        let _ = game.handle_event(key(KeyCode::Enter));
        let _ = game.handle_event(key(KeyCode::Char(' ')));
        assert!(game.state.paused());
        game.on_deadline();
        assert_eq!(game.state.snake().head(), Position::new(5, 5));
        let _ = game.handle_event(key(KeyCode::Char(' ')));
        assert!(!game.state.paused());
    }

    #[test]
    fn quit() {
        let (_tmpdir, mut game) = new_game(10, 10);
        assert!(matches!(
            game.handle_event(key(KeyCode::Char('q'))),
            Some(Screen::Quit)
        ));
        assert!(matches!(
            game.handle_event(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            ))),
            Some(Screen::Quit)
        ));
    }

    #[test]
    fn game_over_submits_after_delay() {
        // On a 2×1 grid the snake starts at (1, 0) with the food at (0, 0),
        // so heading west eats it and fills the board.
        let (_tmpdir, mut game) = new_game(2, 1);
        let _ = game.handle_event(key(KeyCode::Enter));
        let _ = game.handle_event(key(KeyCode::Left));
        game.on_deadline();
        assert!(matches!(
            game.phase,
            Phase::Over {
                reason: GameOverReason::BoardFull,
                pending: Some(_)
            }
        ));
        assert_eq!(game.next_tick, None);
        assert!(game.store.top_n(10).is_empty());
        game.on_deadline();
        assert!(matches!(game.phase, Phase::Over { pending: None, .. }));
        assert_eq!(game.deadline(), None);
        let top = game.store.top_n(10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Alice");
        assert_eq!(top[0].score, 10);
        assert_eq!(game.leaderboard, top);
    }

    #[test]
    fn zero_score_not_submitted() {
        let (_tmpdir, mut game) = new_game(2, 2);
        game.store.submit(Submission::new("Bob", 30)).unwrap();
        assert!(game.leaderboard.is_empty());
        let _ = game.handle_event(key(KeyCode::Enter));
        game.on_deadline();
        assert!(matches!(
            game.phase,
            Phase::Over {
                reason: GameOverReason::OutOfBounds,
                ..
            }
        ));
        game.on_deadline();
        let top = game.store.top_n(10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Bob");
        assert_eq!(game.leaderboard, top);
    }

    #[test]
    fn restart_flushes_pending_submission() {
        let (_tmpdir, mut game) = new_game(2, 1);
        let _ = game.handle_event(key(KeyCode::Enter));
        let _ = game.handle_event(key(KeyCode::Left));
        game.on_deadline();
        let _ = game.handle_event(key(KeyCode::Enter));
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.state.score(), 0);
        assert_eq!(game.state.snake().len(), 1);
        assert_eq!(game.store.top_n(10).len(), 1);
    }

    #[test]
    fn draw_ready() {
        let (_tmpdir, game) = new_game(10, 10);
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        game.render(area, &mut buffer);
        assert_eq!(row(&buffer, 0).trim_end(), " Score: 0");
        assert_eq!(count_symbol(&buffer, consts::SNAKE_HEAD_SYMBOL), 1);
        assert_eq!(count_symbol(&buffer, consts::FOOD_SYMBOL), 1);
        assert!(row(&buffer, 23).contains("Start (Enter)"));
        assert!((1..23).any(|y| row(&buffer, y).contains("No scores yet")));
    }

    #[test]
    fn draw_game_over() {
        let (_tmpdir, mut game) = new_game(2, 2);
        let _ = game.handle_event(key(KeyCode::Enter));
        game.on_deadline();
        game.on_deadline();
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        game.render(area, &mut buffer);
        assert_eq!(count_symbol(&buffer, consts::COLLISION_SYMBOL), 1);
        assert_eq!(count_symbol(&buffer, consts::SNAKE_HEAD_SYMBOL), 0);
        assert!(row(&buffer, 22).contains("GAME OVER"));
        assert!(row(&buffer, 23).contains("Play Again (Enter)"));
    }

    #[test]
    fn draw_leaderboard() {
        let (_tmpdir, mut game) = new_game(10, 10);
        game.store.submit(Submission::new("Bob", 120)).unwrap();
        game.store.submit(Submission::new("Carol", 40)).unwrap();
        game.refresh_leaderboard();
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        game.render(area, &mut buffer);
        let bob = (1..23).find(|&y| row(&buffer, y).contains(" 1. Bob"));
        let carol = (1..23).find(|&y| row(&buffer, y).contains(" 2. Carol"));
        assert!(bob.is_some());
        assert_eq!(carol, bob.map(|y| y + 1));
    }

    #[test]
    fn test_player_name() {
        assert_eq!(player_name(None), "Player");
        assert_eq!(player_name(Some("   ")), "Player");
        assert_eq!(player_name(Some("  Alice ")), "Alice");
        assert_eq!(player_name(Some("x".repeat(40).as_str())), "x".repeat(30));
    }
}
