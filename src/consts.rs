//! Assorted constants & hard-coded configuration
use ratatui::{
    layout::Size,
    style::{Color, Modifier, Style},
};
use std::time::Duration;

/// Time between movements of the snake
pub(crate) const TICK_PERIOD: Duration = Duration::from_millis(120);

/// How long to wait after a game ends before handing the score to the
/// leaderboard, so that the final frame gets drawn first
pub(crate) const GAME_OVER_DELAY: Duration = Duration::from_millis(50);

/// Points awarded for each piece of food eaten
pub(crate) const FOOD_REWARD: u32 = 10;

/// Default size of the playing field
pub(crate) const GRID_SIZE: Size = Size {
    width: 20,
    height: 20,
};

/// Maximum number of characters kept from a submitted player name
pub(crate) const MAX_NAME_LEN: usize = 30;

/// Name used for scores when the player hasn't given one
pub(crate) const DEFAULT_PLAYER_NAME: &str = "Player";

/// Maximum number of records retained in the leaderboard
pub(crate) const LEADERBOARD_CAPACITY: usize = 50;

/// Number of records returned by a leaderboard query that doesn't specify a
/// limit, and the number shown beside the game
pub(crate) const DEFAULT_TOP_LIMIT: usize = 10;

/// Port the leaderboard server listens on when nothing else is configured
pub(crate) const DEFAULT_PORT: u16 = 3000;

pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";

/// Glyph for the snake's head
pub(crate) const SNAKE_HEAD_SYMBOL: char = '@';

/// Glyph for the parts of the snake's body
pub(crate) const SNAKE_BODY_SYMBOL: char = '⚬';

/// Glyph for the food
pub(crate) const FOOD_SYMBOL: char = '●';

/// Glyph for the snake's head once it's hit a wall or itself
pub(crate) const COLLISION_SYMBOL: char = '×';

/// Style for the snake's head
pub(crate) const SNAKE_HEAD_STYLE: Style = Style::new()
    .fg(Color::LightGreen)
    .add_modifier(Modifier::BOLD);

/// Style for the snake's body
pub(crate) const SNAKE_STYLE: Style = Style::new().fg(Color::Green);

/// Style for the food
pub(crate) const FOOD_STYLE: Style = Style::new().fg(Color::LightRed);

/// Style for [`COLLISION_SYMBOL`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the score bar at the top of the game screen
pub(crate) const SCORE_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Width of the leaderboard panel beside the playing field
pub(crate) const LEADERBOARD_PANEL_WIDTH: u16 = 28;
