use crate::consts;
use crate::engine::Bounds;
use ratatui::layout::Size;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
pub(crate) struct Config {
    /// Settings for the playing field
    #[serde(default)]
    pub(crate) game: GameConfig,

    #[serde(default)]
    pub(crate) player: PlayerConfig,

    /// Where the leaderboard is stored
    #[serde(default)]
    pub(crate) leaderboard: LeaderboardConfig,

    /// Settings for `snakeboard serve`
    #[serde(default)]
    pub(crate) server: ServerConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("snakeboard").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read or if the file's contents
    /// could not be deserialized.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        toml::from_str(&content).map_err(Into::into)
    }
}

#[derive(Clone, Copy, Deserialize, Debug, Eq, PartialEq)]
#[serde(try_from = "RawGameConfig")]
pub(crate) struct GameConfig {
    bounds: Bounds,
}

impl GameConfig {
    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Default for GameConfig {
    fn default() -> GameConfig {
        GameConfig {
            bounds: Bounds::from(consts::GRID_SIZE),
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default)]
struct RawGameConfig {
    width: u16,
    height: u16,
}

impl Default for RawGameConfig {
    fn default() -> RawGameConfig {
        RawGameConfig {
            width: consts::GRID_SIZE.width,
            height: consts::GRID_SIZE.height,
        }
    }
}

impl TryFrom<RawGameConfig> for GameConfig {
    type Error = GridSizeError;

    fn try_from(value: RawGameConfig) -> Result<GameConfig, GridSizeError> {
        let RawGameConfig { width, height } = value;
        if width < 2 || height < 2 {
            return Err(GridSizeError { width, height });
        }
        Ok(GameConfig {
            bounds: Bounds::from(Size { width, height }),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("grid must be at least 2×2 cells; got {width}×{height}")]
pub(crate) struct GridSizeError {
    width: u16,
    height: u16,
}

#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
pub(crate) struct PlayerConfig {
    /// Name recorded on the leaderboard for this player's scores
    #[serde(default)]
    pub(crate) name: Option<String>,
}

#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct LeaderboardConfig {
    scores_file: Option<PathBuf>,
}

impl LeaderboardConfig {
    /// Return the path to the leaderboard file: the file given in the
    /// configuration or, if that is not set, `scores.json` in the local data
    /// directory.
    pub(crate) fn scores_file(&self) -> Result<PathBuf, ConfigError> {
        match self.scores_file {
            Some(ref p) => Ok(p.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join("snakeboard").join("scores.json"))
                .ok_or(ConfigError::NoDataPath),
        }
    }
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            host: String::from(consts::DEFAULT_HOST),
            port: consts::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to determine path to local data directory")]
    NoDataPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config() {
        let cfg = toml::from_str::<Config>("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(
            cfg.game.bounds(),
            Bounds {
                width: 20,
                height: 20
            }
        );
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.player.name, None);
    }

    #[test]
    fn full_config() {
        let cfg = toml::from_str::<Config>(concat!(
            "[game]\n",
            "width = 30\n",
            "height = 15\n",
            "\n",
            "[player]\n",
            "name = \"Alice\"\n",
            "\n",
            "[leaderboard]\n",
            "scores-file = \"/var/lib/snakeboard/scores.json\"\n",
            "\n",
            "[server]\n",
            "host = \"0.0.0.0\"\n",
            "port = 8080\n",
        ))
        .unwrap();
        assert_eq!(
            cfg.game.bounds(),
            Bounds {
                width: 30,
                height: 15
            }
        );
        assert_eq!(cfg.player.name.as_deref(), Some("Alice"));
        assert_eq!(
            cfg.leaderboard.scores_file().unwrap(),
            PathBuf::from("/var/lib/snakeboard/scores.json")
        );
        assert_eq!(
            cfg.server,
            ServerConfig {
                host: String::from("0.0.0.0"),
                port: 8080
            }
        );
    }

    #[test]
    fn partial_game_config() {
        let cfg = toml::from_str::<Config>("[game]\nheight = 12\n").unwrap();
        assert_eq!(
            cfg.game.bounds(),
            Bounds {
                width: 20,
                height: 12
            }
        );
    }

    #[test]
    fn grid_too_small() {
        let r = toml::from_str::<Config>("[game]\nwidth = 1\nheight = 10\n");
        assert!(r.is_err());
    }

    #[test]
    fn load_missing_allowed() {
        let tmpdir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&tmpdir.path().join("config.toml"), true).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_missing_not_allowed() {
        let tmpdir = tempfile::tempdir().unwrap();
        let r = Config::load(&tmpdir.path().join("config.toml"), false);
        assert!(matches!(r, Err(ConfigError::Read(_))));
    }

    #[test]
    fn load_invalid() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("config.toml");
        fs_err::write(&path, "[server]\nport = \"eighty\"\n").unwrap();
        let r = Config::load(&path, true);
        assert!(matches!(r, Err(ConfigError::Parse(_))));
    }
}
