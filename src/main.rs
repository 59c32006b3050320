mod app;
mod command;
mod config;
mod consts;
mod engine;
mod game;
mod leaderboard;
mod server;
mod util;
use crate::app::App;
use crate::config::Config;
use crate::game::{player_name, Game};
use crate::leaderboard::LeaderboardStore;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;

static USAGE: &str = "\
Usage: snakeboard [play] [options]
       snakeboard serve [options]

Commands:
  play                      Play snake in the terminal (default)
  serve                     Run the leaderboard HTTP server

Options:
  -c, --config <PATH>       Read configuration from <PATH>
  -f, --scores-file <PATH>  Store the leaderboard in <PATH>
  -n, --name <NAME>         Name to record your scores under [play]
  -p, --port <PORT>         Port to listen on [serve]
  -h, --help                Show this help and exit
  -V, --version             Show the program version and exit
";

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Arguments),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut args = Arguments::default();
        let mut mode = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('c') | Arg::Long("config") => {
                    args.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('f') | Arg::Long("scores-file") => {
                    args.scores_file = Some(PathBuf::from(parser.value()?));
                }
                Arg::Short('n') | Arg::Long("name") => {
                    args.name = Some(parser.value()?.string()?);
                }
                Arg::Short('p') | Arg::Long("port") => {
                    args.port = Some(parser.value()?.parse()?);
                }
                Arg::Value(value) if mode.is_none() => {
                    let value = value.string()?;
                    mode = Some(match value.as_str() {
                        "play" => Mode::Play,
                        "serve" => Mode::Serve,
                        _ => return Err(format!("unknown command {value:?}").into()),
                    });
                }
                _ => return Err(arg.unexpected()),
            }
        }
        args.mode = mode.unwrap_or_default();
        Ok(Command::Run(args))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Arguments {
    mode: Mode,
    config: Option<PathBuf>,
    scores_file: Option<PathBuf>,
    name: Option<String>,
    port: Option<u16>,
}

impl Arguments {
    fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let scores_file = match self.scores_file {
            Some(p) => p,
            None => config.leaderboard.scores_file()?,
        };
        let store = LeaderboardStore::new(scores_file);
        match self.mode {
            Mode::Play => {
                let player = player_name(self.name.as_deref().or(config.player.name.as_deref()));
                let game = Game::new(config.game.bounds(), store, player);
                let terminal = ratatui::try_init()?;
                let r = App::new(game).run(terminal);
                ratatui::restore();
                r?;
                Ok(())
            }
            Mode::Serve => {
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                    .init();
                let port = match self.port {
                    Some(p) => p,
                    None => port_from_env()?.unwrap_or(config.server.port),
                };
                actix_web::rt::System::new().block_on(server::serve(
                    store,
                    config.server.host,
                    port,
                ))
            }
        }
    }

    /// Load the configuration file given on the command line or, failing
    /// that, the one at the default path (if it exists)
    fn load_config(&self) -> anyhow::Result<Config> {
        let cfg = match self.config {
            Some(ref path) => Config::load(path, false),
            None => match Config::default_path() {
                Ok(path) => Config::load(&path, true),
                Err(_) => Ok(Config::default()),
            },
        };
        cfg.context("failed to load configuration")
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Play,
    Serve,
}

/// Read the server port from the `PORT` environment variable, if set
fn port_from_env() -> anyhow::Result<Option<u16>> {
    match std::env::var("PORT") {
        Ok(s) if s.is_empty() => Ok(None),
        Ok(s) => s
            .parse::<u16>()
            .map(Some)
            .with_context(|| format!("invalid PORT value {s:?}")),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).context("failed to read PORT"),
    }
}

fn main() -> ExitCode {
    match Command::from_parser(Parser::from_env()) {
        Ok(Command::Run(args)) => exit(args.run()),
        Ok(Command::Help) => {
            print!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(Command::Version) => {
            println!("snakeboard {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("snakeboard: {e}\n\n{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn exit(r: anyhow::Result<()>) -> ExitCode {
    match r {
        Ok(()) => ExitCode::SUCCESS,
        Err(e)
            if e.downcast_ref::<io::Error>()
                .is_some_and(|ioe| ioe.kind() == ErrorKind::BrokenPipe) =>
        {
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("snakeboard: {e:?}");
            ExitCode::from(2)
        }
    }
}
