use clap::Parser;
use mcts_core::engine::config::MctsSettings;
use mcts_core::logic::board::{ChessBoard, GameStatus, SearchBoard};
use mcts_core::logic::sim_board::Side;
use mcts_core::worker::{Output, SearchWorker};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays the MCTS engine against itself", long_about = None)]
struct Args {
    /// Starting position; the standard start position when omitted
    #[arg(long)]
    fen: Option<String>,

    /// JSON settings file used by both sides
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Stop after this many plies
    #[arg(long, default_value_t = 40)]
    max_plies: u32,

    /// Log level used when `RUST_LOG` is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<MctsSettings, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(MctsSettings::default());
    };
    let json = std::fs::read_to_string(path)?;
    Ok(MctsSettings::load_from_json(&json)?)
}

fn play(args: &Args) -> Result<(), Box<dyn Error>> {
    let settings = load_settings(args.settings.as_deref())?;
    let mut board = args
        .fen
        .as_deref()
        .map_or_else(|| Ok(ChessBoard::new()), ChessBoard::from_fen)?;

    let white = SearchWorker::spawn(settings.clone())?;
    let black = SearchWorker::spawn(settings.clone())?;
    info!(fen = %board.to_fen(), max_plies = args.max_plies, "starting game");

    for ply in 1..=args.max_plies {
        match board.status() {
            GameStatus::Checkmate(winner) => {
                info!(?winner, "checkmate");
                return Ok(());
            }
            GameStatus::Stalemate => {
                info!("stalemate");
                return Ok(());
            }
            GameStatus::Playing => {}
        }

        let side = board.side_to_move();
        let worker = match side {
            Side::White => &white,
            Side::Black => &black,
        };

        match worker.compute_move(&board.to_fen(), settings.clone())? {
            Output::MoveFound(mv, diagnostics) => {
                info!(
                    ply,
                    ?side,
                    %mv,
                    playouts = diagnostics.num_playouts,
                    eval = diagnostics.eval,
                    "move played"
                );
                debug!("{}", serde_json::to_string(&diagnostics)?);
                board.make_move(mv);
            }
            Output::NoMove(reason) => {
                warn!(%reason, "engine returned no move");
                return Ok(());
            }
        }
    }

    info!(fen = %board.to_fen(), "ply limit reached");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match play(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
