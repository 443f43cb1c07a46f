//! Background search thread.
//!
//! The engine, its tree and its board live on the worker thread. The caller
//! talks to it over channels and can stop a running search through the shared
//! [`AbortHandle`].

use crate::engine::config::MctsSettings;
use crate::engine::search::MctsEngine;
use crate::engine::{AbortHandle, SearchDiagnostics, Searcher};
use crate::logic::board::ChessBoard;
use chess::ChessMove;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Input {
    ComputeMove { fen: String, settings: MctsSettings },
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum Output {
    MoveFound(ChessMove, SearchDiagnostics),
    /// Bad position, bad settings or nothing to play.
    NoMove(String),
}

#[derive(Debug)]
pub enum WorkerError {
    Spawn(std::io::Error),
    Disconnected,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start search worker: {e}"),
            Self::Disconnected => write!(f, "search worker is gone"),
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

pub struct SearchWorker {
    input: Sender<Input>,
    output: Receiver<Output>,
    abort: AbortHandle,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    pub fn spawn(settings: MctsSettings) -> Result<Self, WorkerError> {
        let engine = MctsEngine::new(ChessBoard::new(), Arc::new(settings));
        let abort = engine.abort_handle();

        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let (output_tx, output_rx) = crossbeam_channel::unbounded();

        let handle = std::thread::Builder::new()
            .name("mcts-search".to_string())
            .spawn(move || run(engine, &input_rx, &output_tx))
            .map_err(WorkerError::Spawn)?;

        Ok(Self {
            input: input_tx,
            output: output_rx,
            abort,
            handle: Some(handle),
        })
    }

    /// Queues a search; the answer arrives through [`Self::recv`].
    pub fn request(&self, fen: &str, settings: MctsSettings) -> Result<(), WorkerError> {
        self.input
            .send(Input::ComputeMove {
                fen: fen.to_string(),
                settings,
            })
            .map_err(|_| WorkerError::Disconnected)
    }

    pub fn recv(&self) -> Result<Output, WorkerError> {
        self.output.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// `request` followed by a blocking `recv`.
    pub fn compute_move(&self, fen: &str, settings: MctsSettings) -> Result<Output, WorkerError> {
        self.request(fen, settings)?;
        self.recv()
    }

    /// Stops the running search; it still answers with its best move so far.
    pub fn end_search(&self) {
        self.abort.abort();
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.input.send(Input::Shutdown);
        self.abort.abort();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("search worker panicked");
            }
        }
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut engine: MctsEngine, input: &Receiver<Input>, output: &Sender<Output>) {
    while let Ok(msg) = input.recv() {
        match msg {
            Input::Shutdown => break,
            Input::ComputeMove { fen, settings } => {
                let reply = compute(&mut engine, &fen, settings);
                if output.send(reply).is_err() {
                    break;
                }
            }
        }
    }
    log::debug!("search worker stopped");
}

fn compute(engine: &mut MctsEngine, fen: &str, settings: MctsSettings) -> Output {
    let board = match ChessBoard::from_fen(fen) {
        Ok(board) => board,
        Err(e) => return Output::NoMove(e.to_string()),
    };
    if let Err(e) = settings.validate() {
        return Output::NoMove(e.to_string());
    }

    let timer = settings
        .use_time_limit
        .then(|| SearchTimer::arm(engine.abort_handle(), settings.search_time_millis));
    engine.update_settings(Arc::new(settings));
    engine.set_board(board);

    let found = engine.start_search();

    if let Some(timer) = timer {
        timer.disarm();
    }
    // A timer that fired after the search returned must not stop the next one.
    engine.abort_handle().reset();

    match found {
        Some(mv) => Output::MoveFound(mv, engine.diagnostics().clone()),
        None => Output::NoMove(format!("no legal moves in {fen}")),
    }
}

/// Aborts the search after a fixed delay unless disarmed first.
struct SearchTimer {
    disarm: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SearchTimer {
    fn arm(abort: AbortHandle, millis: u64) -> Self {
        let (disarm, disarmed) = crossbeam_channel::bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name("mcts-timer".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) =
                    disarmed.recv_timeout(Duration::from_millis(millis))
                {
                    log::trace!("search time of {millis}ms elapsed");
                    abort.abort();
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("could not start search timer: {e}");
                None
            }
        };
        Self { disarm, handle }
    }

    fn disarm(mut self) {
        let _ = self.disarm.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
