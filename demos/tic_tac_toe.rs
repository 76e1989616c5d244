//! Play tic-tac-toe against the engine in the terminal.
//!
//! You are `X` and move first. Enter moves as a column letter and a row number, e.g. `A2`.
//! Set `RUST_LOG=ttt_mcts=debug` to see search statistics.

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use ttt_mcts::board::{Board, Player, format_coordinate, parse_coordinate};
use ttt_mcts::error::Error;
use ttt_mcts::session::{GameSession, GameStatus};

const ENGINE: Player = Player::O;
const DEFAULT_LOG_FILTER: &str = "ttt_mcts=info";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let mut session = GameSession::new()?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        session.reset();
        let status = play_game(&mut session, &mut lines)?;
        println!("{}", status.describe_for(ENGINE));

        let Some(answer) = prompt(&mut lines, "Play again? (Y/N) ")? else {
            break;
        };
        if !answer.trim().eq_ignore_ascii_case("y") {
            break;
        }
    }

    Ok(())
}

fn play_game<B: BufRead>(
    session: &mut GameSession,
    lines: &mut io::Lines<B>,
) -> Result<GameStatus, Box<dyn std::error::Error>> {
    let mut board = Board::new();
    loop {
        println!("{}", board.to_grid());

        let Some(input) = prompt(lines, "move (e.g. A2): ")? else {
            return Ok(GameStatus::Continue);
        };
        let index = match parse_coordinate(&input) {
            Ok(index) => index,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let human = match session.submit_human_move(&board, index) {
            Ok(turn) => turn,
            Err(Error::IllegalMove { .. }) => {
                println!("illegal move, {} is already taken", input.trim());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        board = human.board;
        if human.status.is_finished() {
            println!("{}", board.to_grid());
            return Ok(human.status);
        }

        let budget = session.engine().config().default_budget;
        let engine = session.request_engine_move(&board, budget)?;
        board = engine.board;
        if let Some(coordinate) = format_coordinate(engine.b_move as usize) {
            println!("engine move: {}", coordinate);
        }
        if engine.status.is_finished() {
            println!("{}", board.to_grid());
            return Ok(engine.status);
        }
    }
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> io::Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    lines.next().transpose()
}

/// Uses the `RUST_LOG` directives when they parse, `ttt_mcts=info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
