use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cells on the board.
pub const CELL_COUNT: usize = 9;

/// The eight lines that win the game: rows, then columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

const EMPTY_SYMBOL: &str = "-";
const X_SYMBOL: &str = "X";
const O_SYMBOL: &str = "O";

/// One of the two players. `X` always moves first.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Returns the other player.
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Returns the symbol used for this player's marker in the external board representation.
    pub fn symbol(self) -> &'static str {
        match self {
            Player::X => X_SYMBOL,
            Player::O => O_SYMBOL,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The classification of a position.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum TerminalStatus {
    /// The game is still ongoing.
    InProgress,
    /// The given player completed a line.
    Won(Player),
    /// The board is full and nobody completed a line.
    Tied,
}

impl TerminalStatus {
    pub fn is_terminal(self) -> bool {
        self != TerminalStatus::InProgress
    }
}

/// A 3×3 tic-tac-toe board.
///
/// Cells are indexed row by row, `0..=2` being the top row. The board itself does not enforce
/// turn order; [`crate::game_state::GameState`] does.
#[derive(Debug, Default, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Board {
    field: [Option<Player>; CELL_COUNT],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board directly from its cells.
    pub fn from_cells(field: [Option<Player>; CELL_COUNT]) -> Self {
        Self { field }
    }

    /// Parses the external representation: 9 symbols out of `"-"`, `"X"` and `"O"`.
    ///
    /// Only the shape and the alphabet are checked here, piece counts are validated by
    /// [`crate::game_state::GameState::from_board`].
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<Self> {
        if symbols.len() != CELL_COUNT {
            return Err(Error::InvalidBoardLength {
                expected: CELL_COUNT,
                got: symbols.len(),
            });
        }

        let mut field = [None; CELL_COUNT];
        for (position, symbol) in symbols.iter().enumerate() {
            field[position] = match symbol.as_ref() {
                EMPTY_SYMBOL => None,
                X_SYMBOL => Some(Player::X),
                O_SYMBOL => Some(Player::O),
                other => {
                    return Err(Error::InvalidSymbol {
                        symbol: other.to_string(),
                        position,
                    });
                }
            };
        }

        Ok(Self { field })
    }

    /// Returns the external representation of the board.
    pub fn to_symbols(&self) -> [&'static str; CELL_COUNT] {
        self.field.map(|cell| match cell {
            None => EMPTY_SYMBOL,
            Some(player) => player.symbol(),
        })
    }

    /// Returns the marker at `index`, or `None` for an empty cell or an index off the board.
    pub fn get(&self, index: usize) -> Option<Player> {
        self.field.get(index).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<Player>; CELL_COUNT] {
        &self.field
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.field.get(index), Some(None))
    }

    pub fn count(&self, player: Player) -> usize {
        self.field.iter().filter(|&&x| x == Some(player)).count()
    }

    pub fn empty_count(&self) -> usize {
        self.field.iter().filter(|x| x.is_none()).count()
    }

    /// Returns the owner of the first completed line, scanning rows, columns, then diagonals.
    pub fn winner(&self) -> Option<Player> {
        WINNING_LINES.iter().find_map(|&[a, b, c]| {
            let owner = self.field[a]?;
            (self.field[b] == Some(owner) && self.field[c] == Some(owner)).then_some(owner)
        })
    }

    pub(crate) fn place(&mut self, index: usize, player: Player) {
        self.field[index] = Some(player);
    }

    /// Renders the board as a grid with `A`–`C` column and `1`–`3` row labels.
    pub fn to_grid(&self) -> String {
        let symbols = self.to_symbols();
        let mut grid = String::from("    A | B | C\n");
        for row in 0..3 {
            grid.push_str("   -----------\n");
            grid.push_str(&format!(
                " {}  {} | {} | {}\n",
                row + 1,
                symbols[row * 3],
                symbols[row * 3 + 1],
                symbols[row * 3 + 2]
            ));
        }
        grid
    }
}

impl fmt::Display for Board {
    /// Writes the compact 9-character form, e.g. `XX-OO----`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in self.to_symbols() {
            f.write_str(symbol)?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let symbols: Vec<String> = s.chars().map(String::from).collect();
        Board::from_symbols(&symbols)
    }
}

impl TryFrom<Vec<String>> for Board {
    type Error = Error;

    fn try_from(symbols: Vec<String>) -> Result<Self> {
        Board::from_symbols(&symbols)
    }
}

impl From<Board> for Vec<String> {
    fn from(board: Board) -> Self {
        board.to_symbols().iter().map(|s| s.to_string()).collect()
    }
}

/// Converts a coordinate such as `"A2"` (column letter, row digit) into a cell index.
pub fn parse_coordinate(coordinate: &str) -> Result<usize> {
    let invalid = || Error::InvalidCoordinate {
        coordinate: coordinate.to_string(),
    };

    let mut chars = coordinate.trim().chars();
    let (Some(column), Some(row), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(invalid());
    };

    let column = "ABC"
        .find(column.to_ascii_uppercase())
        .ok_or_else(invalid)?;
    let row = "123".find(row).ok_or_else(invalid)?;
    Ok(column + row * 3)
}

/// Converts a cell index into its `"A1"`-style coordinate.
pub fn format_coordinate(index: usize) -> Option<String> {
    if index >= CELL_COUNT {
        return None;
    }

    let column = ['A', 'B', 'C'][index % 3];
    Some(format!("{}{}", column, index / 3 + 1))
}
