//! Board grid, mine placement, reveal/flag operations and snapshot merging.

use rand::Rng;
use tracing::debug;

use crate::error::BoardError;
use crate::square::{MINE, Square};
use crate::symbol::Symbol;

/// Outcome of [`Board::reveal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    /// Coordinates outside the board.
    Rejected,
    /// Nothing changed (flagged or already uncovered square).
    NoOp,
    /// A mine was revealed directly; every mine is now exposed.
    Lose,
    /// The square was uncovered and holds this neighbour count.
    Value(u8),
}

/// A `width × height` minesweeper board.
///
/// The grid and the flattened snapshot are updated together by every
/// mutation: `snapshot[y * width + x]` is always `grid[y * width + x].symbol()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    mines: usize,
    flags_left: i32,
    grid: Vec<Square>,
    snapshot: Vec<Symbol>,
}

impl Board {
    /// Creates a fully covered board.
    pub fn new(width: usize, height: usize, mines: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        let squares = width * height;
        if mines >= squares {
            return Err(BoardError::TooManyMines { mines, squares });
        }

        Ok(Self {
            width,
            height,
            mines,
            flags_left: mines as i32,
            grid: vec![Square::default(); squares],
            snapshot: vec![Symbol::Covered; squares],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Configured mine count.
    pub fn mines(&self) -> usize {
        self.mines
    }

    /// Flags still available: the mine count minus the flags placed.
    pub fn flags_left(&self) -> i32 {
        self.flags_left
    }

    /// The flattened, row-major symbol snapshot.
    pub fn snapshot(&self) -> &[Symbol] {
        &self.snapshot
    }

    pub fn square(&self, x: usize, y: usize) -> Option<Square> {
        self.index(x as i64, y as i64).map(|i| self.grid[i])
    }

    /// Places the configured number of mines at random positions using the
    /// thread-local CSPRNG.
    pub fn populate_mines(&mut self) -> Result<(), BoardError> {
        self.populate_mines_with(&mut rand::thread_rng())
    }

    /// Places the configured number of mines using `rng`.
    ///
    /// Colliding samples are rejected and drawn again.
    pub fn populate_mines_with<R: Rng>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        let squares = self.grid.len();
        if self.mines >= squares {
            return Err(BoardError::TooManyMines {
                mines: self.mines,
                squares,
            });
        }

        let mut placed = 0;
        while placed < self.mines {
            let x = rng.gen_range(0..self.width);
            let y = rng.gen_range(0..self.height);
            if self.place_mine(x, y) {
                placed += 1;
            }
        }

        debug!(
            width = self.width,
            height = self.height,
            mines = self.mines,
            "mines populated"
        );
        Ok(())
    }

    /// Places mines at explicit positions. Out-of-range or duplicate
    /// positions are ignored.
    pub fn place_mines(&mut self, positions: &[(usize, usize)]) {
        for &(x, y) in positions {
            self.place_mine(x, y);
        }
    }

    /// Turns `(x, y)` into a mine and bumps the value of every non-mine
    /// neighbour. Returns `false` if the square was already a mine.
    fn place_mine(&mut self, x: usize, y: usize) -> bool {
        let Some(index) = self.index(x as i64, y as i64) else {
            return false;
        };
        if self.grid[index].is_mine() {
            return false;
        }
        self.grid[index] = Square::Covered(MINE);

        for (nx, ny) in neighbours(x as i64, y as i64) {
            if let Some(n) = self.index(nx, ny) {
                let square = self.grid[n];
                if !square.is_mine() {
                    self.grid[n] = Square::Covered(square.value() + 1);
                }
            }
        }
        true
    }

    /// Reveals the square at `(x, y)`.
    ///
    /// Uncovering a zero square cascades to its neighbours. Revealing a
    /// mine exposes every mine on the board and returns [`Reveal::Lose`].
    pub fn reveal(&mut self, x: i64, y: i64) -> Reveal {
        let Some(index) = self.index(x, y) else {
            return Reveal::Rejected;
        };

        let square = self.grid[index];
        match square {
            Square::Covered(MINE) => {
                self.reveal_mines();
                Reveal::Lose
            }
            Square::Covered(value) => {
                self.uncover_from(x, y);
                Reveal::Value(value as u8)
            }
            Square::Flagged(_) | Square::Uncovered(_) => Reveal::NoOp,
        }
    }

    /// Uncovers `(x, y)` and cascades through zero squares.
    ///
    /// Cascades never step onto flags, uncovered squares or mines: a mine
    /// cannot border a zero square, so the mine check only guards
    /// against inconsistent grids.
    fn uncover_from(&mut self, x: i64, y: i64) {
        let mut pending = vec![(x, y)];
        while let Some((x, y)) = pending.pop() {
            let Some(index) = self.index(x, y) else {
                continue;
            };
            let square = self.grid[index];
            if !square.is_trivial() {
                continue;
            }

            self.set(index, square.uncover());
            if square.value() == 0 {
                pending.extend(neighbours(x, y));
            }
        }
    }

    /// Exposes every mine, covered or flagged alike.
    fn reveal_mines(&mut self) {
        for index in 0..self.grid.len() {
            let square = self.grid[index];
            if square.is_mine() {
                self.set(index, square.explode());
            }
        }
    }

    /// Flips the flag on a covered square. Returns whether anything changed.
    pub fn toggle_flag(&mut self, x: i64, y: i64) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };

        let square = self.grid[index];
        match square {
            Square::Covered(_) => self.flags_left -= 1,
            Square::Flagged(_) => self.flags_left += 1,
            Square::Uncovered(_) => return false,
        }
        self.set(index, square.toggle_flag());
        true
    }

    /// Merges an externally produced snapshot into this board.
    ///
    /// Only squares whose symbol differs are rebuilt. The whole snapshot is
    /// validated before anything is written, so a failed merge leaves the
    /// board untouched.
    pub fn merge_snapshot(&mut self, symbols: &[Symbol]) -> Result<(), BoardError> {
        if symbols.len() != self.snapshot.len() {
            return Err(BoardError::SizeMismatch {
                expected: self.snapshot.len(),
                actual: symbols.len(),
            });
        }

        let mut changes = Vec::new();
        for (index, (&new, &old)) in symbols.iter().zip(&self.snapshot).enumerate() {
            if new != old {
                let square = Square::from_symbol(new, self.grid[index])
                    .map_err(|reason| BoardError::IllegalTransition { index, reason })?;
                changes.push((index, square));
            }
        }

        for (index, square) in changes {
            self.set(index, square);
        }
        Ok(())
    }

    /// Whether every non-mine square has been uncovered, i.e. the number of
    /// hidden squares equals the mine count. Flag accuracy does not matter.
    pub fn is_win(&self) -> bool {
        self.snapshot.iter().filter(|s| s.is_hidden()).count() == self.mines
    }

    fn set(&mut self, index: usize, square: Square) {
        self.grid[index] = square;
        self.snapshot[index] = square.symbol();
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

/// The up-to-8 surrounding coordinates (may be out of range).
fn neighbours(x: i64, y: i64) -> impl Iterator<Item = (i64, i64)> {
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (x + dx, y + dy)))
        .filter(move |&(nx, ny)| (nx, ny) != (x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_5x5() -> Board {
        let mut board = Board::new(5, 5, 3).unwrap();
        board.place_mines(&[(1, 1), (3, 3), (0, 4)]);
        board
    }

    fn mine_neighbours(board: &Board, x: usize, y: usize) -> i8 {
        neighbours(x as i64, y as i64)
            .filter_map(|(nx, ny)| board.index(nx, ny))
            .filter(|&i| board.grid[i].is_mine())
            .count() as i8
    }

    fn assert_lockstep(board: &Board) {
        assert_eq!(board.snapshot.len(), board.width * board.height);
        for (square, symbol) in board.grid.iter().zip(&board.snapshot) {
            assert_eq!(square.symbol(), *symbol);
        }
    }

    #[test]
    fn new_board_is_covered() {
        let board = Board::new(4, 3, 2).unwrap();
        assert_eq!(board.snapshot().len(), 12);
        assert!(board.snapshot().iter().all(|s| *s == Symbol::Covered));
        assert_eq!(board.flags_left(), 2);
    }

    #[test]
    fn rejects_too_many_mines() {
        assert_eq!(
            Board::new(2, 2, 4),
            Err(BoardError::TooManyMines {
                mines: 4,
                squares: 4
            })
        );
        assert!(matches!(
            Board::new(0, 3, 0),
            Err(BoardError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn populate_places_exact_count_and_values() {
        let mut rng = StdRng::seed_from_u64(7);
        for (w, h, k) in [(5, 5, 0), (5, 5, 3), (10, 10, 10), (8, 3, 23), (1, 2, 1)] {
            let mut board = Board::new(w, h, k).unwrap();
            board.populate_mines_with(&mut rng).unwrap();

            let mines = board.grid.iter().filter(|s| s.is_mine()).count();
            assert_eq!(mines, k, "{w}x{h} with {k} mines");

            for y in 0..h {
                for x in 0..w {
                    let square = board.square(x, y).unwrap();
                    if !square.is_mine() {
                        assert_eq!(square.value(), mine_neighbours(&board, x, y));
                    }
                }
            }
            assert_lockstep(&board);
        }
    }

    #[test]
    fn populate_with_thread_rng() {
        let mut board = Board::new(10, 10, 10).unwrap();
        board.populate_mines().unwrap();
        assert_eq!(board.grid.iter().filter(|s| s.is_mine()).count(), 10);
    }

    #[test]
    fn seeded_values() {
        let board = seeded_5x5();
        assert_eq!(board.square(0, 0), Some(Square::Covered(1)));
        assert_eq!(board.square(2, 2), Some(Square::Covered(2)));
        assert_eq!(board.square(1, 4), Some(Square::Covered(1)));
        assert_eq!(board.square(4, 4), Some(Square::Covered(1)));
        assert_eq!(board.square(4, 0), Some(Square::Covered(0)));
    }

    #[test]
    fn reveal_corner_does_not_touch_mines() {
        let mut board = seeded_5x5();
        assert_eq!(board.reveal(4, 4), Reveal::Value(1));

        // (4,4) borders (3,3), so nothing else is uncovered.
        let uncovered = board.snapshot().iter().filter(|s| !s.is_hidden()).count();
        assert_eq!(uncovered, 1);
        assert!(!board.snapshot().contains(&Symbol::Mine));
        assert_lockstep(&board);
    }

    #[test]
    fn reveal_zero_cascades_without_mines() {
        let mut board = seeded_5x5();
        assert_eq!(board.reveal(4, 0), Reveal::Value(0));

        for (i, symbol) in board.snapshot().iter().enumerate() {
            let square = board.grid[i];
            if square.is_mine() {
                assert_eq!(*symbol, Symbol::Covered);
            }
        }
        // The zero region around the top-right corner opened up.
        assert_eq!(board.square(3, 0), Some(Square::Uncovered(0)));
        assert_eq!(board.square(4, 1), Some(Square::Uncovered(0)));
        assert_eq!(board.square(2, 0), Some(Square::Uncovered(1)));
        assert_lockstep(&board);
    }

    #[test]
    fn reveal_mine_loses_and_exposes_all_mines() {
        let mut board = seeded_5x5();
        board.toggle_flag(3, 3);
        assert_eq!(board.reveal(1, 1), Reveal::Lose);

        for (x, y) in [(1, 1), (3, 3), (0, 4)] {
            assert_eq!(board.snapshot()[y * 5 + x], Symbol::Mine);
        }
        assert_eq!(board.snapshot().iter().filter(|s| **s == Symbol::Mine).count(), 3);
        assert_lockstep(&board);
    }

    #[test]
    fn reveal_out_of_bounds_is_rejected() {
        let mut board = seeded_5x5();
        assert_eq!(board.reveal(-1, 0), Reveal::Rejected);
        assert_eq!(board.reveal(5, 0), Reveal::Rejected);
        assert_eq!(board.reveal(0, 5), Reveal::Rejected);
    }

    #[test]
    fn flags_block_reveal() {
        let mut board = seeded_5x5();
        assert!(board.toggle_flag(1, 1));
        assert_eq!(board.reveal(1, 1), Reveal::NoOp);
        assert_eq!(board.snapshot()[6], Symbol::Flagged);
    }

    #[test]
    fn reveal_uncovered_is_noop() {
        let mut board = seeded_5x5();
        board.reveal(4, 4);
        assert_eq!(board.reveal(4, 4), Reveal::NoOp);
    }

    #[test]
    fn toggle_flag_adjusts_counter() {
        let mut board = seeded_5x5();
        assert!(board.toggle_flag(0, 0));
        assert_eq!(board.flags_left(), 2);
        assert!(board.toggle_flag(0, 0));
        assert_eq!(board.flags_left(), 3);

        board.reveal(4, 4);
        assert!(!board.toggle_flag(4, 4));
        assert!(!board.toggle_flag(9, 9));
        assert_eq!(board.flags_left(), 3);
        assert_lockstep(&board);
    }

    #[test]
    fn merge_applies_changed_squares() {
        let mut mirror = Board::new(3, 1, 1).unwrap();
        let incoming = [Symbol::Number(1), Symbol::Flagged, Symbol::Covered];
        mirror.merge_snapshot(&incoming).unwrap();

        assert_eq!(mirror.snapshot(), &incoming);
        assert_eq!(mirror.square(0, 0), Some(Square::Uncovered(1)));
        assert_eq!(mirror.square(1, 0), Some(Square::Flagged(0)));
        assert_lockstep(&mirror);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut source = seeded_5x5();
        source.reveal(4, 0);
        source.toggle_flag(1, 1);

        let mut once = Board::new(5, 5, 3).unwrap();
        once.merge_snapshot(source.snapshot()).unwrap();
        let mut twice = once.clone();
        twice.merge_snapshot(source.snapshot()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.snapshot(), source.snapshot());
    }

    #[test]
    fn merge_rejects_size_mismatch() {
        let mut board = Board::new(3, 3, 1).unwrap();
        let err = board.merge_snapshot(&[Symbol::Covered; 8]).unwrap_err();
        assert_eq!(
            err,
            BoardError::SizeMismatch {
                expected: 9,
                actual: 8
            }
        );
    }

    #[test]
    fn merge_illegal_flag_leaves_board_untouched() {
        let mut board = Board::new(2, 1, 1).unwrap();
        board
            .merge_snapshot(&[Symbol::Number(1), Symbol::Covered])
            .unwrap();
        let before = board.clone();

        let err = board
            .merge_snapshot(&[Symbol::Flagged, Symbol::Number(1)])
            .unwrap_err();
        assert!(matches!(err, BoardError::IllegalTransition { index: 0, .. }));
        assert_eq!(board, before);

        // Covering an uncovered square again is just as illegal.
        let err = board
            .merge_snapshot(&[Symbol::Covered, Symbol::Number(1)])
            .unwrap_err();
        assert!(matches!(err, BoardError::IllegalTransition { index: 0, .. }));
        assert_eq!(board, before);
    }

    #[test]
    fn win_when_only_mine_hidden() {
        let mut board = Board::new(3, 3, 1).unwrap();
        board.place_mines(&[(1, 1)]);
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (1, 1) {
                    assert!(!board.is_win());
                    board.reveal(x, y);
                }
            }
        }
        assert!(board.is_win());

        board.toggle_flag(1, 1);
        assert!(board.is_win());
    }

    #[test]
    fn win_needs_uncovering_not_flagging() {
        let mut board = Board::new(2, 1, 1).unwrap();
        board.place_mines(&[(0, 0)]);
        board.toggle_flag(1, 0);
        assert!(!board.is_win());
        board.toggle_flag(1, 0);
        board.reveal(1, 0);
        assert!(board.is_win());
    }
}
