use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::models::{
    cell::{Cell, CellView},
    Coordinate, Matrix,
};

/// Cells shared between the command path and scheduled ripening tasks.
pub type CellMatrix = Matrix<Mutex<Cell>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The plot: a fixed `cols` × `rows` matrix of cells plus the farmer's cursor.
#[derive(Debug)]
pub struct GardenGrid {
    rows: usize,
    cols: usize,
    cells: Arc<CellMatrix>,
    cursor: Coordinate,
}

impl GardenGrid {
    pub fn new(cols: usize, rows: usize) -> Self {
        if cols == 0 || rows == 0 {
            log::warn!("Grid {cols}x{rows} has no cells, growing it to at least 1x1");
        }
        let cols = cols.max(1);
        let rows = rows.max(1);
        let cells = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| Mutex::new(Cell::new(Coordinate { row, col })))
                    .collect()
            })
            .collect();
        Self {
            rows,
            cols,
            cells: Arc::new(cells),
            cursor: Coordinate::default(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> Coordinate {
        self.cursor
    }

    /// Moves the cursor one cell; stays put at the edges. Returns whether it moved.
    pub fn move_cursor(&mut self, direction: Direction) -> bool {
        let Coordinate { row, col } = self.cursor;
        let next = match direction {
            Direction::Up => Coordinate { row: row.saturating_sub(1), col },
            Direction::Down => Coordinate { row: (row + 1).min(self.rows - 1), col },
            Direction::Left => Coordinate { row, col: col.saturating_sub(1) },
            Direction::Right => Coordinate { row, col: (col + 1).min(self.cols - 1) },
        };
        self.set_cursor(next)
    }

    /// Moves the cursor to `(col, row)`, clamping out-of-range input into the grid.
    pub fn move_cursor_to(&mut self, col: i64, row: i64) -> bool {
        let next = Coordinate {
            row: clamp_index(row, self.rows),
            col: clamp_index(col, self.cols),
        };
        self.set_cursor(next)
    }

    fn set_cursor(&mut self, next: Coordinate) -> bool {
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        true
    }

    pub fn cell(&self, at: Coordinate) -> Option<&Mutex<Cell>> {
        self.cells.get(at.row).and_then(|row| row.get(at.col))
    }

    /// The cell under the cursor. Always exists: the cursor is clamped on every move.
    pub fn cursor_cell(&self) -> &Mutex<Cell> {
        &self.cells[self.cursor.row][self.cursor.col]
    }

    pub fn view(&self, at: Coordinate) -> Option<CellView> {
        self.cell(at).map(|cell| cell.lock().view())
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Coordinate { row, col }))
    }

    /// Non-owning handle for tasks that outlive the current command.
    pub fn downgrade(&self) -> Weak<CellMatrix> {
        Arc::downgrade(&self.cells)
    }
}

fn clamp_index(value: i64, len: usize) -> usize {
    let max = len.saturating_sub(1);
    if value <= 0 {
        0
    } else {
        usize::try_from(value).map_or(max, |v| v.min(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions() {
        let grid = GardenGrid::new(18, 14);
        assert_eq!(grid.cols(), 18);
        assert_eq!(grid.rows(), 14);
        assert_eq!(grid.coordinates().count(), 18 * 14);
    }

    #[test]
    fn test_zero_dimensions_grow_to_one() {
        let grid = GardenGrid::new(0, 0);
        assert_eq!((grid.cols(), grid.rows()), (1, 1));
        assert!(grid.cell(grid.cursor()).is_some(), "Cursor must address a cell");
    }

    #[test]
    fn test_cursor_stays_at_top_left_edges() {
        let mut grid = GardenGrid::new(18, 14);
        assert!(!grid.move_cursor(Direction::Up));
        assert!(!grid.move_cursor(Direction::Left));
        assert_eq!(grid.cursor(), Coordinate::new(0, 0));
    }

    #[test]
    fn test_cursor_stays_at_bottom_right_edges() {
        let mut grid = GardenGrid::new(18, 14);
        grid.move_cursor_to(17, 13);
        assert!(!grid.move_cursor(Direction::Right));
        assert!(!grid.move_cursor(Direction::Down));
        assert_eq!(grid.cursor(), Coordinate::new(17, 13));
    }

    #[test]
    fn test_cursor_moves_one_step() {
        let mut grid = GardenGrid::new(4, 4);
        assert!(grid.move_cursor(Direction::Right));
        assert!(grid.move_cursor(Direction::Down));
        assert_eq!(grid.cursor(), Coordinate::new(1, 1));
        assert!(grid.move_cursor(Direction::Left));
        assert!(grid.move_cursor(Direction::Up));
        assert_eq!(grid.cursor(), Coordinate::new(0, 0));
    }

    #[test]
    fn test_move_cursor_to_clamps() {
        let mut grid = GardenGrid::new(18, 14);
        grid.move_cursor_to(100, -5);
        assert_eq!(grid.cursor(), Coordinate::new(17, 0));
        grid.move_cursor_to(-1, i64::MAX);
        assert_eq!(grid.cursor(), Coordinate::new(0, 13));
    }

    #[test]
    fn test_cell_lookup_out_of_bounds() {
        let grid = GardenGrid::new(2, 2);
        assert!(grid.cell(Coordinate::new(2, 0)).is_none());
        assert!(grid.view(Coordinate::new(1, 1)).is_some());
        assert_eq!(grid.cell(Coordinate::new(1, 0)).map(|c| c.lock().coordinate()), Some(Coordinate::new(1, 0)));
    }
}
