//! # Rectangular grids.
//!
//! The board-centric representation: one value per square, stored
//! row-major in a single allocation. Generalized to any cell type and
//! any side lengths up to 16, since the rules decide both at runtime.

use std::ops::{Index, IndexMut};

use crate::model::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    cols: u8,
    rows: u8,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(cols: u8, rows: u8, value: T) -> Self {
        Self {
            cols,
            rows,
            cells: vec![value; cols as usize * rows as usize],
        }
    }
}

impl<T> Grid<T> {
    #[inline]
    pub fn cols(&self) -> u8 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Whether the address names a cell of this grid.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        (1..=self.cols).contains(&pos.col) && (1..=self.rows).contains(&pos.row)
    }

    #[inline]
    fn ix(&self, pos: Position) -> usize {
        (pos.row as usize - 1) * self.cols as usize + (pos.col as usize - 1)
    }

    /// The cell at `pos`, or `None` when the address is off the grid.
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.contains(pos).then(|| &self.cells[self.ix(pos)])
    }

    /// Every address of the grid, row by row from row 1 upward.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<T> {
        let (cols, rows) = (self.cols, self.rows);
        (1..=rows).flat_map(move |row| (1..=cols).map(move |col| Position::new(col, row)))
    }
}

impl<T> Index<Position> for Grid<T> {
    type Output = T;

    /// Panics off the grid. Check [`Grid::contains`] first.
    #[inline]
    fn index(&self, pos: Position) -> &T {
        &self.cells[self.ix(pos)]
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: Position) -> &mut T {
        let ix = self.ix(pos);
        &mut self.cells[ix]
    }
}

#[test]
fn addressing_is_one_based_and_bounded() {
    let g: Grid<u8> = Grid::filled(5, 4, 0);
    assert!(g.contains(Position::new(1, 1)));
    assert!(g.contains(Position::new(5, 4)));
    assert!(!g.contains(Position::new(0, 1)));
    assert!(!g.contains(Position::new(6, 1)));
    assert!(!g.contains(Position::new(1, 5)));
    assert_eq!(g.get(Position::new(6, 1)), None);
}

#[test]
fn cells_are_independent() {
    let mut g: Grid<u8> = Grid::filled(4, 4, 0);
    g[Position::new(2, 3)] = 7;
    assert_eq!(g[Position::new(2, 3)], 7);
    assert_eq!(g[Position::new(3, 2)], 0);
    assert_eq!(g.get(Position::new(2, 3)), Some(&7));
}

#[test]
fn positions_walk_row_major() {
    let g: Grid<u8> = Grid::filled(3, 2, 0);
    let all: Vec<Position> = g.positions().collect();
    assert_eq!(all.len(), 6);
    assert_eq!(all[0], Position::new(1, 1));
    assert_eq!(all[1], Position::new(2, 1));
    assert_eq!(all[3], Position::new(1, 2));
    assert_eq!(all[5], Position::new(3, 2));
}
