//! Playfield and active piece: collision, merge and line sweep.

use crate::game::GameError;
use crate::shape::{EMPTY, Shape, TetrominoKind};
use std::collections::VecDeque;

/// Widest canonical shape; a narrower field could never spawn the I piece.
pub const MIN_COLS: usize = 4;

/// Largest row or column count accepted; far beyond any terminal.
pub const MAX_DIM: usize = 1024;

/// Active piece: private copy of a shape anchored at (x, y) in field coordinates.
/// `y` may be negative while the piece sits partly above the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// New piece of `kind`, horizontally centred on a field `cols` wide, at row 0.
    pub fn spawn(kind: TetrominoKind, cols: usize) -> Self {
        let shape = kind.shape();
        let x = (cols / 2) as i32 - (shape.width() / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }

    /// Field coordinates of every occupied cell.
    pub fn blocks(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(|(sx, sy, _)| (self.x + sx as i32, self.y + sy as i32))
    }
}

/// Playfield: grid of cell values. y=0 is top; rows[0] is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    rows: usize,
    cols: usize,
    cells: VecDeque<Vec<u8>>,
}

impl Field {
    pub fn new(rows: usize, cols: usize) -> Result<Self, GameError> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        if cols < MIN_COLS {
            return Err(GameError::FieldTooNarrow { cols, min: MIN_COLS });
        }
        if rows > MAX_DIM || cols > MAX_DIM {
            return Err(GameError::FieldTooLarge {
                rows,
                cols,
                max: MAX_DIM,
            });
        }
        Ok(Self {
            rows,
            cols,
            cells: (0..rows).map(|_| vec![EMPTY; cols]).collect(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Writes are dropped outside the grid and for values above 7.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if value > TetrominoKind::L.value() {
            return;
        }
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value;
        }
    }

    #[cfg(test)]
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        self.cells.get(y).map(Vec::as_slice)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.iter().map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|&&v| v != EMPTY).count())
            .sum()
    }

    /// True if any occupied piece cell is below the floor, outside the side
    /// walls, or on top of a locked cell. Cells above the top edge are only
    /// checked against the walls.
    pub fn collides(&self, piece: &Piece) -> bool {
        let (rows, cols) = (self.rows as i32, self.cols as i32);
        piece.blocks().any(|(fx, fy)| {
            if fy >= rows || fx < 0 || fx >= cols {
                return true;
            }
            fy >= 0 && self.cells[fy as usize][fx as usize] != EMPTY
        })
    }

    /// Write the piece's cells into the grid as its kind. Cells above the top edge are dropped.
    pub fn merge(&mut self, piece: &Piece) {
        let value = piece.kind.value();
        for (fx, fy) in piece.blocks() {
            if fy >= 0 && fx >= 0 {
                self.set(fx as usize, fy as usize, value);
            }
        }
    }

    /// Remove every full row, bottom-up, inserting an empty row on top for each.
    /// Returns the number of rows removed.
    pub fn sweep(&mut self) -> usize {
        let mut cleared = 0;
        let mut y = self.rows;
        while y > 0 {
            let row = y - 1;
            if self.cells[row].iter().all(|&v| v != EMPTY) {
                self.cells.remove(row);
                self.cells.push_front(vec![EMPTY; self.cols]);
                cleared += 1;
                // the row that slid into `row` is checked next
                continue;
            }
            y -= 1;
        }
        cleared
    }

    /// Empty every cell, keeping the dimensions.
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(EMPTY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::rotate;

    fn field() -> Field {
        Field::new(20, 10).unwrap()
    }

    fn fill_row(f: &mut Field, y: usize, value: u8) {
        for x in 0..f.cols() {
            f.set(x, y, value);
        }
    }

    #[test]
    fn test_new_field_is_empty() {
        let f = field();
        assert_eq!((f.rows(), f.cols()), (20, 10));
        assert_eq!(f.occupied_count(), 0);
        assert!(f.iter_rows().all(|r| r.len() == 10));
    }

    #[test]
    fn test_bad_dimensions_rejected() {
        assert!(matches!(
            Field::new(0, 10),
            Err(GameError::InvalidDimensions { rows: 0, cols: 10 })
        ));
        assert!(matches!(
            Field::new(20, 0),
            Err(GameError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Field::new(20, 3),
            Err(GameError::FieldTooNarrow { cols: 3, min: 4 })
        ));
        assert!(matches!(
            Field::new(usize::MAX, 10),
            Err(GameError::FieldTooLarge { max: MAX_DIM, .. })
        ));
        assert!(Field::new(MAX_DIM, MAX_DIM).is_ok());
    }

    #[test]
    fn test_spawn_is_centred() {
        assert_eq!(Piece::spawn(TetrominoKind::I, 10).x, 3);
        assert_eq!(Piece::spawn(TetrominoKind::O, 10).x, 4);
        assert_eq!(Piece::spawn(TetrominoKind::T, 10).x, 4);
        assert_eq!(Piece::spawn(TetrominoKind::T, 10).y, 0);
    }

    #[test]
    fn test_centred_piece_on_empty_field_does_not_collide() {
        let f = field();
        for kind in TetrominoKind::ALL {
            assert!(!f.collides(&Piece::spawn(kind, 10)), "{}", kind.name());
        }
    }

    #[test]
    fn test_collides_outside_walls_and_floor() {
        let f = field();
        let mut p = Piece::spawn(TetrominoKind::O, 10);
        p.x = -1;
        assert!(f.collides(&p));
        p.x = 9;
        assert!(f.collides(&p));
        p.x = 8;
        assert!(!f.collides(&p));
        p.y = 19;
        assert!(f.collides(&p));
        p.y = 18;
        assert!(!f.collides(&p));
    }

    #[test]
    fn test_cells_above_field_only_checked_against_walls() {
        let mut f = field();
        fill_row(&mut f, 0, 1);
        let mut p = Piece::spawn(TetrominoKind::I, 10);
        p.y = -1;
        assert!(!f.collides(&p));
        p.x = -1;
        assert!(f.collides(&p));
        p.x = 7;
        assert!(f.collides(&p));
    }

    #[test]
    fn test_collides_with_locked_cell() {
        let mut f = field();
        f.set(5, 10, 3);
        let mut p = Piece::spawn(TetrominoKind::O, 10);
        p.y = 9;
        assert!(f.collides(&p));
        p.y = 8;
        assert!(!f.collides(&p));
    }

    #[test]
    fn test_merge_writes_exactly_the_piece_cells() {
        let mut f = field();
        let mut p = Piece::spawn(TetrominoKind::T, 10);
        p.y = 5;
        f.merge(&p);
        assert_eq!(f.occupied_count(), 4);
        for (x, y) in p.blocks() {
            assert_eq!(f.get(x as usize, y as usize), Some(TetrominoKind::T.value()));
        }
        assert_eq!(f.get(4, 5), Some(0));
    }

    #[test]
    fn test_merge_skips_cells_above_field() {
        let mut f = field();
        let mut p = Piece::spawn(TetrominoKind::J, 10);
        p.y = -1;
        f.merge(&p);
        assert_eq!(f.occupied_count(), 3);
        assert_eq!(f.row(0), Some(&[0, 0, 0, 0, 6, 6, 6, 0, 0, 0][..]));
    }

    #[test]
    fn test_sweep_two_separate_rows() {
        let mut f = field();
        fill_row(&mut f, 5, 1);
        fill_row(&mut f, 10, 2);
        f.set(0, 3, 4);
        f.set(3, 7, 5);
        f.set(9, 12, 6);
        f.set(1, 19, 7);
        let before = f.occupied_count();

        assert_eq!(f.sweep(), 2);
        assert_eq!(f.occupied_count(), before - 20);
        assert!(f.row(0).unwrap().iter().all(|&v| v == 0));
        assert!(f.row(1).unwrap().iter().all(|&v| v == 0));
        // rows above row 5 moved down by two, rows between by one, rows below stayed
        assert_eq!(f.get(0, 5), Some(4));
        assert_eq!(f.get(3, 8), Some(5));
        assert_eq!(f.get(9, 12), Some(6));
        assert_eq!(f.get(1, 19), Some(7));
    }

    #[test]
    fn test_sweep_adjacent_rows_rechecks_same_index() {
        let mut f = field();
        fill_row(&mut f, 18, 1);
        fill_row(&mut f, 19, 2);
        f.set(4, 17, 3);
        assert_eq!(f.sweep(), 2);
        assert_eq!(f.occupied_count(), 1);
        assert_eq!(f.get(4, 19), Some(3));
    }

    #[test]
    fn test_sweep_without_full_rows() {
        let mut f = field();
        f.set(0, 19, 1);
        assert_eq!(f.sweep(), 0);
        assert_eq!(f.get(0, 19), Some(1));
    }

    #[test]
    fn test_sweep_whole_field() {
        let mut f = Field::new(4, 4).unwrap();
        for y in 0..4 {
            fill_row(&mut f, y, 2);
        }
        assert_eq!(f.sweep(), 4);
        assert_eq!(f.occupied_count(), 0);
        assert_eq!(f.rows(), 4);
    }

    #[test]
    fn test_set_rejects_out_of_range_values() {
        let mut f = field();
        f.set(0, 0, 9);
        f.set(10, 0, 1);
        assert_eq!(f.occupied_count(), 0);
    }

    #[test]
    fn test_rotated_piece_against_left_wall_collides() {
        let f = field();
        let mut p = Piece::spawn(TetrominoKind::I, 10);
        p.shape = rotate(&p.shape);
        p.x = 0;
        p.y = 5;
        assert!(!f.collides(&p));
        let mut back = p.clone();
        back.x = -1;
        assert!(f.collides(&back));
    }
}
