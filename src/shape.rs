//! Shape table: the seven tetromino kinds as rectangular cell grids, plus rotation.

use crate::game::GameError;

/// Field/shape cell value for "no block".
pub const EMPTY: u8 = 0;

/// Tetromino kinds (I, O, T, S, Z, J, L). The discriminant is the cell value
/// written into shapes and the field, so one colour table serves both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TetrominoKind {
    I = 1,
    O = 2,
    T = 3,
    S = 4,
    Z = 5,
    J = 6,
    L = 7,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Kind for a cell value 1..=7; `None` for empty or out-of-range values.
    #[cfg(test)]
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::I),
            2 => Some(Self::O),
            3 => Some(Self::T),
            4 => Some(Self::S),
            5 => Some(Self::Z),
            6 => Some(Self::J),
            7 => Some(Self::L),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::S => "S",
            Self::Z => "Z",
            Self::J => "J",
            Self::L => "L",
        }
    }

    fn template(self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[2, 2], &[2, 2]],
            Self::T => &[&[0, 3, 0], &[3, 3, 3]],
            Self::S => &[&[4, 4, 0], &[0, 4, 4]],
            Self::Z => &[&[0, 5, 5], &[5, 5, 0]],
            Self::J => &[&[6, 0, 0], &[6, 6, 6]],
            Self::L => &[&[0, 0, 7], &[7, 7, 7]],
        }
    }

    /// Run every template through the validating constructor.
    pub fn check_table() -> Result<(), GameError> {
        for kind in Self::ALL {
            let shape = Shape::from_rows(kind.template())?;
            if shape.occupied().any(|(_, _, v)| v != kind.value()) {
                return Err(GameError::ShapeValueMismatch { kind: kind.name() });
            }
        }
        Ok(())
    }

    /// Fresh copy of the canonical grid for this kind.
    pub fn shape(self) -> Shape {
        let rows = self.template();
        let width = rows[0].len();
        Shape {
            width,
            height: rows.len(),
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        }
    }
}

/// Rectangular grid of cell values, stored row-major. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Shape {
    /// Build a shape from rows. Rows must be non-empty and all the same width.
    pub fn from_rows(rows: &[&[u8]]) -> Result<Self, GameError> {
        let width = rows.first().map_or(0, |r| r.len());
        if width == 0 {
            return Err(GameError::EmptyShape);
        }
        if let Some(row) = rows.iter().position(|r| r.len() != width) {
            return Err(GameError::RaggedShape {
                row,
                expected: width,
                found: rows[row].len(),
            });
        }
        Ok(Self {
            width,
            height: rows.len(),
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    /// Occupied cells as (x, y, value), relative to the top-left corner.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != EMPTY)
            .map(|(i, &v)| (i % self.width, i / self.width, v))
    }

    #[cfg(test)]
    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != EMPTY).count()
    }

    /// Rows as vectors, top to bottom.
    #[cfg(test)]
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.width).map(<[u8]>::to_vec).collect()
    }
}

/// Clockwise quarter turn: `out[i][j] = in[height - 1 - j][i]`.
///
/// No bounds or collision checks; the caller validates the result against the
/// field and keeps the old shape if it does not fit.
pub fn rotate(shape: &Shape) -> Shape {
    let (w, h) = (shape.width, shape.height);
    let mut cells = Vec::with_capacity(shape.cells.len());
    for i in 0..w {
        for j in 0..h {
            cells.push(shape.get(i, h - 1 - j));
        }
    }
    Shape {
        width: h,
        height: w,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_four_cells_of_its_own_value() {
        for kind in TetrominoKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.cell_count(), 4, "{}", kind.name());
            assert!(shape.occupied().all(|(_, _, v)| v == kind.value()));
            assert!(shape.width() <= 4 && shape.height() <= 2);
        }
    }

    #[test]
    fn test_shape_table_is_well_formed() {
        assert_eq!(TetrominoKind::check_table(), Ok(()));
    }

    #[test]
    fn test_from_value_round_trips_kinds() {
        for kind in TetrominoKind::ALL {
            assert_eq!(TetrominoKind::from_value(kind.value()), Some(kind));
        }
        assert_eq!(TetrominoKind::from_value(0), None);
        assert_eq!(TetrominoKind::from_value(8), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Shape::from_rows(&[&[1, 1, 1], &[1, 1]]).unwrap_err();
        assert!(matches!(
            err,
            GameError::RaggedShape { row: 1, expected: 3, found: 2 }
        ));
        assert!(matches!(Shape::from_rows(&[]), Err(GameError::EmptyShape)));
        assert!(matches!(Shape::from_rows(&[&[]]), Err(GameError::EmptyShape)));
    }

    #[test]
    fn test_rotate_t_clockwise() {
        let t = TetrominoKind::T.shape();
        let r = rotate(&t);
        assert_eq!(r.rows(), vec![vec![3, 0], vec![3, 3], vec![3, 0]]);
    }

    #[test]
    fn test_rotate_o_four_times_is_identity() {
        let o = TetrominoKind::O.shape();
        let mut s = o.clone();
        for _ in 0..4 {
            s = rotate(&s);
        }
        assert_eq!(s, o);
    }

    #[test]
    fn test_rotate_i_alternates_orientation() {
        let i = TetrominoKind::I.shape();
        let once = rotate(&i);
        assert_eq!((once.width(), once.height()), (1, 4));
        let twice = rotate(&once);
        assert_eq!(twice.rows(), i.rows());
    }

    #[test]
    fn test_every_shape_has_four_rotation_cycle() {
        for kind in TetrominoKind::ALL {
            let shape = kind.shape();
            let back = rotate(&rotate(&rotate(&rotate(&shape))));
            assert_eq!(back, shape, "{}", kind.name());
        }
    }

    #[test]
    fn test_rotation_leaves_template_untouched() {
        let before = TetrominoKind::L.shape();
        let _ = rotate(&before);
        assert_eq!(TetrominoKind::L.shape(), before);
    }
}
