use crate::error::GridError;

const WORD_BITS: usize = u64::BITS as usize;

/// Storage cost of one cell in bytes.
pub const CELL_SIZE: f32 = 0.125;

/// Dense two-dimensional bitmap packed into 64-bit words.
///
/// Cell `(x, y)` with `x < width` and `y < height` lives at linear index
/// `x + width * y`, so a full scanline occupies a contiguous run of bits.
/// `true` is black, `false` is white.
///
/// Bits past `width * height` in the last word are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitGrid {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitGrid {
    /// Create a new all-white grid.
    ///
    /// Fails with [`GridError::InvalidDimension`] if `width * height` overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = width
            .checked_mul(height)
            .ok_or(GridError::InvalidDimension { width, height })?;
        Ok(Self {
            width,
            height,
            words: vec![0; len.div_ceil(WORD_BITS)],
        })
    }

    /// Create a grid whose cells are produced by `f(x, y)`.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> bool,
    ) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    grid.set_linear(x + width * y, true);
                }
            }
        }
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage cost of one cell in bytes, always [`CELL_SIZE`].
    pub fn cell_size(&self) -> f32 {
        CELL_SIZE
    }

    /// Get the cell at (x, y).
    pub fn get(&self, x: usize, y: usize) -> Result<bool, GridError> {
        let idx = self.index(x, y)?;
        Ok(self.get_linear(idx))
    }

    /// Store `value` at (x, y) and return it.
    pub fn set(&mut self, x: usize, y: usize, value: bool) -> Result<bool, GridError> {
        let idx = self.index(x, y)?;
        self.set_linear(idx, value);
        Ok(value)
    }

    /// Number of black cells.
    pub fn count_black(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Visit every cell, sweeping each scanline left to right before moving down.
    pub fn for_each_row_major(&self, mut visit: impl FnMut(usize, usize, bool)) {
        for y in 0..self.height {
            let base = self.width * y;
            for x in 0..self.width {
                visit(x, y, self.get_linear(base + x));
            }
        }
    }

    /// Visit every cell, walking each column top to bottom before moving right.
    pub fn for_each_column_major(&self, mut visit: impl FnMut(usize, usize, bool)) {
        for x in 0..self.width {
            for y in 0..self.height {
                visit(x, y, self.get_linear(x + self.width * y));
            }
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if x >= self.width || y >= self.height {
            return Err(GridError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + self.width * y)
    }

    /// Read the bit at a linear index. `idx` must be below `len()`.
    #[inline]
    pub(crate) fn get_linear(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len());
        (self.words[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1
    }

    /// Write the bit at a linear index. `idx` must be below `len()`.
    #[inline]
    pub(crate) fn set_linear(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len());
        let mask = 1u64 << (idx % WORD_BITS);
        let word = &mut self.words[idx / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_white_grid() {
        let grid = BitGrid::new(10, 8).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.len(), 80);
        assert_eq!(grid.words.len(), 2);
        assert_eq!(grid.count_black(), 0);
    }

    #[test]
    fn empty_grid_is_allowed() {
        let grid = BitGrid::new(0, 5).unwrap();
        assert!(grid.is_empty());
        assert!(grid.words.is_empty());
        let mut visited = 0;
        grid.for_each_row_major(|_, _, _| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn overflowing_dimensions_rejected() {
        assert_eq!(
            BitGrid::new(usize::MAX, 2),
            Err(GridError::InvalidDimension {
                width: usize::MAX,
                height: 2
            })
        );
    }

    #[test]
    fn get_set_pixel() {
        let mut grid = BitGrid::new(4, 4).unwrap();
        assert_eq!(grid.set(2, 3, true), Ok(true));
        assert_eq!(grid.get(2, 3), Ok(true));
        assert_eq!(grid.get(3, 2), Ok(false));
        assert_eq!(grid.set(2, 3, false), Ok(false));
        assert_eq!(grid.get(2, 3), Ok(false));
    }

    #[test]
    fn linear_index_is_x_plus_width_times_y() {
        let mut grid = BitGrid::new(5, 3).unwrap();
        grid.set(1, 2, true).unwrap();
        assert!(grid.get_linear(1 + 5 * 2));
        assert_eq!(grid.count_black(), 1);
    }

    #[test]
    fn bits_straddle_word_boundaries() {
        let mut grid = BitGrid::new(65, 2).unwrap();
        grid.set(63, 0, true).unwrap();
        grid.set(64, 0, true).unwrap();
        grid.set(0, 1, true).unwrap();
        assert_eq!(grid.words.len(), 3);
        assert_eq!(grid.words[0], 1 << 63);
        assert_eq!(grid.words[1], 0b11);
        assert_eq!(grid.count_black(), 3);
    }

    #[test]
    fn out_of_range_rejected() {
        let mut grid = BitGrid::new(3, 2).unwrap();
        let err = GridError::OutOfRange {
            x: 3,
            y: 0,
            width: 3,
            height: 2,
        };
        assert_eq!(grid.get(3, 0), Err(err.clone()));
        assert_eq!(grid.set(3, 0, true), Err(err));
        assert!(grid.get(0, 2).is_err());
        assert!(grid.get(usize::MAX, usize::MAX).is_err());
        assert_eq!(grid.count_black(), 0);
    }

    #[test]
    fn from_fn_matches_set() {
        let grid = BitGrid::from_fn(3, 3, |x, y| x == y).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(grid.get(x, y).unwrap(), x == y);
            }
        }
    }

    #[test]
    fn row_major_advances_x_fastest() {
        let grid = BitGrid::from_fn(3, 2, |x, _| x == 1).unwrap();
        let mut seen = Vec::new();
        grid.for_each_row_major(|x, y, v| seen.push((x, y, v)));
        assert_eq!(
            seen,
            vec![
                (0, 0, false),
                (1, 0, true),
                (2, 0, false),
                (0, 1, false),
                (1, 1, true),
                (2, 1, false),
            ]
        );
    }

    #[test]
    fn column_major_advances_y_fastest() {
        let grid = BitGrid::from_fn(2, 3, |_, y| y == 2).unwrap();
        let mut seen = Vec::new();
        grid.for_each_column_major(|x, y, v| seen.push((x, y, v)));
        assert_eq!(
            seen,
            vec![
                (0, 0, false),
                (0, 1, false),
                (0, 2, true),
                (1, 0, false),
                (1, 1, false),
                (1, 2, true),
            ]
        );
    }

    #[test]
    fn cell_size_is_one_eighth_byte() {
        let grid = BitGrid::new(1, 1).unwrap();
        assert_eq!(grid.cell_size(), 0.125);
    }
}
