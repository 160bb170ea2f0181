use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// # Frame Buffer
/// A monochrome grid of `cols` x `rows` cells stored row by row.
///
/// Cells are only ever flipped, never set directly, so drawing the same sprite
/// twice in the same place restores whatever was there before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl FrameBuffer {
    pub fn new(cols: usize, rows: usize) -> Self {
        FrameBuffer {
            cols,
            rows,
            cells: vec![false; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The cells in row-major order
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = false);
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.cols && y < self.rows && self.cells[x + y * self.cols]
    }

    /// Flips the cell at (x, y) and returns true if it ended up unset.
    ///
    /// Coordinates past the edge are pulled back by exactly one grid dimension.
    /// A coordinate equal to the dimension is left alone, so x == cols spills into
    /// column 0 of the following row. Anything still outside the grid is dropped
    /// and reports false.
    pub fn toggle_pixel(&mut self, mut x: usize, mut y: usize) -> bool {
        if x > self.cols {
            x -= self.cols;
        }
        if y > self.rows {
            y -= self.rows;
        }

        match self.cells.get_mut(x + y * self.cols) {
            Some(cell) => {
                *cell ^= true;
                !*cell
            }
            None => false,
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}
