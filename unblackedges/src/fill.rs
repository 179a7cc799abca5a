use log::debug;
use smallvec::SmallVec;

use crate::grid::BitGrid;

/// Counters collected during one border fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Black border cells pushed while seeding.
    pub seeded: usize,
    /// Total pushes, seeds included. A cell reached from several sides is
    /// counted once per push.
    pub pushed: usize,
    /// Cells that went from black to white.
    pub cleared: usize,
    /// Largest number of entries held by the worklist at once.
    pub peak_worklist: usize,
}

/// LIFO stack of linear cell indices.
///
/// Grows on demand: a cell can be queued once per neighbour that sees it
/// black, so the peak may exceed the cell count.
struct Worklist {
    stack: Vec<usize>,
    pushed: usize,
    peak: usize,
}

impl Worklist {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
            pushed: 0,
            peak: 0,
        }
    }

    #[inline]
    fn push(&mut self, idx: usize) {
        self.stack.push(idx);
        self.pushed += 1;
        self.peak = self.peak.max(self.stack.len());
    }

    #[inline]
    fn pop(&mut self) -> Option<usize> {
        self.stack.pop()
    }
}

/// The 4-connected neighbours of `idx` that lie inside a `width`-wide grid
/// of `len` cells, in the order right, left, below, above.
#[inline]
fn neighbors(idx: usize, width: usize, len: usize) -> SmallVec<[usize; 4]> {
    let mut out = SmallVec::new();
    let x = idx % width;
    if x + 1 < width {
        out.push(idx + 1);
    }
    if x > 0 {
        out.push(idx - 1);
    }
    if idx + width < len {
        out.push(idx + width);
    }
    if idx >= width {
        out.push(idx - width);
    }
    out
}

/// Iterative flood fill that whitens every black region touching the border.
///
/// Run [`seed`](Self::seed) then [`propagate`](Self::propagate), or use
/// [`clear_border`] for both. The fill owns its worklist and borrows the
/// grid mutably for its whole lifetime.
pub struct BorderFill<'g> {
    grid: &'g mut BitGrid,
    worklist: Worklist,
    seeded: usize,
    cleared: usize,
}

impl<'g> BorderFill<'g> {
    pub fn new(grid: &'g mut BitGrid) -> Self {
        let worklist = Worklist::with_capacity(grid.len());
        Self {
            grid,
            worklist,
            seeded: 0,
            cleared: 0,
        }
    }

    /// Push every black cell on the four border lines.
    ///
    /// Scan order: top row left to right, bottom row left to right, then the
    /// left and right columns top to bottom. Corners are visited once.
    pub fn seed(&mut self) {
        let (w, h) = (self.grid.width(), self.grid.height());
        if w == 0 || h == 0 {
            return;
        }
        for x in 0..w {
            self.seed_cell(x);
        }
        if h > 1 {
            for x in 0..w {
                self.seed_cell(x + w * (h - 1));
            }
        }
        for y in 1..h - 1 {
            self.seed_cell(w * y);
        }
        if w > 1 {
            for y in 1..h - 1 {
                self.seed_cell(w * y + w - 1);
            }
        }
    }

    fn seed_cell(&mut self, idx: usize) {
        if self.grid.get_linear(idx) {
            self.worklist.push(idx);
            self.seeded += 1;
        }
    }

    /// Drain the worklist: clear each popped cell and queue its black neighbours.
    pub fn propagate(&mut self) {
        let width = self.grid.width();
        let len = self.grid.len();
        while let Some(idx) = self.worklist.pop() {
            // A cell queued twice is already white on its second pop.
            if self.grid.get_linear(idx) {
                self.grid.set_linear(idx, false);
                self.cleared += 1;
            }
            for n in neighbors(idx, width, len) {
                if self.grid.get_linear(n) {
                    self.worklist.push(n);
                }
            }
        }
    }

    pub fn finish(self) -> FillStats {
        FillStats {
            seeded: self.seeded,
            pushed: self.worklist.pushed,
            cleared: self.cleared,
            peak_worklist: self.worklist.peak,
        }
    }
}

/// Whiten every black pixel 4-connected to the image border.
///
/// Black pixels with no such path keep their value.
pub fn clear_border(grid: &mut BitGrid) -> FillStats {
    let mut fill = BorderFill::new(grid);
    fill.seed();
    fill.propagate();
    let stats = fill.finish();
    debug!(
        "border fill: seeded={} pushed={} cleared={} peak={}",
        stats.seeded, stats.pushed, stats.cleared, stats.peak_worklist
    );
    stats
}
