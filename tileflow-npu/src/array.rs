//! Weight-stationary processing-element array.

use arrayvec::ArrayVec;
use tileflow::Valid;

use crate::{AccRow, Row, SIZE};

/// One processing element: a resident weight, the input register shifting across the output
/// lanes, and the partial-sum register flowing down the depths.
#[derive(Debug, Clone, Copy, Default)]
struct Pe {
    weight: i8,
    input: i8,
    acc: i32,
}

/// Flat arena index of the cell at `(depth, lane)`.
fn at(depth: usize, lane: usize) -> usize {
    depth * SIZE + lane
}

type SkewLine<T> = ArrayVec<T, SIZE>;

fn skew_lines<T: Default>(depth_of: impl Fn(usize) -> usize) -> [SkewLine<T>; SIZE] {
    std::array::from_fn(|i| {
        let mut line = SkewLine::new();
        for _ in 0..depth_of(i) {
            line.push(T::default());
        }
        line
    })
}

/// The `SIZE` by `SIZE` processing-element arena, stepped one cycle at a time.
///
/// Per compute cycle, input values shift one output lane to the right and partial sums flow
/// one depth down, so the grid works on `SIZE` diagonals at once. Per load cycle, weight
/// rows shift one depth down, so the first row of a commit settles deepest. A streamed input
/// row `x` therefore meets the committed rows bottom-up and produces
/// `out[j] = sum of x[k] * w[rows - 1 - k][j]`: weight tiles are stored and streamed
/// deepest-row-first.
///
/// Triangular skew buffers at the edges feed depth `i` its element `i` cycles late and
/// realign lane `j`'s bottom sum `SIZE - 1 - j` cycles later, so whole rows enter and whole
/// rows leave while the grid itself runs on diagonals.
#[derive(Debug, Clone)]
pub struct PeArray {
    cells: Vec<Pe>,
    skew: [SkewLine<i8>; SIZE],
    deskew: [SkewLine<i32>; SIZE],
    cycle: usize,
}

impl PeArray {
    /// Stream cycles until the first complete output row: grid fill plus deskew alignment.
    pub const LATENCY: usize = 2 * SIZE - 1;

    /// Creates an idle array with an all-zero weight plane.
    pub fn new() -> Self {
        Self {
            cells: vec![Pe::default(); SIZE * SIZE],
            skew: skew_lines(|i| i),
            deskew: skew_lines(|i| SIZE - 1 - i),
            cycle: 0,
        }
    }

    /// One weight-load cycle: `row` enters depth 0 and resident rows shift one depth deeper.
    pub fn load_row(&mut self, row: Row) {
        for depth in (1..SIZE).rev() {
            for lane in 0..SIZE {
                self.cells[at(depth, lane)].weight = self.cells[at(depth - 1, lane)].weight;
            }
        }
        for lane in 0..SIZE {
            self.cells[at(0, lane)].weight = row[lane];
        }
    }

    /// Begins a stream pass: clears input, accumulator and skew state, keeps the weights.
    pub fn begin_stream(&mut self) {
        self.cycle = 0;
        for cell in &mut self.cells {
            cell.input = 0;
            cell.acc = 0;
        }
        self.skew = skew_lines(|i| i);
        self.deskew = skew_lines(|i| SIZE - 1 - i);
    }

    /// One compute cycle: presents one input row and returns the deskewed bottom row.
    ///
    /// The result is invalid for the first `LATENCY - 1` cycles of a pass; from then on each
    /// cycle carries one complete raw output row, in input order. Accumulation wraps in
    /// 32 bits; there is no saturation.
    pub fn stream(&mut self, row: Row) -> Valid<AccRow> {
        self.cycle += 1;

        // Edge skew: depth i sees its element i cycles late.
        let mut lane_in = [0i8; SIZE];
        for (depth, line) in self.skew.iter_mut().enumerate() {
            line.push(row[depth]);
            lane_in[depth] = line.remove(0);
        }

        // Two-phase grid update, evaluated bottom-up and right-to-left so every read still
        // sees the previous cycle's registers.
        for depth in (0..SIZE).rev() {
            for lane in (0..SIZE).rev() {
                let x = if lane == 0 { lane_in[depth] } else { self.cells[at(depth, lane - 1)].input };
                let carry = if depth == 0 { 0 } else { self.cells[at(depth - 1, lane)].acc };
                let cell = &mut self.cells[at(depth, lane)];
                cell.input = x;
                cell.acc = i32::from(x).wrapping_mul(i32::from(cell.weight)).wrapping_add(carry);
            }
        }

        // Edge deskew: realign the diagonal bottom sums into whole rows.
        let mut out = [0i32; SIZE];
        for (lane, line) in self.deskew.iter_mut().enumerate() {
            line.push(self.cells[at(SIZE - 1, lane)].acc);
            out[lane] = line.remove(0);
        }

        Valid::new(self.cycle >= Self::LATENCY, out)
    }

    /// Raw bottom-row accumulators, bypassing the deskew stage.
    ///
    /// Lane `j` carries the sum for input row `r` on stream cycle `r + j + SIZE`; the
    /// diagonal activity for `n` rows spans `n + SIZE - 1` cycles.
    pub fn probe_bottom(&self) -> AccRow {
        let mut out = [0i32; SIZE];
        for (lane, value) in out.iter_mut().enumerate() {
            *value = self.cells[at(SIZE - 1, lane)].acc;
        }
        out
    }

    /// Snapshot of the resident weight plane, indexed `[depth][lane]`.
    pub fn resident_weights(&self) -> [[i8; SIZE]; SIZE] {
        let mut plane = [[0i8; SIZE]; SIZE];
        for (depth, row) in plane.iter_mut().enumerate() {
            for (lane, w) in row.iter_mut().enumerate() {
                *w = self.cells[at(depth, lane)].weight;
            }
        }
        plane
    }

    /// Full reset: clears the stream state and the resident weights.
    pub fn reset(&mut self) {
        self.begin_stream();
        for cell in &mut self.cells {
            cell.weight = 0;
        }
    }
}

impl Default for PeArray {
    fn default() -> Self {
        Self::new()
    }
}
