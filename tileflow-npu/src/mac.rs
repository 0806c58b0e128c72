//! Multiply-accumulate unit.
//!
//! Composes the weight FIFO, the input FIFO, the two gatekeepers and the array behind a
//! request/response contract that hides the array's fill and skew timing: stage the weight
//! rows, commit, stage the input rows, execute, and collect exactly `input_rows` raw
//! signed-32 rows in input order. The unit performs no quantization.

use tileflow::{Fifo, Gatekeeper, Valid};

use crate::constants::mac::{INPUT_FIFO_DEPTH, WEIGHT_FIFO_DEPTH};
use crate::error::NpuError;
use crate::{AccRow, PeArray, Row, SIZE};

/// Zero-pads a weight row onto the low lanes; lanes beyond the tile width stay quiet.
pub(crate) fn pad_low(values: &[i8]) -> Row {
    debug_assert!(values.len() <= SIZE);
    let n = values.len().min(SIZE);
    let mut row = [0; SIZE];
    row[..n].copy_from_slice(&values[..n]);
    row
}

/// Zero-pads an input row onto the deep lanes, aligning it with the committed weight rows.
pub(crate) fn pad_high(values: &[i8]) -> Row {
    debug_assert!(values.len() <= SIZE);
    let n = values.len().min(SIZE);
    let mut row = [0; SIZE];
    row[SIZE - n..].copy_from_slice(&values[..n]);
    row
}

/// The FIFO-buffered compute unit around the systolic core.
#[derive(Debug)]
pub struct MacUnit {
    weight_fifo: Fifo<Row>,
    input_fifo: Fifo<Row>,
    input_gate: Gatekeeper,
    output_gate: Gatekeeper,
    array: PeArray,
}

impl MacUnit {
    /// Creates an idle unit with empty FIFOs and a zero weight plane.
    pub fn new() -> Self {
        Self {
            weight_fifo: Fifo::new(WEIGHT_FIFO_DEPTH),
            input_fifo: Fifo::new(INPUT_FIFO_DEPTH),
            input_gate: Gatekeeper::new(),
            output_gate: Gatekeeper::new(),
            array: PeArray::new(),
        }
    }

    /// Stages one weight row, zero-padded past `row.len()` lanes.
    ///
    /// Rows are staged in stream order: the first row committed settles deepest (see
    /// [`PeArray`]).
    pub fn push_weight_row(&mut self, row: &[i8]) -> Result<(), NpuError> {
        self.weight_fifo.enqueue(pad_low(row))?;
        Ok(())
    }

    /// Stages one input row, aligned against the deep end of the weight plane.
    pub fn push_input_row(&mut self, row: &[i8]) -> Result<(), NpuError> {
        self.input_fifo.enqueue(pad_high(row))?;
        Ok(())
    }

    /// Drains the weight FIFO into the array over exactly `SIZE` load cycles.
    ///
    /// Zero rows pad the tail once the FIFO empties, so shorter tiles settle against the
    /// deepest rows and the shallow remainder stays quiet.
    pub fn commit_weights(&mut self) {
        for _ in 0..SIZE {
            let row = self.weight_fifo.dequeue().unwrap_or([0; SIZE]);
            self.array.load_row(row);
        }
    }

    /// Runs one compute pass and returns exactly `rows` raw rows in input order.
    pub fn execute(&mut self, rows: usize) -> Result<Vec<AccRow>, NpuError> {
        let mut collected = Vec::with_capacity(rows);
        self.execute_with(rows, |row| collected.push(row))?;
        Ok(collected)
    }

    /// Runs one compute pass, handing each raw row to `sink` on the cycle it is released.
    ///
    /// The input gatekeeper is opened for `rows` cycles up front; the output gatekeeper is
    /// opened for `rows` cycles when the array's first complete row is due, so exactly the
    /// pass's rows leave the unit. Cycles past the staged input stream zero rows.
    pub fn execute_with(&mut self, rows: usize, mut sink: impl FnMut(AccRow)) -> Result<(), NpuError> {
        self.array.begin_stream();
        self.input_gate.open(rows)?;

        let mut released = 0;
        let mut cycle = 0;
        while released < rows {
            cycle += 1;
            if cycle == PeArray::LATENCY {
                self.output_gate.open(rows)?;
            }

            let head = match self.input_fifo.peek() {
                Some(&row) => Valid::valid(row),
                None => Valid::invalid(),
            };
            let admitted = self.input_gate.admit(head);
            if admitted.valid {
                let _ = self.input_fifo.dequeue();
            }

            let streamed = self.array.stream(if admitted.valid { admitted.inner } else { [0; SIZE] });

            let released_row = self.output_gate.admit(streamed);
            if released_row.valid {
                sink(released_row.inner);
                released += 1;
            }
        }
        Ok(())
    }

    /// Clears FIFOs and gates without touching the resident weights.
    pub fn flush(&mut self) {
        self.weight_fifo.flush();
        self.input_fifo.flush();
        self.input_gate.reset();
        self.output_gate.reset();
    }

    /// Full reset: flush plus clearing the array, resident weights included.
    pub fn reset(&mut self) {
        self.flush();
        self.array.reset();
    }

    /// The systolic core, for probes and residency checks.
    pub fn array(&self) -> &PeArray {
        &self.array
    }
}

impl Default for MacUnit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: [[i8; 8]; 4] = [
        [-58, -47, 43, -57, -53, 94, 34, 109],
        [-35, -128, -26, 53, -20, -5, 127, -81],
        [98, 10, 13, -15, -43, 69, 68, 37],
        [85, 37, -3, -115, -110, -98, 95, -14],
    ];
    const INPUTS: [[i8; 4]; 4] = [[77, -36, 54, -72], [96, -26, 29, -93], [95, -37, 33, -78], [110, 32, -59, -122]];
    const RAW: [[i32; 8]; 4] = [
        [5303, -1039, -5199, -1349, -4186, -17068, 9277, -14632],
        [9991, 3951, -5379, -3812, -5093, -20089, 7873, -14792],
        [7818, 2587, -4978, -4175, -5385, -19360, 8048, -13874],
        [21627, 17676, -3626, -9303, -5830, -19745, 985, -8875],
    ];

    fn loaded_unit() -> MacUnit {
        let mut mac = MacUnit::new();
        for row in &WEIGHTS {
            mac.push_weight_row(row).unwrap();
        }
        mac.commit_weights();
        mac
    }

    fn stage_inputs(mac: &mut MacUnit) {
        for row in &INPUTS {
            mac.push_input_row(row).unwrap();
        }
    }

    #[test]
    fn produces_the_golden_raw_rows_in_order() {
        let mut mac = loaded_unit();
        stage_inputs(&mut mac);
        let raw = mac.execute(INPUTS.len()).unwrap();
        assert_eq!(raw, RAW);
    }

    #[test]
    fn zero_rows_is_a_degenerate_pass() {
        let mut mac = loaded_unit();
        assert_eq!(mac.execute(0).unwrap(), Vec::<AccRow>::new());
    }

    #[test]
    fn resident_weights_survive_between_passes() {
        let mut mac = loaded_unit();
        stage_inputs(&mut mac);
        let first = mac.execute(INPUTS.len()).unwrap();

        stage_inputs(&mut mac);
        let second = mac.execute(INPUTS.len()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn recommit_overwrites_the_weight_plane() {
        let mut mac = loaded_unit();
        stage_inputs(&mut mac);
        let before = mac.execute(INPUTS.len()).unwrap();

        // A single all-ones row settles deepest; only the deepest input lane contributes.
        mac.push_weight_row(&[1; 8]).unwrap();
        mac.commit_weights();
        stage_inputs(&mut mac);
        let after = mac.execute(INPUTS.len()).unwrap();

        assert_ne!(before, after);
        for (row, input) in after.iter().zip(&INPUTS) {
            assert_eq!(*row, [i32::from(input[3]); 8]);
        }
    }

    #[test]
    fn narrow_weight_tiles_leave_high_lanes_quiet() {
        let mut mac = MacUnit::new();
        for row in &WEIGHTS {
            mac.push_weight_row(&row[..3]).unwrap();
        }
        mac.commit_weights();
        stage_inputs(&mut mac);
        let raw = mac.execute(INPUTS.len()).unwrap();
        for (row, golden) in raw.iter().zip(&RAW) {
            assert_eq!(row[..3], golden[..3]);
            assert_eq!(row[3..], [0; 5]);
        }
    }

    #[test]
    fn passes_longer_than_the_array_depth_stream_continuously() {
        let mut mac = loaded_unit();
        let rows = 12;
        let tile: Vec<[i8; 4]> = (0..rows).map(|i| [i as i8 + 1, -(i as i8), 2 * (i as i8), -3]).collect();
        for row in &tile {
            mac.push_input_row(row).unwrap();
        }
        let raw = mac.execute(rows).unwrap();
        assert_eq!(raw.len(), rows);
        for (row, input) in raw.iter().zip(&tile) {
            for lane in 0..8 {
                let expected: i32 = (0..4).map(|k| i32::from(input[k]) * i32::from(WEIGHTS[3 - k][lane])).sum();
                assert_eq!(row[lane], expected);
            }
        }
    }

    #[test]
    fn staging_past_the_weight_fifo_depth_is_rejected() {
        let mut mac = MacUnit::new();
        for _ in 0..8 {
            mac.push_weight_row(&[1; 8]).unwrap();
        }
        assert!(mac.push_weight_row(&[1; 8]).is_err());
    }
}
