//! Per-call execution configuration.

use thiserror::Error;

use crate::constants::array::SIZE;
use crate::constants::mac::INPUT_FIFO_DEPTH;
use crate::constants::quantize::MAX_SHIFT;

/// Illegal configurations, detected before any memory access is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The weight depth does not match the input width, so no contraction is defined.
    #[error("weight rows ({weight_rows}) must equal input columns ({input_cols})")]
    ContractionMismatch {
        /// Configured weight tile rows.
        weight_rows: usize,
        /// Configured input tile columns.
        input_cols: usize,
    },

    /// A column count larger than the fixed array width.
    #[error("column count {cols} exceeds array width {width}")]
    ColumnsExceedArray {
        /// Offending column count.
        cols: usize,
        /// The array width.
        width: usize,
    },

    /// More input rows than the input FIFO can buffer in one pass.
    #[error("input rows {rows} exceed buffering capacity {capacity}")]
    RowsExceedBuffer {
        /// Configured input tile rows.
        rows: usize,
        /// Input FIFO depth.
        capacity: usize,
    },

    /// A rescale shift outside the supported range.
    #[error("shift amount {shift} outside 0..={max}")]
    ShiftOutOfRange {
        /// Offending shift amount.
        shift: u32,
        /// Largest legal shift.
        max: u32,
    },
}

/// The configuration of one execution call, latched on start and immutable for the pass.
///
/// Operand tiles live in bulk memory starting at `base_address`: weight bytes (row-major,
/// one signed byte per element, rows in stream order), then input bytes, then the bias
/// vector and the sum vector as little-endian signed 32-bit words, `4 * SIZE` bytes each.
/// Result rows are written contiguously from `result_address`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecConfig {
    /// Input tile rows; bounded only by input buffering.
    pub input_rows: usize,
    /// Input tile columns; the contraction depth.
    pub input_cols: usize,
    /// Weight tile rows; must equal `input_cols`.
    pub weight_rows: usize,
    /// Weight tile columns; the number of live output lanes.
    pub weight_cols: usize,
    /// Skip the input fetch and replay the resident input tile.
    pub reuse_inputs: bool,
    /// Skip the weight fetch and load, keeping the resident weights.
    pub reuse_weights: bool,
    /// Write quantized rows back to memory.
    pub save_outputs: bool,
    /// Add the bias vector during quantization.
    pub use_bias: bool,
    /// Add the carried sum vector during quantization.
    pub use_sum: bool,
    /// Arithmetic right-shift applied after the additions, 0..=31.
    pub shift_amount: u32,
    /// Rectify (clamp negative lanes to zero) before the shift.
    pub activation_select: bool,
    /// Byte address of the operand block.
    pub base_address: u32,
    /// Byte address of the result block.
    pub result_address: u32,
}

impl ExecConfig {
    /// Validates the dimension and quantization invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weight_cols > SIZE {
            return Err(ConfigError::ColumnsExceedArray { cols: self.weight_cols, width: SIZE });
        }
        if self.input_cols > SIZE {
            return Err(ConfigError::ColumnsExceedArray { cols: self.input_cols, width: SIZE });
        }
        if self.weight_rows != self.input_cols {
            return Err(ConfigError::ContractionMismatch {
                weight_rows: self.weight_rows,
                input_cols: self.input_cols,
            });
        }
        if self.input_rows > INPUT_FIFO_DEPTH {
            return Err(ConfigError::RowsExceedBuffer { rows: self.input_rows, capacity: INPUT_FIFO_DEPTH });
        }
        if self.shift_amount > MAX_SHIFT {
            return Err(ConfigError::ShiftOutOfRange { shift: self.shift_amount, max: MAX_SHIFT });
        }
        Ok(())
    }

    /// Byte offset of the input tile, relative to `base_address`.
    ///
    /// Offsets are computed from the declared dimensions whether or not a segment's fetch is
    /// skipped by a reuse flag, so a reused layout stays addressable.
    pub fn input_offset(&self) -> u32 {
        (self.weight_rows * self.weight_cols) as u32
    }

    /// Byte offset of the bias vector, relative to `base_address`.
    pub fn bias_offset(&self) -> u32 {
        self.input_offset() + (self.input_rows * self.input_cols) as u32
    }

    /// Byte offset of the sum vector, relative to `base_address`.
    pub fn sum_offset(&self) -> u32 {
        self.bias_offset() + 4 * SIZE as u32
    }

    /// Bytes occupied by one result row: one little-endian word per live output lane.
    pub fn result_row_bytes(&self) -> u32 {
        4 * self.weight_cols as u32
    }
}
