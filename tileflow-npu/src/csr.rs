//! Control/status register block.
//!
//! Little-endian 32-bit registers at 4-byte strides, one per configuration field, plus the
//! write-strobed `START` register and the read-only `EXIT_CODE` status register. The block
//! is plain storage; strobe handling lives in the device wrapper.

use tileflow::MemoryError;

use crate::config::ExecConfig;
use crate::constants::csr;
use crate::error::NpuError;

/// Completion status reported through the `EXIT_CODE` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExitCode {
    /// The most recent pass completed (or none has run yet).
    Ok = 0,
    /// A start strobe arrived while a pass was already in flight and was rejected.
    Busy = 1,
    /// The latched configuration was rejected.
    Config = 2,
    /// A bulk-memory fault aborted the pass.
    Memory = 3,
    /// A dataflow-contract violation aborted the pass.
    Fault = 4,
}

impl ExitCode {
    /// Encodes a pass outcome.
    pub fn from_result(result: &Result<(), NpuError>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(NpuError::Config(_)) => Self::Config,
            Err(NpuError::Memory(_)) => Self::Memory,
            Err(NpuError::Gatekeeper(_)) | Err(NpuError::Fifo(_)) => Self::Fault,
        }
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::Ok
    }
}

/// The register block.
#[derive(Debug, Clone, Default)]
pub struct Csr {
    num_input_rows: u32,
    num_input_cols: u32,
    num_weight_rows: u32,
    num_weight_cols: u32,
    reuse_inputs: u32,
    reuse_weights: u32,
    save_outputs: u32,
    use_bias: u32,
    use_sum: u32,
    shift_amount: u32,
    activation_select: u32,
    base_address: u32,
    result_address: u32,
    exit_code: ExitCode,
}

impl Csr {
    /// Creates a zeroed register block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one configuration register.
    ///
    /// `START` is not plain storage and `EXIT_CODE` is read-only; writes to either are slave
    /// errors here. Unknown offsets are decode errors.
    pub fn write(&mut self, offset: u32, value: u32) -> Result<(), MemoryError> {
        let slot = match offset {
            csr::NUM_INPUT_ROWS => &mut self.num_input_rows,
            csr::NUM_INPUT_COLS => &mut self.num_input_cols,
            csr::NUM_WEIGHT_ROWS => &mut self.num_weight_rows,
            csr::NUM_WEIGHT_COLS => &mut self.num_weight_cols,
            csr::REUSE_INPUTS => &mut self.reuse_inputs,
            csr::REUSE_WEIGHTS => &mut self.reuse_weights,
            csr::SAVE_OUTPUTS => &mut self.save_outputs,
            csr::USE_BIAS => &mut self.use_bias,
            csr::USE_SUM => &mut self.use_sum,
            csr::SHIFT_AMOUNT => &mut self.shift_amount,
            csr::ACTIVATION_SELECT => &mut self.activation_select,
            csr::BASE_ADDRESS => &mut self.base_address,
            csr::RESULT_ADDRESS => &mut self.result_address,
            csr::START | csr::EXIT_CODE => return Err(MemoryError::Slave { addr: offset }),
            _ => return Err(MemoryError::Decode { addr: offset }),
        };
        *slot = value;
        Ok(())
    }

    /// Reads one register. `START` reads as zero; unknown offsets are decode errors.
    pub fn read(&self, offset: u32) -> Result<u32, MemoryError> {
        Ok(match offset {
            csr::NUM_INPUT_ROWS => self.num_input_rows,
            csr::NUM_INPUT_COLS => self.num_input_cols,
            csr::NUM_WEIGHT_ROWS => self.num_weight_rows,
            csr::NUM_WEIGHT_COLS => self.num_weight_cols,
            csr::REUSE_INPUTS => self.reuse_inputs,
            csr::REUSE_WEIGHTS => self.reuse_weights,
            csr::SAVE_OUTPUTS => self.save_outputs,
            csr::USE_BIAS => self.use_bias,
            csr::USE_SUM => self.use_sum,
            csr::SHIFT_AMOUNT => self.shift_amount,
            csr::ACTIVATION_SELECT => self.activation_select,
            csr::BASE_ADDRESS => self.base_address,
            csr::RESULT_ADDRESS => self.result_address,
            csr::START => 0,
            csr::EXIT_CODE => self.exit_code as u32,
            _ => return Err(MemoryError::Decode { addr: offset }),
        })
    }

    /// Latches the register values into an execution configuration.
    pub fn to_config(&self) -> ExecConfig {
        ExecConfig {
            input_rows: self.num_input_rows as usize,
            input_cols: self.num_input_cols as usize,
            weight_rows: self.num_weight_rows as usize,
            weight_cols: self.num_weight_cols as usize,
            reuse_inputs: self.reuse_inputs != 0,
            reuse_weights: self.reuse_weights != 0,
            save_outputs: self.save_outputs != 0,
            use_bias: self.use_bias != 0,
            use_sum: self.use_sum != 0,
            shift_amount: self.shift_amount,
            activation_select: self.activation_select != 0,
            base_address: self.base_address,
            result_address: self.result_address,
        }
    }

    /// Records the completion status of a pass.
    pub fn set_exit_code(&mut self, code: ExitCode) {
        self.exit_code = code;
    }

    /// The most recent completion status.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Clears every register.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
