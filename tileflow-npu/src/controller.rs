//! Tile-controller state machine.

use itertools::Itertools;
use tileflow::{MemoryError, MemoryPort};

use crate::config::ExecConfig;
use crate::error::NpuError;
use crate::mac::{pad_high, MacUnit};
use crate::quantize::Quantizer;
use crate::{AccRow, Row, SIZE};

/// Controller states.
///
/// Edges are conditional: the reuse flags skip the fetch states, `save_outputs` gates the
/// writeback. Quantization runs inside `Compute`, row by row, not as a separate bulk state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Awaiting an execution call.
    Idle,
    /// Burst-reading the weight tile.
    FetchWeights,
    /// Driving the weight-load/commit sequence.
    LoadWeights,
    /// Burst-reading the input tile and the bias/sum vectors.
    FetchInputs,
    /// Streaming rows through the compute unit and quantizing them as they emerge.
    Compute,
    /// Burst-writing quantized rows.
    Writeback,
    /// Raising the completion signal.
    Complete,
}

/// The top-level sequencer.
///
/// One execution call fetches operands (unless resident copies are reused), drives the
/// multiply-accumulate unit, quantizes each raw row as it is released, and writes results
/// back. The resident weight plane, input tile and bias/sum vectors are the only state that
/// survives between calls; the controller is their sole writer.
#[derive(Debug)]
pub struct TileController {
    mac: MacUnit,
    bias: AccRow,
    sums: AccRow,
    inputs: Vec<Row>,
    results: Vec<AccRow>,
    state: State,
}

impl TileController {
    /// Creates an idle controller with no resident operands.
    pub fn new() -> Self {
        Self {
            mac: MacUnit::new(),
            bias: [0; SIZE],
            sums: [0; SIZE],
            inputs: Vec::new(),
            results: Vec::new(),
            state: State::Idle,
        }
    }

    /// Runs one execution call to completion.
    ///
    /// The configuration is validated before any memory access and rejected without side
    /// effects. A memory fault aborts the pass: bytes already written stay written, the
    /// controller returns to idle, and nothing is retried.
    pub fn execute(&mut self, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        cfg.validate()?;
        self.mac.flush();

        let entry = match (cfg.reuse_weights, cfg.reuse_inputs) {
            (false, _) => State::FetchWeights,
            (true, false) => {
                log::debug!("reusing resident weights");
                State::FetchInputs
            }
            (true, true) => {
                log::debug!("reusing resident weights and inputs");
                State::Compute
            }
        };

        let result = self.run(entry, cfg, mem);
        if let Err(err) = &result {
            log::warn!("tile aborted in {:?}: {err}", self.state);
        }
        self.state = State::Idle;
        result
    }

    fn run(&mut self, entry: State, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        self.state = entry;
        while self.state != State::Idle {
            let next = self.step(cfg, mem)?;
            log::debug!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
        Ok(())
    }

    fn step(&mut self, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<State, NpuError> {
        match self.state {
            State::Idle => Ok(State::Idle),
            State::FetchWeights => {
                self.fetch_weights(cfg, mem)?;
                Ok(State::LoadWeights)
            }
            State::LoadWeights => {
                self.mac.commit_weights();
                if cfg.reuse_inputs {
                    log::debug!("reusing resident inputs");
                    Ok(State::Compute)
                } else {
                    Ok(State::FetchInputs)
                }
            }
            State::FetchInputs => {
                self.fetch_inputs(cfg, mem)?;
                Ok(State::Compute)
            }
            State::Compute => {
                self.compute(cfg)?;
                Ok(if cfg.save_outputs { State::Writeback } else { State::Complete })
            }
            State::Writeback => {
                self.writeback(cfg, mem)?;
                Ok(State::Complete)
            }
            State::Complete => Ok(State::Idle),
        }
    }

    fn fetch_weights(&mut self, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        let mut addr = cfg.base_address;
        for _ in 0..cfg.weight_rows {
            let row = read_row(mem, addr, cfg.weight_cols)?;
            self.mac.push_weight_row(&row)?;
            addr += cfg.weight_cols as u32;
        }
        Ok(())
    }

    fn fetch_inputs(&mut self, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        let mut addr = cfg.base_address + cfg.input_offset();
        self.inputs.clear();
        for _ in 0..cfg.input_rows {
            let row = read_row(mem, addr, cfg.input_cols)?;
            self.inputs.push(pad_high(&row));
            addr += cfg.input_cols as u32;
        }
        if cfg.use_bias {
            self.bias = read_vector(mem, cfg.base_address + cfg.bias_offset())?;
        }
        if cfg.use_sum {
            self.sums = read_vector(mem, cfg.base_address + cfg.sum_offset())?;
        }
        Ok(())
    }

    fn compute(&mut self, cfg: &ExecConfig) -> Result<(), NpuError> {
        for row in &self.inputs {
            self.mac.push_input_row(row)?;
        }
        let quantizer = Quantizer::from_config(cfg, self.bias, self.sums);
        self.results.clear();

        let results = &mut self.results;
        self.mac.execute_with(cfg.input_rows, |raw| results.push(quantizer.apply(raw)))
    }

    fn writeback(&mut self, cfg: &ExecConfig, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        let mut addr = cfg.result_address;
        for row in &self.results {
            let bytes = row[..cfg.weight_cols].iter().flat_map(|v| v.to_le_bytes()).collect_vec();
            mem.burst_write(addr, &bytes)?;
            addr += cfg.result_row_bytes();
        }
        log::debug!("wrote {} result rows at {:#x}", self.results.len(), cfg.result_address);
        Ok(())
    }

    /// Current state; `Idle` between calls.
    pub fn state(&self) -> State {
        self.state
    }

    /// Quantized rows of the most recent pass, kept even when `save_outputs` is off.
    pub fn last_results(&self) -> &[AccRow] {
        &self.results
    }

    /// The compute unit, for probes and residency checks.
    pub fn mac(&self) -> &MacUnit {
        &self.mac
    }

    /// Global reset: every component returns to its initial state and all resident operands
    /// are discarded.
    pub fn reset(&mut self) {
        self.mac.reset();
        self.bias = [0; SIZE];
        self.sums = [0; SIZE];
        self.inputs.clear();
        self.results.clear();
        self.state = State::Idle;
    }
}

impl Default for TileController {
    fn default() -> Self {
        Self::new()
    }
}

fn read_row(mem: &mut dyn MemoryPort, addr: u32, len: usize) -> Result<Vec<i8>, NpuError> {
    let bytes = mem.burst_read(addr, len)?;
    if bytes.len() != len {
        return Err(MemoryError::BurstLengthMismatch { requested: len, granted: bytes.len() }.into());
    }
    Ok(bytes.iter().map(|&b| b as i8).collect_vec())
}

fn read_vector(mem: &mut dyn MemoryPort, addr: u32) -> Result<AccRow, NpuError> {
    let bytes = mem.burst_read(addr, 4 * SIZE)?;
    if bytes.len() != 4 * SIZE {
        return Err(MemoryError::BurstLengthMismatch { requested: 4 * SIZE, granted: bytes.len() }.into());
    }
    let mut vector = [0i32; SIZE];
    for (lane, chunk) in bytes.chunks_exact(4).enumerate() {
        vector[lane] = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(vector)
}
