//! The register-programmed accelerator device.

use tileflow::{MemoryError, MemoryPort};

use crate::config::ExecConfig;
use crate::constants::csr;
use crate::controller::TileController;
use crate::csr::{Csr, ExitCode};
use crate::error::NpuError;
use crate::AccRow;

/// The device: register block, tile controller, and the completion line.
///
/// A host programs the configuration registers, strobes `START`, and lets the device run
/// with [`service`](Npu::service). Completion is a one-shot pulse backed by the `EXIT_CODE`
/// register, so both interrupt-style and polling hosts can sequence back-to-back tiles.
#[derive(Debug, Default)]
pub struct Npu {
    csr: Csr,
    controller: TileController,
    pending: Option<ExecConfig>,
    completion: bool,
}

impl Npu {
    /// Creates a device in its reset state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-side register write.
    ///
    /// Any write to `START` strobes the device: the current register values are latched and
    /// a pass is armed. A strobe while a pass is already in flight is rejected, never
    /// queued: the strobe is dropped and `EXIT_CODE` reports busy.
    pub fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), MemoryError> {
        if offset == csr::START {
            if self.pending.is_some() {
                log::warn!("start strobe while a pass is in flight; rejected");
                self.csr.set_exit_code(ExitCode::Busy);
            } else {
                self.pending = Some(self.csr.to_config());
            }
            return Ok(());
        }
        self.csr.write(offset, value)
    }

    /// Host-side register read.
    pub fn read_reg(&self, offset: u32) -> Result<u32, MemoryError> {
        self.csr.read(offset)
    }

    /// Runs the armed pass to completion against `mem`.
    ///
    /// Records the exit code; on success the completion pulse is raised. With no pass armed
    /// this is a no-op. The returned error mirrors what `EXIT_CODE` reports.
    pub fn service(&mut self, mem: &mut dyn MemoryPort) -> Result<(), NpuError> {
        let Some(cfg) = self.pending.take() else {
            return Ok(());
        };

        let result = self.controller.execute(&cfg, mem);
        self.csr.set_exit_code(ExitCode::from_result(&result));
        if result.is_ok() {
            self.completion = true;
        }
        result
    }

    /// One-shot completion pulse: `true` exactly once per completed pass.
    pub fn take_completion(&mut self) -> bool {
        std::mem::take(&mut self.completion)
    }

    /// The most recent completion status.
    pub fn exit_code(&self) -> ExitCode {
        self.csr.exit_code()
    }

    /// Quantized rows of the most recent pass, kept even when `save_outputs` is off.
    pub fn last_results(&self) -> &[AccRow] {
        self.controller.last_results()
    }

    /// The sequencer, for probes and residency checks.
    pub fn controller(&self) -> &TileController {
        &self.controller
    }

    /// Global reset: registers, controller, resident operands, pending strobe and completion
    /// line all return to their initial state.
    pub fn reset(&mut self) {
        self.csr.reset();
        self.controller.reset();
        self.pending = None;
        self.completion = false;
    }
}
