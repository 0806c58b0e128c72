//! Chained execution passes: a three-layer quantized MLP on the accelerator.
//!
//! The host lays each dense layer out in bulk memory, programs the register block, strobes
//! `START`, waits for the completion pulse, and feeds the written-back activations to the
//! next layer as signed bytes. Run with `RUST_LOG=debug` to watch the controller sequence
//! its states.

use itertools::Itertools;
use tileflow::Ram;
use tileflow_npu::constants::csr;
use tileflow_npu::{Npu, NpuError, SIZE};

mod mlp3;

use mlp3::{Layer, DENSE1, DENSE2, DENSE_OUT, SAMPLES};

/// Lays out one layer's operands (weights, inputs, bias, zero sums), runs the pass, and
/// returns the written-back rows.
fn run_layer(npu: &mut Npu, ram: &mut Ram, layer: &Layer, inputs: &[Vec<i8>]) -> Result<Vec<Vec<i32>>, NpuError> {
    let weight_cols = layer.weights[0].len();

    let mut image = Vec::new();
    for row in layer.weights {
        image.extend(row.iter().map(|&v| v as u8));
    }
    for row in inputs {
        image.extend(row.iter().map(|&v| v as u8));
    }
    for word in layer.bias.iter().chain([0i32; SIZE].iter()) {
        image.extend(word.to_le_bytes());
    }
    ram.load(layer.base, &image)?;

    npu.write_reg(csr::NUM_INPUT_ROWS, inputs.len() as u32)?;
    npu.write_reg(csr::NUM_INPUT_COLS, inputs[0].len() as u32)?;
    npu.write_reg(csr::NUM_WEIGHT_ROWS, layer.weights.len() as u32)?;
    npu.write_reg(csr::NUM_WEIGHT_COLS, weight_cols as u32)?;
    npu.write_reg(csr::SAVE_OUTPUTS, 1)?;
    npu.write_reg(csr::USE_BIAS, 1)?;
    npu.write_reg(csr::USE_SUM, 1)?;
    npu.write_reg(csr::SHIFT_AMOUNT, layer.shift)?;
    npu.write_reg(csr::ACTIVATION_SELECT, u32::from(layer.rectify))?;
    npu.write_reg(csr::BASE_ADDRESS, layer.base)?;
    npu.write_reg(csr::RESULT_ADDRESS, layer.result)?;
    npu.write_reg(csr::START, 1)?;

    npu.service(ram)?;
    assert!(npu.take_completion(), "pass finished without a completion pulse");

    let mut rows = Vec::with_capacity(inputs.len());
    for r in 0..inputs.len() {
        let row: Result<Vec<i32>, _> =
            (0..weight_cols).map(|c| ram.read_word(layer.result + 4 * (r * weight_cols + c) as u32)).collect();
        rows.push(row?);
    }
    Ok(rows)
}

/// Activations re-enter the next layer as the low byte of each lane, reinterpreted signed.
fn as_activations(rows: &[Vec<i32>]) -> Vec<Vec<i8>> {
    rows.iter().map(|row| row.iter().map(|&v| v as i8).collect()).collect()
}

fn main() -> Result<(), NpuError> {
    env_logger::init();

    let mut ram = Ram::new(4096);
    let mut npu = Npu::new();

    let samples: Vec<Vec<i8>> = SAMPLES.iter().map(|r| r.to_vec()).collect();
    println!("inputs:");
    for row in &samples {
        println!("  {row:?}");
    }

    let hidden1 = run_layer(&mut npu, &mut ram, &DENSE1, &samples)?;
    log::info!("dense1 done, exit code {:?}", npu.exit_code());
    let hidden2 = run_layer(&mut npu, &mut ram, &DENSE2, &as_activations(&hidden1))?;
    log::info!("dense2 done, exit code {:?}", npu.exit_code());
    let scores = run_layer(&mut npu, &mut ram, &DENSE_OUT, &as_activations(&hidden2))?;
    log::info!("output layer done, exit code {:?}", npu.exit_code());

    println!("class scores:");
    for (sample, row) in scores.iter().enumerate() {
        let class = row.iter().position_max().unwrap_or(0);
        println!("  sample {sample}: {row:?} -> class {class}");
    }
    Ok(())
}
