//! A three-layer quantized MLP run as chained execution passes.
//!
//! Each dense layer is one tile: the host lays the layer's operands out in memory, strobes
//! the device, waits for the completion pulse, and feeds the written-back activations to the
//! next layer as signed bytes. Hidden layers rectify and rescale by 7; the output layer
//! leaves raw 32-bit scores.

use pretty_assertions::assert_eq;
use tileflow::Ram;
use tileflow_npu::constants::csr;
use tileflow_npu::{Npu, SIZE};

/// Weight tiles in stream order (deepest row first).
const L1_WEIGHTS: [[i8; 8]; 4] = [
    [-58, -47, 43, -57, -53, 94, 34, 109],
    [-35, -128, -26, 53, -20, -5, 127, -81],
    [98, 10, 13, -15, -43, 69, 68, 37],
    [85, 37, -3, -115, -110, -98, 95, -14],
];
const L2_WEIGHTS: [[i8; 8]; 8] = [
    [56, -57, -103, 82, 88, -37, 44, 62],
    [-124, 78, 19, -51, -61, -98, -79, -9],
    [66, 68, -1, -35, 96, 70, 110, -19],
    [49, -114, 32, 42, -16, -123, -128, -118],
    [88, -68, -106, -4, -16, -80, 71, -38],
    [101, -10, -75, 65, -25, -74, -53, -14],
    [78, -8, -53, -124, 127, 55, 107, 47],
    [74, -91, -82, 37, -49, 126, -57, -59],
];
const L3_WEIGHTS: [[i8; 3]; 8] = [
    [-109, -119, -113],
    [127, -103, -27],
    [-128, 3, -39],
    [63, -127, 33],
    [-108, 47, -70],
    [94, -34, -84],
    [-51, -96, 94],
    [16, -110, -90],
];

const L1_BIAS: [i32; 8] = [-128, -91, 10, -89, 10, 10, 127, 10];
const L2_BIAS: [i32; 8] = [-128, 41, 18, -23, 127, 86, 119, 15];
const L3_BIAS: [i32; 8] = [-128, -12, 127, 0, 0, 0, 0, 0];

const SAMPLES: [[i8; 4]; 4] = [[77, -36, 54, -72], [96, -26, 29, -93], [95, -37, 33, -78], [110, 32, -59, -122]];

const L1_EXPECTED: [[i32; 8]; 4] =
    [[40, 0, 0, 0, 0, 0, 73, 0], [77, 30, 0, 0, 0, 0, 62, 0], [60, 19, 0, 0, 0, 0, 63, 0], [167, 137, 0, 0, 0, 0, 8, 0]];
const L2_EXPECTED: [[i32; 8]; 4] =
    [[0, 16, 0, 0, 0, 0, 0, 0], [1, 0, 0, 0, 0, 41, 0, 0], [0, 0, 0, 0, 0, 19, 0, 0], [0, 75, 107, 86, 0, 0, 0, 0]];
const L3_EXPECTED: [[i32; 3]; 4] =
    [[-944, -1548, 1631], [-5360, 1, -1562], [-2560, 45, -614], [-3183, -6808, -7831]];

struct Layer<'a> {
    weights: Vec<&'a [i8]>,
    bias: [i32; 8],
    shift: u32,
    rectify: bool,
    base: u32,
    result: u32,
}

/// Lays out one layer's operands, runs the pass, and returns the written-back rows.
fn run_layer(npu: &mut Npu, ram: &mut Ram, layer: &Layer<'_>, inputs: &[Vec<i8>]) -> Vec<Vec<i32>> {
    let weight_cols = layer.weights[0].len();
    let input_cols = inputs[0].len();

    let mut image = Vec::new();
    for row in &layer.weights {
        image.extend(row.iter().map(|&v| v as u8));
    }
    for row in inputs {
        image.extend(row.iter().map(|&v| v as u8));
    }
    for word in layer.bias.iter().chain([0i32; SIZE].iter()) {
        image.extend(word.to_le_bytes());
    }
    ram.load(layer.base, &image).unwrap();

    npu.write_reg(csr::NUM_INPUT_ROWS, inputs.len() as u32).unwrap();
    npu.write_reg(csr::NUM_INPUT_COLS, input_cols as u32).unwrap();
    npu.write_reg(csr::NUM_WEIGHT_ROWS, layer.weights.len() as u32).unwrap();
    npu.write_reg(csr::NUM_WEIGHT_COLS, weight_cols as u32).unwrap();
    npu.write_reg(csr::SAVE_OUTPUTS, 1).unwrap();
    npu.write_reg(csr::USE_BIAS, 1).unwrap();
    npu.write_reg(csr::USE_SUM, 1).unwrap();
    npu.write_reg(csr::SHIFT_AMOUNT, layer.shift).unwrap();
    npu.write_reg(csr::ACTIVATION_SELECT, u32::from(layer.rectify)).unwrap();
    npu.write_reg(csr::BASE_ADDRESS, layer.base).unwrap();
    npu.write_reg(csr::RESULT_ADDRESS, layer.result).unwrap();
    npu.write_reg(csr::START, 1).unwrap();

    npu.service(ram).unwrap();
    assert!(npu.take_completion());

    (0..inputs.len())
        .map(|r| {
            (0..weight_cols)
                .map(|c| ram.read_word(layer.result + 4 * (r * weight_cols + c) as u32).unwrap())
                .collect()
        })
        .collect()
}

/// Activations re-enter the next layer as the low byte of each lane, reinterpreted signed.
fn as_activations(rows: &[Vec<i32>]) -> Vec<Vec<i8>> {
    rows.iter().map(|row| row.iter().map(|&v| v as i8).collect()).collect()
}

#[test]
fn three_dense_layers_chain_through_memory() {
    let mut ram = Ram::new(4096);
    let mut npu = Npu::new();

    let l1 = Layer {
        weights: L1_WEIGHTS.iter().map(|r| &r[..]).collect(),
        bias: L1_BIAS,
        shift: 7,
        rectify: true,
        base: 0x000,
        result: 0x200,
    };
    let samples: Vec<Vec<i8>> = SAMPLES.iter().map(|r| r.to_vec()).collect();
    let hidden1 = run_layer(&mut npu, &mut ram, &l1, &samples);
    assert_eq!(hidden1, L1_EXPECTED.iter().map(|r| r.to_vec()).collect::<Vec<_>>());

    let l2 = Layer {
        weights: L2_WEIGHTS.iter().map(|r| &r[..]).collect(),
        bias: L2_BIAS,
        shift: 7,
        rectify: true,
        base: 0x400,
        result: 0x600,
    };
    let hidden2 = run_layer(&mut npu, &mut ram, &l2, &as_activations(&hidden1));
    assert_eq!(hidden2, L2_EXPECTED.iter().map(|r| r.to_vec()).collect::<Vec<_>>());

    let l3 = Layer {
        weights: L3_WEIGHTS.iter().map(|r| &r[..]).collect(),
        bias: L3_BIAS,
        shift: 0,
        rectify: false,
        base: 0x800,
        result: 0xa00,
    };
    let scores = run_layer(&mut npu, &mut ram, &l3, &as_activations(&hidden2));
    assert_eq!(scores, L3_EXPECTED.iter().map(|r| r.to_vec()).collect::<Vec<_>>());
}
