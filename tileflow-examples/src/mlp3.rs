//! Quantized parameters of a small three-layer classifier (4 -> 8 -> 8 -> 3).
//!
//! Weight tiles are in stream order: the deepest (first-streamed) row pairs with the last
//! element of each input row. Hidden layers rectify and rescale by 7 so activations fit the
//! byte lanes of the next tile; the output layer keeps raw 32-bit scores.

/// One dense layer as the host programs it.
pub struct Layer {
    /// Weight tile rows in stream order.
    pub weights: &'static [&'static [i8]],
    /// Per-lane bias, one word per array lane.
    pub bias: [i32; 8],
    /// Rescale shift.
    pub shift: u32,
    /// Clamp negative lanes to zero before the shift.
    pub rectify: bool,
    /// Operand block address.
    pub base: u32,
    /// Result block address.
    pub result: u32,
}

/// Four input samples, one row each.
pub const SAMPLES: [[i8; 4]; 4] =
    [[77, -36, 54, -72], [96, -26, 29, -93], [95, -37, 33, -78], [110, 32, -59, -122]];

/// First hidden layer, 4 -> 8.
pub const DENSE1: Layer = Layer {
    weights: &[
        &[-58, -47, 43, -57, -53, 94, 34, 109],
        &[-35, -128, -26, 53, -20, -5, 127, -81],
        &[98, 10, 13, -15, -43, 69, 68, 37],
        &[85, 37, -3, -115, -110, -98, 95, -14],
    ],
    bias: [-128, -91, 10, -89, 10, 10, 127, 10],
    shift: 7,
    rectify: true,
    base: 0x000,
    result: 0x200,
};

/// Second hidden layer, 8 -> 8.
pub const DENSE2: Layer = Layer {
    weights: &[
        &[56, -57, -103, 82, 88, -37, 44, 62],
        &[-124, 78, 19, -51, -61, -98, -79, -9],
        &[66, 68, -1, -35, 96, 70, 110, -19],
        &[49, -114, 32, 42, -16, -123, -128, -118],
        &[88, -68, -106, -4, -16, -80, 71, -38],
        &[101, -10, -75, 65, -25, -74, -53, -14],
        &[78, -8, -53, -124, 127, 55, 107, 47],
        &[74, -91, -82, 37, -49, 126, -57, -59],
    ],
    bias: [-128, 41, 18, -23, 127, 86, 119, 15],
    shift: 7,
    rectify: true,
    base: 0x400,
    result: 0x600,
};

/// Output layer, 8 -> 3.
pub const DENSE_OUT: Layer = Layer {
    weights: &[
        &[-109, -119, -113],
        &[127, -103, -27],
        &[-128, 3, -39],
        &[63, -127, 33],
        &[-108, 47, -70],
        &[94, -34, -84],
        &[-51, -96, 94],
        &[16, -110, -90],
    ],
    bias: [-128, -12, 127, 0, 0, 0, 0, 0],
    shift: 0,
    rectify: false,
    base: 0x800,
    result: 0xa00,
};
