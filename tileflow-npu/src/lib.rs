//! A quantized, tile-based matrix-multiply accelerator modeled cycle by cycle.
//!
//! The design is a weight-stationary systolic array wrapped in a register-programmed tile
//! controller. A pass streams a weight tile into the array, streams an input tile through
//! it, quantizes the raw dot-product rows (running sum, bias, optional rectification,
//! fixed-point rescale), and writes the result rows back to bulk memory.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::bare_urls)]
#![deny(unreachable_pub)]
//
#![allow(elided_lifetimes_in_paths)]

use static_assertions::const_assert;

pub mod array;
pub mod config;
pub mod constants;
pub mod controller;
pub mod csr;
pub mod error;
pub mod mac;
pub mod npu;
pub mod quantize;

pub use array::PeArray;
pub use config::{ConfigError, ExecConfig};
pub use constants::array::SIZE;
pub use controller::TileController;
pub use csr::{Csr, ExitCode};
pub use error::NpuError;
pub use mac::MacUnit;
pub use npu::Npu;
pub use quantize::Quantizer;

/// One input or weight row, zero-padded to the array width.
pub type Row = [i8; SIZE];

/// One raw or quantized output row, one accumulator per lane.
pub type AccRow = [i32; SIZE];

// The lane types rely on array `Default`, and the rescale shift must stay in 0..32.
const_assert!(SIZE >= 1);
const_assert!(SIZE <= 32);
