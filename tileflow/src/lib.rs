//! TileFlow: cycle-level dataflow primitives for tile-processing pipelines.
//!
//! The crate provides the building blocks shared by cycle-stepped accelerator models:
//! valid-qualified signal values, bounded synchronous FIFOs, cycle-counted admission gates,
//! and the burst-capable bulk-memory port contract.

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

pub mod fifo;
pub mod gatekeeper;
pub mod memory;
pub mod valid;

pub use fifo::{Fifo, FifoFullError};
pub use gatekeeper::{Gatekeeper, GatekeeperError};
pub use memory::{MemoryError, MemoryPort, Ram};
pub use valid::Valid;
