//! Tarn Runtime Library
//!
//! C-callable surface compiled Tarn programs link against: install the
//! object runtime, register arena regions and immortal ranges, and run
//! the lifetime passes.

mod gc;

pub use gc::*;
