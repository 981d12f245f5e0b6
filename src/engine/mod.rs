//! Engine module: format dispatch, extractor registry and statement assembly

pub mod assembler;
pub mod core;
pub mod registry;

pub use assembler::*;
pub use self::core::*;
pub use registry::*;
