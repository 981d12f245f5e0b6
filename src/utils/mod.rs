//! Utility modules

pub mod dates;
pub mod parsing;
pub mod validation;

pub use dates::*;
pub use parsing::*;
pub use validation::*;
