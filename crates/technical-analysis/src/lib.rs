pub mod analyzer;
pub mod indicators;
pub mod structure;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use indicators::*;
pub use structure::*;
