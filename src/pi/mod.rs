//! Chudnovsky evaluation of π on exact rationals.
//!
//! Series chunks are summed independently (`series`), folded together in
//! partition order (`partition`), then turned into decimals through an integer
//! square root (`sqrt`) and long division (`division`). `chudnovsky` wires the
//! stages together.

pub mod chudnovsky;
pub mod division;
pub mod partition;
pub mod rational;
pub mod series;
pub mod sqrt;

pub use chudnovsky::{compute_pi, PiComputation, Verification};
pub use rational::Rational;
pub use series::TermRange;
