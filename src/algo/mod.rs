//! Edit distance algorithms.
//!
//! - `matrix`: Levenshtein DP matrix with a cell budget
//! - `script`: deterministic backtrace into a replayable edit script

mod matrix;
mod script;

pub use matrix::{levenshtein, DistanceMatrix};
pub use script::{apply_script, backtrace, edit_script, Backtrace, EditOp, EditStats};
