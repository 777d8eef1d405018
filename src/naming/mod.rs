//! File naming: splitting names and locating inputs and checkpoints.

mod locate;
mod split;

pub use locate::*;
pub use split::*;
