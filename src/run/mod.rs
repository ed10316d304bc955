//! Run-length representation of binary images.
//!
//! - [`Run`]: maximal foreground span on one scan line
//! - [`RunTable`]: ordered run sequences, one per scan line
//! - [`RunTableFactory`]: extraction of runs from a gray raster

mod factory;
mod table;

pub use factory::{RunTableFactory, DEFAULT_FOREGROUND_THRESHOLD};
pub use table::{Orientation, Run, RunTable};
