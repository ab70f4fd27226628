//! Benchmark table: typed observation rows and the file loaders producing them.

pub mod load;
pub mod row;

pub use load::load_file;
pub use row::{Observation, RawTable};
