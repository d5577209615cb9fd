pub mod consensus;
mod load;
pub mod stats;
