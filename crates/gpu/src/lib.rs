pub mod backend;
pub mod programs;
pub mod tracker;

pub use backend::*;
pub use programs::*;
pub use tracker::*;
