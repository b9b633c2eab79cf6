pub mod cache;
pub mod manager;
pub mod queue;
pub mod source;
pub mod tile;

pub use cache::*;
pub use manager::*;
pub use queue::*;
pub use source::*;
pub use tile::*;
