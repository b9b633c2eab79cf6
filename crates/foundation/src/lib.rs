pub mod handles;
pub mod math;
pub mod mercator;
pub mod tile;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use handles::*;
pub use math::*;
pub use mercator::*;
pub use tile::*;
pub use time::*;
