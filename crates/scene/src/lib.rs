pub mod build;
pub mod feature;
pub mod light;
pub mod scene;
pub mod style;

pub use build::*;
pub use feature::*;
pub use light::*;
pub use scene::*;
pub use style::*;
