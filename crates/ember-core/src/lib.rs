pub mod constants;
pub mod detector;
pub mod error;
pub mod field;
pub mod params;
pub mod state;

pub use constants::*;
pub use detector::*;
pub use error::*;
pub use field::*;
pub use params::*;
pub use state::*;

// Shaders bundled as string constants
pub static SPARKS_WGSL: &str = include_str!("../shaders/sparks.wgsl");
