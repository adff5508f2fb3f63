pub mod burst;
pub mod chirp;
pub mod error;
pub mod format;

pub use burst::*;
pub use chirp::*;
pub use error::*;
pub use format::*;
