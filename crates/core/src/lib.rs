pub mod config;
pub mod field;
pub mod source;

pub use config::Config;
pub use field::*;
pub use source::*;
