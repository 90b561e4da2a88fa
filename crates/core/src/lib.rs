pub mod config;
pub mod document;
pub mod dynamic;
pub mod error;

pub use config::MappingConfig;
pub use document::*;
pub use dynamic::*;
pub use error::*;
