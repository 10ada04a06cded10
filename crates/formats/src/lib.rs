pub mod engine_config;
pub mod manifest;
pub mod settings;

pub use engine_config::*;
pub use manifest::*;
pub use settings::*;
