pub mod data;
pub mod defaults;
pub mod io;

pub use data::{Config, EndpointMode};
pub use io::ConfigError;
