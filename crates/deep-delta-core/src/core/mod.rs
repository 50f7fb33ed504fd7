/// Core application components
/// Engine configuration
pub mod config;

pub use config::{load_config, load_config_or_default, EngineConfig};
