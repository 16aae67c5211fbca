/// Configuration system for the realtime client
///
/// - `macros`: the `config_struct!` macro (fields with embedded defaults)
/// - `schemas`: every configuration structure and its validation
/// - `utils`: TOML loading, reloading and global access helpers
///
/// The binaries load the global configuration once at startup and hand a
/// `RealtimeConfig` value to the notification service. Library code never
/// reads the global directly.
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    Config, HealthConfig, LiveTransportConfig, RealtimeConfig, ReconnectConfig, SimulationConfig,
};
pub use utils::{
    get_config_clone, init_default_config, is_config_initialized, load_config,
    load_config_from_path, read_config_file, reload_config_from_path, with_config, CONFIG_FILE_PATH,
};
