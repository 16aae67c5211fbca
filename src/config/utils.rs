use super::schemas::Config;
/// Configuration utilities - loading, reloading, and access helpers
///
/// - Loading configuration from disk (missing file = defaults)
/// - Reloading at runtime
/// - Thread-safe access helpers
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance, set once by the binaries at startup
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/realtime.toml";

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults are used and a warning is printed.
/// The loaded configuration is validated before it becomes visible.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = if Path::new(path).exists() {
        read_config_file(path)?
    } else {
        eprintln!("⚠️  Config file '{}' not found, using default values", path);
        Config::default()
    };

    config.realtime.validate()?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Initialize the global CONFIG with defaults (tools and tests)
pub fn init_default_config() -> Result<(), String> {
    if is_config_initialized() {
        return Ok(());
    }
    CONFIG
        .set(RwLock::new(Config::default()))
        .map_err(|_| "Config already initialized".to_string())
}

/// Reload configuration from a specific file path
///
/// The new configuration replaces the old one only if it parses and validates.
/// Running services keep the `RealtimeConfig` they were built with.
pub fn reload_config_from_path(path: &str) -> Result<(), String> {
    let new_config = read_config_file(path)?;
    new_config.realtime.validate()?;

    let config_lock = CONFIG
        .get()
        .ok_or_else(|| "Config not initialized. Call load_config() first.".to_string())?;
    let mut config = config_lock
        .write()
        .map_err(|e| format!("Failed to acquire config write lock: {}", e))?;
    *config = new_config;
    Ok(())
}

/// Parse a TOML configuration file without touching the global CONFIG
pub fn read_config_file(path: &str) -> Result<Config, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when CONFIG has not been loaded yet.
///
/// # Example
/// ```
/// use procureflow_realtime::config::with_config;
///
/// let url = with_config(|cfg| cfg.realtime.live.url.clone());
/// assert!(url.starts_with("ws"));
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get().map(|lock| lock.read()) {
        Some(Ok(config)) => f(&config),
        _ => f(&Config::default()),
    }
}

/// Get a clone of the entire configuration
///
/// Useful when values must be held across await points or handed to the
/// notification service.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Check if configuration has been initialized
pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[realtime]\nfallback_enabled = false\n\n[realtime.simulation]\nseed = 42\n"
        )
        .unwrap();

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert!(!config.realtime.fallback_enabled);
        assert_eq!(config.realtime.simulation.seed, Some(42));
        assert_eq!(config.realtime.health.timeout_ms, 3_000);
    }

    #[test]
    fn test_read_config_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[realtime\nbroken").unwrap();
        let err = read_config_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("Failed to parse"));

        let err = read_config_file("/nonexistent/realtime.toml").unwrap_err();
        assert!(err.contains("Failed to read"));
    }

    #[test]
    fn test_config_serialization_round_trip_sections() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[realtime.live]"));
        assert!(toml_str.contains("[realtime.reconnect]"));
    }

    #[test]
    fn test_with_config_defaults_when_uninitialized() {
        let attempts = with_config(|cfg| cfg.realtime.reconnect.max_attempts);
        assert!(attempts > 0);
    }
}
