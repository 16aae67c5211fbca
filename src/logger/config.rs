/// Logger configuration derived from command-line flags
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments::{self, DEBUG_KEYS};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

/// Runtime logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Most detailed of Warning/Info shown (errors are always shown)
    pub min_level: LogLevel,

    /// Show verbose and debug output for every tag (--verbose)
    pub verbose_all: bool,

    /// Tags with debug output enabled (debug keys)
    pub debug_tags: HashSet<String>,

    /// Tags with verbose output enabled (debug keys)
    pub verbose_tags: HashSet<String>,

    /// If non-empty, only these tags are shown below ERROR
    pub enabled_tags: HashSet<String>,

    /// Colored console output
    pub use_colors: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            verbose_all: false,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            use_colors: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    match LOGGER_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(_) => LoggerConfig::default(),
    }
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Build the configuration from the stored command-line arguments
pub fn init_from_args() {
    set_logger_config(config_from_args(&arguments::get_cmd_args()));
}

fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    for arg in args {
        if arg == "--debug-all" {
            config
                .debug_tags
                .extend(DEBUG_KEYS.iter().map(|k| k.to_string()));
        } else if let Some(key) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(key.to_string());
        } else if let Some(key) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(key.to_string());
        } else if arg == "--verbose" {
            config.verbose_all = true;
        } else if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if arg == "--no-color" {
            config.use_colors = false;
        }
    }

    config
}

pub(super) fn is_debug_enabled_for_tag(config: &LoggerConfig, tag: &LogTag) -> bool {
    config.verbose_all || config.debug_tags.contains(&tag.to_debug_key())
}

pub(super) fn is_verbose_enabled_for_tag(config: &LoggerConfig, tag: &LogTag) -> bool {
    config.verbose_all || config.verbose_tags.contains(&tag.to_debug_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_debug_flags_enable_tags() {
        let config = config_from_args(&args(&["bin", "--debug-transport", "--debug-health"]));
        assert_eq!(config.min_level, LogLevel::Info);
        assert!(is_debug_enabled_for_tag(&config, &LogTag::Transport));
        assert!(is_debug_enabled_for_tag(&config, &LogTag::Health));
        assert!(!is_debug_enabled_for_tag(&config, &LogTag::Simulator));
    }

    #[test]
    fn test_quiet_and_verbose() {
        let quiet = config_from_args(&args(&["bin", "--quiet"]));
        assert_eq!(quiet.min_level, LogLevel::Warning);

        let verbose = config_from_args(&args(&["bin", "--verbose-registry"]));
        assert!(is_verbose_enabled_for_tag(&verbose, &LogTag::Registry));
        assert!(!is_verbose_enabled_for_tag(&verbose, &LogTag::Transport));

        let everything = config_from_args(&args(&["bin", "--verbose"]));
        assert!(is_verbose_enabled_for_tag(&everything, &LogTag::Transport));
        assert!(is_debug_enabled_for_tag(&everything, &LogTag::Simulator));
    }

    #[test]
    fn test_debug_all() {
        let config = config_from_args(&args(&["bin", "--debug-all"]));
        for key in DEBUG_KEYS {
            assert!(config.debug_tags.contains(*key));
        }
    }
}
