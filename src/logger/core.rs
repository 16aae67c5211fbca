/// Core logging implementation with automatic filtering
use super::config::{
    get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag, LoggerConfig,
};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Debug requires --debug-<module> (or --verbose) for that tag
/// 3. Verbose requires --verbose or --verbose-<module>
/// 4. Warning/Info respect the minimum level (--quiet drops Info)
/// 5. If enabled_tags is non-empty, the tag must be in the set
pub fn should_log(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    match level {
        LogLevel::Error => return true,
        LogLevel::Debug => return is_debug_enabled_for_tag(config, tag),
        LogLevel::Verbose => return is_verbose_enabled_for_tag(config, tag),
        LogLevel::Warning | LogLevel::Info => {}
    }

    if level > config.min_level {
        return false;
    }

    config.enabled_tags.is_empty() || config.enabled_tags.contains(&tag.to_debug_key())
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    let config = get_logger_config();
    if !should_log(&config, &tag, level) {
        return;
    }

    super::format::format_and_log(&tag, level, message, config.use_colors);
}
