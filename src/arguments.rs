/// Centralized argument handling for the realtime client binaries
///
/// Stores the process arguments once and answers flag/value queries from
/// anywhere in the crate (logger filtering, main entry point, tools).
///
/// Features:
/// - CMD_ARGS storage with thread-safe access
/// - Debug flag checks per subsystem (`--debug-<module>`)
/// - Value lookup for `--flag value` pairs
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Tests and tools may override it through `set_cmd_args`
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Debug keys understood by the logger (`--debug-<key>`)
pub const DEBUG_KEYS: &[&str] = &[
    "system",
    "realtime",
    "transport",
    "reconnect",
    "simulator",
    "registry",
    "health",
    "config",
];

/// Sets the global command-line arguments
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value following a flag (`--config data/realtime.toml`)
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

/// Collects every value given for a repeatable flag (`--topic a --topic b`)
pub fn get_arg_values(flag: &str) -> Vec<String> {
    let args = get_cmd_args();
    args.windows(2)
        .filter(|pair| pair[0] == flag && !pair[1].starts_with("--"))
        .map(|pair| pair[1].clone())
        .collect()
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Enables every debug tag at once
pub fn is_debug_all_enabled() -> bool {
    has_arg("--debug-all")
}

/// Facade and dispatch debug mode
pub fn is_debug_realtime_enabled() -> bool {
    has_arg("--debug-realtime") || is_debug_all_enabled()
}

/// Live socket debug mode
pub fn is_debug_transport_enabled() -> bool {
    has_arg("--debug-transport") || is_debug_all_enabled()
}

/// Simulated transport debug mode
pub fn is_debug_simulator_enabled() -> bool {
    has_arg("--debug-simulator") || is_debug_all_enabled()
}

/// Verbose mode (very detailed tracing)
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Quiet mode (warnings and errors only)
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

/// Returns the list of debug keys currently enabled on the command line
pub fn get_enabled_debug_modes() -> Vec<String> {
    if is_debug_all_enabled() {
        return DEBUG_KEYS.iter().map(|k| k.to_string()).collect();
    }
    DEBUG_KEYS
        .iter()
        .filter(|key| has_arg(&format!("--debug-{}", key)))
        .map(|key| key.to_string())
        .collect()
}

/// Print enabled debug modes at startup
pub fn print_debug_info() {
    let enabled_modes = get_enabled_debug_modes();
    if !enabled_modes.is_empty() {
        println!("Enabled debug modes: {:?}", enabled_modes);
    }
}

// =============================================================================
// COMMON ARGUMENT PATTERNS
// =============================================================================

/// Argument patterns shared by the binaries
pub mod patterns {
    use super::*;

    /// Checks for help flags
    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }

    /// Checks for version flags
    pub fn is_version_requested() -> bool {
        has_arg("--version") || has_arg("-V")
    }
}

/// Print usage for the main binary
pub fn print_help() {
    println!("procureflow-realtime {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    procureflow-realtime [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <PATH>          Configuration file (default: data/realtime.toml)");
    println!("    --topic <TOPIC>          Topic to follow (repeatable, default: all topics)");
    println!("    --simulated              Start on the simulated transport");
    println!("    --send <DESTINATION>     Send one message once connected");
    println!("    --payload <JSON>         Payload for --send (default: {{}})");
    println!("    --duration-secs <N>      Exit after N seconds");
    println!("    --quiet                  Only warnings and errors");
    println!("    --verbose                Very detailed output");
    println!("    --debug-<module>         Debug output for one module:");
    println!("                             {}", DEBUG_KEYS.join(", "));
    println!("    --debug-all              Debug output for every module");
    println!("    -h, --help               Print this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the shared CMD_ARGS is not raced by parallel tests
    #[test]
    fn test_argument_queries() {
        set_cmd_args(
            vec![
                "procureflow-realtime",
                "--config",
                "custom.toml",
                "--topic",
                "approvals",
                "--topic",
                "workflow",
                "--debug-transport",
                "--send",
                "--quiet",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        assert!(has_arg("--quiet"));
        assert_eq!(get_arg_value("--config"), Some("custom.toml".to_string()));
        assert_eq!(get_arg_value("--send"), None);
        assert_eq!(get_arg_value("--missing"), None);
        assert_eq!(get_arg_values("--topic"), vec!["approvals", "workflow"]);
        assert!(is_debug_transport_enabled());
        assert!(!is_debug_simulator_enabled());
        assert_eq!(get_enabled_debug_modes(), vec!["transport".to_string()]);

        set_cmd_args(vec!["procureflow-realtime".to_string(), "--debug-all".to_string()]);
        assert_eq!(get_enabled_debug_modes().len(), DEBUG_KEYS.len());

        set_cmd_args(vec!["procureflow-realtime".to_string()]);
    }
}
