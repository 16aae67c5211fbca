/// Log tags identify the subsystem a message comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Realtime,
    Transport,
    Reconnect,
    Simulator,
    Registry,
    Health,
    Config,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(name) => name.to_lowercase(),
            other => other.to_plain_string().to_lowercase(),
        }
    }

    /// Uppercase name shown in the tag column
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Realtime => "REALTIME".to_string(),
            LogTag::Transport => "TRANSPORT".to_string(),
            LogTag::Reconnect => "RECONNECT".to_string(),
            LogTag::Simulator => "SIMULATOR".to_string(),
            LogTag::Registry => "REGISTRY".to_string(),
            LogTag::Health => "HEALTH".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
