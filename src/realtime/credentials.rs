/// Bearer-token sources for the live transport handshake
///
/// The token is opaque. It is read at every connection attempt, so a login
/// or logout between attempts takes effect on the next handshake.
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::logger::{self, LogTag};

/// Source of the bearer token attached to the handshake
pub trait CredentialStore: Send + Sync {
    /// Current token, or None to connect unauthenticated
    fn bearer_token(&self) -> Option<String>;
}

/// In-memory token, set at login and cleared at logout
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialStore for MemoryCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().clone().filter(|token| !token.is_empty())
    }
}

/// Token stored in a file (trimmed); missing or empty file means no token
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentials {
    fn bearer_token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                logger::warning(
                    LogTag::Transport,
                    &format!("Failed to read token file '{}': {}", self.path.display(), e),
                );
                None
            }
        }
    }
}

/// Always unauthenticated
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_credentials() {
        let store = MemoryCredentials::new();
        assert_eq!(store.bearer_token(), None);

        store.set_token("abc123");
        assert_eq!(store.bearer_token(), Some("abc123".to_string()));

        store.set_token("");
        assert_eq!(store.bearer_token(), None);

        store.set_token("xyz");
        store.clear();
        assert_eq!(store.bearer_token(), None);
    }

    #[test]
    fn test_file_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  token-from-login  ").unwrap();
        let store = FileCredentials::new(file.path());
        assert_eq!(store.bearer_token(), Some("token-from-login".to_string()));

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(FileCredentials::new(empty.path()).bearer_token(), None);

        assert_eq!(FileCredentials::new("/nonexistent/token").bearer_token(), None);
        assert_eq!(NoCredentials.bearer_token(), None);
    }
}
