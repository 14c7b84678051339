use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const INTENT_DIR: &str = ".intent";
pub const CONFIG_FILE: &str = ".intent/config.yaml";
pub const STATE_FILE: &str = ".intent/state.yaml";
pub const EMBEDDING_CACHE_FILE: &str = ".intent/embeddings.json";
pub const AUDIT_LOG_FILE: &str = ".intent/classifications.jsonl";

pub const CLAUDE_COMMANDS_DIR: &str = ".claude/commands";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn commands_dir(root: &Path) -> PathBuf {
    root.join(CLAUDE_COMMANDS_DIR)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// joined onto the project root.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_absolute_paths() {
        let abs = Path::new("/tmp/cache.json");
        assert_eq!(resolve(Path::new("/project"), abs), abs);
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let rel = Path::new(EMBEDDING_CACHE_FILE);
        assert_eq!(
            resolve(Path::new("/project"), rel),
            PathBuf::from("/project/.intent/embeddings.json")
        );
    }
}
