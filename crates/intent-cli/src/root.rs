use intent_core::paths::{CLAUDE_COMMANDS_DIR, INTENT_DIR};
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `INTENT_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` containing `.intent/` or `.claude/commands/`
/// 3. Nearest ancestor of `cwd` containing `.git/`
/// 4. `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    let markers: [&[&str]; 2] = [&[INTENT_DIR, CLAUDE_COMMANDS_DIR], &[".git"]];
    for names in markers {
        if let Some(dir) = start
            .ancestors()
            .find(|dir| names.iter().any(|n| dir.join(n).is_dir()))
        {
            return dir.to_path_buf();
        }
    }
    start.to_path_buf()
}
