use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `TDL_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` holding `.tdl/`
/// 3. Nearest ancestor holding `docs/`
/// 4. Nearest ancestor holding `.git/`
/// 5. `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    for marker in [tdl_core::paths::TDL_DIR, tdl_core::paths::DEFAULT_DOCS_DIR, ".git"] {
        if let Some(found) = find_upward(start, marker) {
            return found;
        }
    }
    start.to_path_buf()
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
