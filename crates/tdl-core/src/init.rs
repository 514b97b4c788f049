use crate::config::Config;
use crate::error::Result;
use crate::io;
use crate::paths;
use crate::templates;
use crate::types::DocType;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitAction {
    Created,
    Exists,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitEntry {
    /// Relative to the project root.
    pub path: PathBuf,
    pub action: InitAction,
}

/// Lay out the docs tree, READMEs, blank templates and `.tdl/config.yaml`
/// under `root`. Existing files are left untouched, so running it again is
/// harmless.
pub fn init_docs(root: &Path) -> Result<Vec<InitEntry>> {
    let mut entries = Vec::new();

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        entries.push(entry(paths::CONFIG_FILE, InitAction::Exists));
        Config::load(root)?
    } else {
        let cfg = Config::default();
        cfg.save(root)?;
        entries.push(entry(paths::CONFIG_FILE, InitAction::Created));
        cfg
    };
    let docs_rel = PathBuf::from(&config.docs_dir);
    let docs = root.join(&docs_rel);

    let mut dirs: Vec<PathBuf> = Vec::new();
    for &doc_type in DocType::all() {
        dirs.push(docs_rel.join(doc_type.dir_name()));
        if doc_type != DocType::Requirement {
            dirs.push(docs_rel.join(doc_type.dir_name()).join(paths::ARCHIVE_DIR));
        }
    }
    dirs.push(docs_rel.join(paths::TEMPLATES_DIR));

    for rel in dirs {
        let abs = root.join(&rel);
        let action = if abs.is_dir() {
            InitAction::Exists
        } else {
            io::ensure_dir(&abs)?;
            InitAction::Created
        };
        entries.push(InitEntry { path: rel, action });
    }

    for &doc_type in DocType::all() {
        let rel = docs_rel.join(doc_type.dir_name()).join(paths::README_MD);
        let written = io::write_if_missing(&root.join(&rel), templates::readme(doc_type).as_bytes())?;
        entries.push(InitEntry {
            path: rel,
            action: action_for(written),
        });
    }

    for (name, body) in templates::blank_templates() {
        let rel = docs_rel.join(paths::TEMPLATES_DIR).join(name);
        let written = io::write_if_missing(&root.join(&rel), body.as_bytes())?;
        entries.push(InitEntry {
            path: rel,
            action: action_for(written),
        });
    }

    tracing::debug!(
        docs = %docs.display(),
        created = entries.iter().filter(|e| e.action == InitAction::Created).count(),
        "initialized docs tree"
    );
    Ok(entries)
}

fn entry(path: &str, action: InitAction) -> InitEntry {
    InitEntry {
        path: PathBuf::from(path),
        action,
    }
}

fn action_for(written: bool) -> InitAction {
    if written {
        InitAction::Created
    } else {
        InitAction::Exists
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_layout() {
        let dir = TempDir::new().unwrap();
        let entries = init_docs(dir.path()).unwrap();
        assert!(entries.iter().all(|e| e.action == InitAction::Created));

        for sub in [
            "docs/analysis/archive",
            "docs/requirements",
            "docs/adr/archive",
            "docs/tasks/archive",
            "docs/templates",
        ] {
            assert!(dir.path().join(sub).is_dir(), "missing {sub}");
        }
        assert!(dir.path().join("docs/tasks/README.md").is_file());
        assert!(dir.path().join("docs/templates/adr-lite.md").is_file());
        assert!(paths::config_path(dir.path()).is_file());
    }

    #[test]
    fn second_run_keeps_edits() {
        let dir = TempDir::new().unwrap();
        init_docs(dir.path()).unwrap();
        let readme = dir.path().join("docs/adr/README.md");
        std::fs::write(&readme, "# Our ADRs\n").unwrap();

        let entries = init_docs(dir.path()).unwrap();
        assert!(entries.iter().all(|e| e.action == InitAction::Exists));
        assert_eq!(std::fs::read_to_string(&readme).unwrap(), "# Our ADRs\n");
    }

    #[test]
    fn honours_configured_docs_dir() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            docs_dir: "documentation".to_string(),
            ..Config::default()
        };
        cfg.save(dir.path()).unwrap();
        init_docs(dir.path()).unwrap();
        assert!(dir.path().join("documentation/requirements/README.md").is_file());
        assert!(!dir.path().join("docs").exists());
    }
}
