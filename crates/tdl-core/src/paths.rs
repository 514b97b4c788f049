use crate::types::DocType;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TDL_DIR: &str = ".tdl";
pub const CONFIG_FILE: &str = ".tdl/config.yaml";
pub const DEFAULT_DOCS_DIR: &str = "docs";

pub const ARCHIVE_DIR: &str = "archive";
pub const TEMPLATES_DIR: &str = "templates";
pub const README_MD: &str = "README.md";

pub const TASK_DESIGN_MD: &str = "design.md";
pub const TASK_PLAN_MD: &str = "plan.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn type_dir(docs_dir: &Path, doc_type: DocType) -> PathBuf {
    docs_dir.join(doc_type.dir_name())
}

pub fn archive_dir(docs_dir: &Path, doc_type: DocType) -> PathBuf {
    type_dir(docs_dir, doc_type).join(ARCHIVE_DIR)
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static DASHES_RE: OnceLock<Regex> = OnceLock::new();

fn dashes_re() -> &'static Regex {
    DASHES_RE.get_or_init(|| Regex::new(r"-{2,}").unwrap())
}

/// Turn a free-form title into a filename slug: lower-case ASCII
/// alphanumerics joined by single hyphens.
pub fn slugify(title: &str) -> String {
    let raw: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    dashes_re().replace_all(&raw, "-").trim_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("User Authentication"), "user-authentication");
        assert_eq!(slugify("  API -- Response Time! "), "api-response-time");
        assert_eq!(slugify("Use {braces} & symbols"), "use-braces-symbols");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn path_helpers() {
        let docs = Path::new("/tmp/proj/docs");
        assert_eq!(
            type_dir(docs, DocType::Requirement),
            PathBuf::from("/tmp/proj/docs/requirements")
        );
        assert_eq!(
            archive_dir(docs, DocType::Adr),
            PathBuf::from("/tmp/proj/docs/adr/archive")
        );
        assert_eq!(
            config_path(Path::new("/tmp/proj")),
            PathBuf::from("/tmp/proj/.tdl/config.yaml")
        );
    }
}
