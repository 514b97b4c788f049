//! Find every mention of a TDL id (or free-text term) across documentation,
//! source code, tests and git history.

use crate::error::Result;
use crate::io::read_lossy;
use crate::paths;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extensions searched as source code.
pub const SOURCE_EXTENSIONS: &[&str] = &["rs", "py", "js", "ts", "java", "go"];

/// Directory names never descended into.
pub const SKIP_DIRS: &[&str] = &[".git", "target", "node_modules", paths::TDL_DIR];

#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Treat the query as a literal instead of a regex.
    pub search_term: bool,
    /// Also search commit messages with `git log`.
    pub git: bool,
    /// Docs tree, relative to the root.
    pub docs_dir: String,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            search_term: false,
            git: true,
            docs_dir: paths::DEFAULT_DOCS_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    /// Relative to the root.
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl std::fmt::Display for Hit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceResult {
    pub query: String,
    pub documentation: Vec<Hit>,
    pub source: Vec<Hit>,
    pub tests: Vec<Hit>,
    pub commits: Vec<String>,
    /// `false` when git was requested but not found on `PATH`.
    pub git_available: bool,
}

impl TraceResult {
    pub fn total(&self) -> usize {
        self.documentation.len() + self.source.len() + self.tests.len() + self.commits.len()
    }
}

/// Case-insensitive matcher for `query`. A query that is not a valid regex
/// is matched literally.
pub fn query_regex(query: &str, literal: bool) -> Result<Regex> {
    let build = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
    if literal {
        return Ok(build(&regex::escape(query))?);
    }
    match build(query) {
        Ok(re) => Ok(re),
        Err(e) => {
            tracing::debug!(query, error = %e, "query is not a regex, matching literally");
            Ok(build(&regex::escape(query))?)
        }
    }
}

pub fn trace_references(root: &Path, query: &str, opts: &TraceOptions) -> Result<TraceResult> {
    let re = query_regex(query, opts.search_term)?;
    let docs_dir = root.join(&opts.docs_dir);

    let mut documentation = Vec::new();
    for file in markdown_files(root, &docs_dir)? {
        search_file(root, &file, &re, &mut documentation);
    }

    let mut source = Vec::new();
    let mut tests = Vec::new();
    let mut files = Vec::new();
    walk(root, &mut files)?;
    for file in files {
        let Some(ext) = file.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }
        let is_test = file
            .file_name()
            .is_some_and(|n| n.to_string_lossy().to_ascii_lowercase().contains("test"));
        let bucket = if is_test { &mut tests } else { &mut source };
        search_file(root, &file, &re, bucket);
    }

    let (commits, git_available) = if opts.git {
        match which::which("git") {
            Ok(git) => (git_log(&git, root, query, opts.search_term), true),
            Err(_) => {
                tracing::debug!("git not found on PATH, skipping commit history");
                (Vec::new(), false)
            }
        }
    } else {
        (Vec::new(), true)
    };

    Ok(TraceResult {
        query: query.to_string(),
        documentation,
        source,
        tests,
        commits,
        git_available,
    })
}

/// Markdown under the docs tree plus the root's own `*.md` files.
fn markdown_files(root: &Path, docs_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if docs_dir.is_dir() {
        let mut all = Vec::new();
        walk(docs_dir, &mut all)?;
        out.extend(all.into_iter().filter(|p| is_markdown(p)));
    }
    let mut top: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_markdown(p))
        .collect();
    top.sort();
    out.extend(top);
    Ok(out)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

/// Every file under `dir`, sorted, skipping [`SKIP_DIRS`].
fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let Ok(ft) = entry.file_type() else {
            continue;
        };
        if ft.is_dir() {
            let name = entry.file_name();
            if SKIP_DIRS.iter().any(|s| name == *s) {
                continue;
            }
            walk(&path, out)?;
        } else if ft.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn search_file(root: &Path, file: &Path, re: &Regex, hits: &mut Vec<Hit>) {
    let text = match read_lossy(file) {
        Ok((text, _)) => text,
        Err(e) => {
            tracing::debug!(path = %file.display(), error = %e, "skipping unreadable file");
            return;
        }
    };
    let rel = file.strip_prefix(root).unwrap_or(file).to_path_buf();
    for (i, line) in text.lines().enumerate() {
        if re.is_match(line) {
            hits.push(Hit {
                path: rel.clone(),
                line: i + 1,
                text: line.trim_end().to_string(),
            });
        }
    }
}

fn git_log(git: &Path, root: &Path, query: &str, literal: bool) -> Vec<String> {
    let mut cmd = std::process::Command::new(git);
    cmd.args(["log", "--all", "--oneline", "--regexp-ignore-case"]);
    if literal {
        cmd.arg("--fixed-strings");
    }
    cmd.arg("--grep").arg(query).current_dir(root);

    match cmd.output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Ok(out) => {
            tracing::debug!(
                status = %out.status,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "git log failed"
            );
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to run git");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn no_git() -> TraceOptions {
        TraceOptions {
            git: false,
            ..TraceOptions::default()
        }
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "README.md", "See FR-a3bf2 for login.\n");
        write(
            root,
            "docs/requirements/FR-a3bf2-login.md",
            "# Login\n- **ID**: FR-a3bf2\n",
        );
        write(
            root,
            "docs/tasks/T-e7fa1-login/plan.md",
            "- **Requirements**: [fr-A3BF2]\n",
        );
        write(root, "src/auth.rs", "// Implements FR-a3bf2\nfn login() {}\n");
        write(root, "src/auth_test.py", "# covers FR-a3bf2\n");
        write(root, "target/debug/gen.rs", "// FR-a3bf2\n");
        write(root, "notes.txt", "FR-a3bf2\n");
        dir
    }

    #[test]
    fn finds_docs_source_and_tests() {
        let dir = fixture();
        let result = trace_references(dir.path(), "FR-a3bf2", &no_git()).unwrap();

        let docs: Vec<_> = result.documentation.iter().map(|h| h.to_string()).collect();
        assert_eq!(
            docs,
            [
                "docs/requirements/FR-a3bf2-login.md:2:- **ID**: FR-a3bf2",
                "docs/tasks/T-e7fa1-login/plan.md:1:- **Requirements**: [fr-A3BF2]",
                "README.md:1:See FR-a3bf2 for login.",
            ]
        );
        assert_eq!(result.source.len(), 1);
        assert_eq!(result.source[0].path, PathBuf::from("src/auth.rs"));
        assert_eq!(result.tests.len(), 1);
        assert_eq!(result.tests[0].path, PathBuf::from("src/auth_test.py"));
        assert!(result.commits.is_empty());
        assert_eq!(result.total(), 5);
    }

    #[test]
    fn search_term_is_literal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "docs/a.md", "cost is 5.00 (approx)\ncost is 5x00\n");
        let opts = TraceOptions {
            search_term: true,
            ..no_git()
        };
        let result = trace_references(dir.path(), "5.00 (approx)", &opts).unwrap();
        assert_eq!(result.documentation.len(), 1);
        assert_eq!(result.documentation[0].line, 1);
    }

    #[test]
    fn invalid_regex_falls_back_to_literal() {
        let re = query_regex("FR-(", false).unwrap();
        assert!(re.is_match("see fr-( here"));
    }

    #[test]
    fn missing_docs_dir_still_searches_code() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/x.go", "// ADR-d6ef0\n");
        let result = trace_references(dir.path(), "ADR-d6ef0", &no_git()).unwrap();
        assert!(result.documentation.is_empty());
        assert_eq!(result.source.len(), 1);
    }
}
