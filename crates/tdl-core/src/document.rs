use crate::io::read_lossy;
use crate::paths;
use crate::types::{DocId, DocType, Prefix};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Link entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LinkValue {
    /// One or more document identifiers (`[FR-a3bf2](...)` or bare `FR-a3bf2`).
    Internal(Vec<DocId>),
    /// Issue number, URL, file link or any other non-identifier text.
    External(String),
    /// `N/A – reason`. `None` when the marker carries no reason.
    NotApplicable(Option<String>),
    /// Category present with nothing after the colon.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEntry {
    pub category: String,
    pub value: LinkValue,
}

static LINK_ID_RE: OnceLock<Regex> = OnceLock::new();

// Upper-case prefixes only, so hyphenated prose ("multi-model") is not read
// as an identifier.
fn link_id_re() -> &'static Regex {
    LINK_ID_RE.get_or_init(|| Regex::new(r"\b([A-Z]+)-([0-9A-Za-z]{5})\b").unwrap())
}

static URL_RE: OnceLock<Regex> = OnceLock::new();
static URL_LINK_RE: OnceLock<Regex> = OnceLock::new();

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://[^\s)\]>]+").unwrap())
}

// `[text](scheme://...)`
fn url_link_re() -> &'static Regex {
    URL_LINK_RE
        .get_or_init(|| Regex::new(r"\[[^\]]*\]\(\s*[A-Za-z][A-Za-z0-9+.-]*://[^)]*\)").unwrap())
}

/// Classify the text after `**Category**:`.
pub fn classify_link(raw: &str) -> LinkValue {
    let value = raw.trim();
    if value.is_empty() {
        return LinkValue::Empty;
    }
    if value.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("n/a")) {
        let reason = value[3..]
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '–' | '—' | '-' | ':'))
            .trim();
        return LinkValue::NotApplicable((!reason.is_empty()).then(|| reason.to_string()));
    }

    // Absolute URLs, and markdown links pointing at one, never name a document.
    let local = url_link_re().replace_all(value, " ");
    let local = url_re().replace_all(&local, " ");

    let mut ids: Vec<DocId> = Vec::new();
    for caps in link_id_re().captures_iter(&local) {
        let id = DocId::new(&caps[1], &caps[2]);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        LinkValue::External(value.to_string())
    } else {
        LinkValue::Internal(ids)
    }
}

// ---------------------------------------------------------------------------
// Markdown extraction
// ---------------------------------------------------------------------------

/// The parts of a TDL markdown file the scanner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownParts {
    pub title: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
    pub links: Option<Vec<LinkEntry>>,
}

static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_RE: OnceLock<Regex> = OnceLock::new();
static H2_RE: OnceLock<Regex> = OnceLock::new();

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t\r]*$").unwrap())
}

fn field_re() -> &'static Regex {
    FIELD_RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]+\*\*([^*]+)\*\*:(.*)$").unwrap())
}

fn h2_re() -> &'static Regex {
    H2_RE.get_or_init(|| Regex::new(r"(?m)^##[ \t]+(.+?)[ \t\r]*$").unwrap())
}

/// Body of the `## {heading}` section, up to the next level-2 heading.
pub fn section<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let mut headings = h2_re().captures_iter(content);
    while let Some(caps) = headings.next() {
        if !caps[1].eq_ignore_ascii_case(heading) {
            continue;
        }
        let start = caps.get(0).map_or(0, |m| m.end());
        let end = headings
            .next()
            .and_then(|c| c.get(0))
            .map_or(content.len(), |m| m.start());
        return Some(&content[start..end]);
    }
    None
}

/// `- **Key**: value` bullets in order of appearance.
pub fn bullet_fields(section: &str) -> Vec<(String, String)> {
    field_re()
        .captures_iter(section)
        .map(|c| (c[1].trim().to_string(), c[2].trim().to_string()))
        .collect()
}

pub fn parse_markdown(content: &str) -> MarkdownParts {
    let title = title_re()
        .captures(content)
        .map(|c| c[1].to_string());

    let metadata = section(content, "Metadata").map(|body| {
        bullet_fields(body)
            .into_iter()
            .collect::<BTreeMap<_, _>>()
    });

    let links = section(content, "Links").map(|body| {
        bullet_fields(body)
            .into_iter()
            .map(|(category, value)| LinkEntry {
                value: classify_link(&value),
                category,
            })
            .collect::<Vec<_>>()
    });

    MarkdownParts {
        title,
        metadata,
        links,
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

pub const UNKNOWN_STATUS: &str = "Unknown";

/// How an id-named entry deviates from the docs tree layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Found under another type's directory.
    Misplaced { dir: String },
    /// A task written as one markdown file instead of a directory.
    SingleFileTask,
    /// Not a markdown file (or a directory where a file belongs). Never parsed.
    NotMarkdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocId,
    pub doc_type: DocType,
    pub prefix: Prefix,
    pub title: String,
    pub status: String,
    pub path: PathBuf,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl Document {
    /// Build a document from markdown text already in memory.
    pub fn parse(prefix: Prefix, id: DocId, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let parts = parse_markdown(content);
        let status = parts
            .metadata
            .as_ref()
            .and_then(|m| m.get("Status"))
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
        let title = parts.title.unwrap_or_else(|| file_label(&path));
        Self {
            id,
            doc_type: prefix.doc_type(),
            prefix,
            title,
            status,
            path,
            archived: false,
            metadata: parts.metadata,
            links: parts.links,
            read_error: None,
            placement: None,
        }
    }

    /// Read and parse a single-file document. Read failures are recorded on
    /// the document rather than returned, so the scanner can report them.
    pub fn load(prefix: Prefix, id: DocId, path: &Path) -> Self {
        match read_lossy(path) {
            Ok((content, lossy)) => {
                let mut doc = Self::parse(prefix, id, path, &content);
                if lossy {
                    tracing::warn!(path = %path.display(), "document is not valid UTF-8");
                    doc.read_error = Some("file is not valid UTF-8".to_string());
                }
                doc
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read document");
                Self::unreadable(prefix, id, path, e.to_string())
            }
        }
    }

    /// Synthesise a task document from a `T-xxxxx-topic/` directory by
    /// merging its `design.md` and `plan.md`. The plan's status wins when it
    /// is known.
    pub fn load_task_dir(id: DocId, dir: &Path) -> Self {
        let mut task = Self {
            id: id.clone(),
            doc_type: DocType::Task,
            prefix: Prefix::T,
            title: file_label(dir),
            status: UNKNOWN_STATUS.to_string(),
            path: dir.to_path_buf(),
            archived: false,
            metadata: None,
            links: None,
            read_error: None,
            placement: None,
        };
        let mut titled = false;

        for name in [paths::TASK_DESIGN_MD, paths::TASK_PLAN_MD] {
            let file = dir.join(name);
            if !file.is_file() {
                continue;
            }
            let part = Self::load(Prefix::T, id.clone(), &file);
            if let Some(err) = part.read_error {
                task.read_error = Some(format!("{name}: {err}"));
            }
            if !titled && part.title != file_label(&file) {
                task.title = strip_title_suffix(&part.title).to_string();
                titled = true;
            }
            if part.status != UNKNOWN_STATUS {
                task.status = part.status;
            }
            if let Some(meta) = part.metadata {
                task.metadata.get_or_insert_with(BTreeMap::new).extend(meta);
            }
            if let Some(links) = part.links {
                let merged = task.links.get_or_insert_with(Vec::new);
                for entry in links {
                    if !merged.contains(&entry) {
                        merged.push(entry);
                    }
                }
            }
        }
        task
    }

    fn unreadable(prefix: Prefix, id: DocId, path: &Path, error: String) -> Self {
        Self {
            id,
            doc_type: prefix.doc_type(),
            prefix,
            title: file_label(path),
            status: UNKNOWN_STATUS.to_string(),
            path: path.to_path_buf(),
            archived: false,
            metadata: None,
            links: None,
            read_error: Some(error),
            placement: None,
        }
    }

    /// Placeholder for an id-named entry that cannot be parsed as a
    /// document, so it still counts.
    pub fn unparsed(prefix: Prefix, id: DocId, path: &Path) -> Self {
        Self {
            id,
            doc_type: prefix.doc_type(),
            prefix,
            title: file_label(path),
            status: UNKNOWN_STATUS.to_string(),
            path: path.to_path_buf(),
            archived: false,
            metadata: None,
            links: None,
            read_error: None,
            placement: Some(Placement::NotMarkdown),
        }
    }

    /// Entries of the Links section (empty when the section is missing).
    pub fn link_entries(&self) -> &[LinkEntry] {
        self.links.as_deref().unwrap_or(&[])
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Task files title themselves "Topic - Design" / "Topic - Implementation Plan".
fn strip_title_suffix(title: &str) -> &str {
    title
        .strip_suffix(" - Design")
        .or_else(|| title.strip_suffix(" - Implementation Plan"))
        .unwrap_or(title)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REQUIREMENT: &str = "# User Login\n\n\
## Metadata\n\n\
- **ID**: FR-a3bf2\n\
- **Type**: Functional Requirement\n\
- **Status**: Accepted\n\
- **Date**: 2026-01-05\n\n\
## Links\n\n\
- **Implemented by Tasks**: [T-e7fa1](../tasks/T-e7fa1-login/design.md)\n\
- **Related ADRs**: N/A – no decision needed\n\
- **Issue**: #123\n\
- **PR**:\n\n\
## Requirement Statement\n\n\
- **Not a link**: FR-zzzzz\n";

    #[test]
    fn classify_values() {
        assert_eq!(
            classify_link("[FR-00001](../requirements/FR-00001-login.md)"),
            LinkValue::Internal(vec![DocId::parse("FR-00001").unwrap()])
        );
        assert_eq!(
            classify_link("FR-a3bf2, NFR-c5de9"),
            LinkValue::Internal(vec![
                DocId::parse("FR-a3bf2").unwrap(),
                DocId::parse("NFR-c5de9").unwrap()
            ])
        );
        assert_eq!(classify_link("#42"), LinkValue::External("#42".into()));
        assert_eq!(
            classify_link("https://github.com/o/r/pull/7"),
            LinkValue::External("https://github.com/o/r/pull/7".into())
        );
        assert_eq!(
            classify_link("N/A – not yet implemented"),
            LinkValue::NotApplicable(Some("not yet implemented".into()))
        );
        assert_eq!(
            classify_link("N/A - [FR-xxxxx]"),
            LinkValue::NotApplicable(Some("[FR-xxxxx]".into()))
        );
        assert_eq!(classify_link("n/a"), LinkValue::NotApplicable(None));
        assert_eq!(classify_link("   "), LinkValue::Empty);
    }

    #[test]
    fn hyphenated_prose_is_external() {
        assert_eq!(
            classify_link("multi-model review"),
            LinkValue::External("multi-model review".into())
        );
    }

    #[test]
    fn urls_never_name_documents() {
        let jira = "https://jira.example.com/browse/PROJ-12345";
        assert_eq!(classify_link(jira), LinkValue::External(jira.into()));

        let md = "[PROJ-12345](https://jira.example.com/browse/PROJ-12345)";
        assert_eq!(classify_link(md), LinkValue::External(md.into()));

        assert_eq!(
            classify_link("[FR-00001](../FR-00001.md), see ftp://host/ADR-00009"),
            LinkValue::Internal(vec![DocId::parse("FR-00001").unwrap()])
        );
    }

    #[test]
    fn parse_sections() {
        let parts = parse_markdown(REQUIREMENT);
        assert_eq!(parts.title.as_deref(), Some("User Login"));

        let meta = parts.metadata.unwrap();
        assert_eq!(meta["ID"], "FR-a3bf2");
        assert_eq!(meta["Status"], "Accepted");

        let links = parts.links.unwrap();
        assert_eq!(links.len(), 4);
        assert_eq!(links[0].category, "Implemented by Tasks");
        assert_eq!(
            links[0].value,
            LinkValue::Internal(vec![DocId::parse("T-e7fa1").unwrap()])
        );
        assert_eq!(links[3].category, "PR");
        assert_eq!(links[3].value, LinkValue::Empty);
    }

    #[test]
    fn missing_sections_are_none() {
        let parts = parse_markdown("# Only a title\n\nSome text.\n");
        assert!(parts.metadata.is_none());
        assert!(parts.links.is_none());
    }

    #[test]
    fn level_three_headings_stay_in_section() {
        let md = "## Links\n- **A**: #1\n### Sub\n- **B**: #2\n## Next\n- **C**: #3\n";
        let links = parse_markdown(md).links.unwrap();
        let cats: Vec<_> = links.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(cats, ["A", "B"]);
    }

    #[test]
    fn document_parse_reads_status_and_title() {
        let id = DocId::parse("FR-a3bf2").unwrap();
        let doc = Document::parse(Prefix::Fr, id, "docs/requirements/FR-a3bf2-login.md", REQUIREMENT);
        assert_eq!(doc.doc_type, DocType::Requirement);
        assert_eq!(doc.title, "User Login");
        assert_eq!(doc.status, "Accepted");
    }

    #[test]
    fn document_without_status_is_unknown() {
        let id = DocId::parse("AN-00001").unwrap();
        let doc = Document::parse(Prefix::An, id, "AN-00001-x.md", "no headings at all");
        assert_eq!(doc.status, UNKNOWN_STATUS);
        assert_eq!(doc.title, "AN-00001-x.md");
    }

    #[test]
    fn task_dir_merges_design_and_plan() {
        let dir = TempDir::new().unwrap();
        let task_dir = dir.path().join("T-e7fa1-login");
        std::fs::create_dir_all(&task_dir).unwrap();
        std::fs::write(
            task_dir.join("design.md"),
            "# Login - Design\n## Metadata\n- **Status**: Draft\n## Links\n- **Requirements**: [FR-a3bf2]\n",
        )
        .unwrap();
        std::fs::write(
            task_dir.join("plan.md"),
            "# Login - Implementation Plan\n## Metadata\n- **Status**: Phase 1 In Progress\n\
## Links\n- **Requirements**: [FR-a3bf2]\n- **Design**: [design.md](./design.md)\n",
        )
        .unwrap();

        let doc = Document::load_task_dir(DocId::parse("T-e7fa1").unwrap(), &task_dir);
        assert_eq!(doc.title, "Login");
        assert_eq!(doc.status, "Phase 1 In Progress");
        assert_eq!(doc.link_entries().len(), 2);
        assert!(doc.metadata.is_some());
    }

    #[test]
    fn empty_task_dir_has_no_sections() {
        let dir = TempDir::new().unwrap();
        let doc = Document::load_task_dir(DocId::parse("T-00002").unwrap(), dir.path());
        assert!(doc.metadata.is_none());
        assert!(doc.links.is_none());
        assert_eq!(doc.status, UNKNOWN_STATUS);
    }
}
