use crate::document::{Document, Placement};
use crate::error::{Result, TdlError};
use crate::paths;
use crate::types::{DocId, DocType, Prefix};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static DOC_NAME_RE: OnceLock<Regex> = OnceLock::new();

// `FR-a3bf2-topic.md`, `ADR-d6ef0.md`, `T-e7fa1-topic` (task dirs), and
// id-named files of any other extension.
fn doc_name_re() -> &'static Regex {
    DOC_NAME_RE.get_or_init(|| {
        Regex::new(r"^(?i)(AN|FR|NFR|ADR|T)-([0-9a-z]{5})(?:[-.][^/]*)?$").unwrap()
    })
}

/// Parse a document file or task directory name into its prefix and id.
pub fn parse_doc_name(name: &str) -> Option<(Prefix, DocId)> {
    let stem = name.strip_suffix(".md").unwrap_or(name);
    let caps = doc_name_re().captures(stem)?;
    let prefix: Prefix = caps[1].parse().ok()?;
    Some((prefix, DocId::new(prefix.as_str(), &caps[2])))
}

/// Load every TDL document under `docs_dir`: live documents from each type
/// directory and archived ones from its `archive/` subdirectory. Entries not
/// named by an id (READMEs, templates) are ignored. Id-named entries in the
/// wrong directory or of the wrong shape are still loaded, with `placement`
/// set.
///
/// Output is sorted by id, then path.
pub fn load_documents(docs_dir: &Path) -> Result<Vec<Document>> {
    if !docs_dir.is_dir() {
        return Err(TdlError::DocsNotFound(docs_dir.to_path_buf()));
    }
    let mut docs = Vec::new();
    for &doc_type in DocType::all() {
        let live = paths::type_dir(docs_dir, doc_type);
        load_type_dir(&live, doc_type, false, &mut docs)?;
        let archive = paths::archive_dir(docs_dir, doc_type);
        load_type_dir(&archive, doc_type, true, &mut docs)?;
    }
    docs.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.path.cmp(&b.path)));
    tracing::debug!(dir = %docs_dir.display(), count = docs.len(), "loaded documents");
    Ok(docs)
}

/// Rewrite document paths relative to `root` for display.
pub fn relativize(docs: &mut [Document], root: &Path) {
    for doc in docs {
        if let Ok(rel) = doc.path.strip_prefix(root) {
            doc.path = rel.to_path_buf();
        }
    }
}

fn load_type_dir(
    dir: &Path,
    doc_type: DocType,
    archived: bool,
    out: &mut Vec<Document>,
) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some((prefix, id)) = parse_doc_name(&name) else {
            continue;
        };
        let path = entry.path();
        let is_dir = entry.file_type()?.is_dir();
        let is_md = !is_dir && name.ends_with(".md");
        let mut doc = match (prefix.doc_type(), is_dir, is_md) {
            (DocType::Task, true, _) => Document::load_task_dir(id, &path),
            (DocType::Task, false, true) => {
                let mut task = Document::load(prefix, id, &path);
                task.placement = Some(Placement::SingleFileTask);
                task
            }
            (_, false, true) => Document::load(prefix, id, &path),
            _ => Document::unparsed(prefix, id, &path),
        };
        if prefix.doc_type() != doc_type && doc.placement != Some(Placement::NotMarkdown) {
            tracing::debug!(file = %name, dir = %dir.display(), "document in wrong directory");
            doc.placement = Some(Placement::Misplaced {
                dir: doc_type.dir_name().to_string(),
            });
        }
        doc.archived = archived;
        out.push(doc);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
