use crate::error::{Result, TdlError};
use crate::ident;
use crate::io;
use crate::paths;
use crate::templates;
use crate::types::{DocId, DocType, Prefix};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What to create. Titles are free text; the filename slug is derived.
#[derive(Debug, Clone)]
pub enum NewDocument {
    Analysis {
        title: String,
    },
    Requirement {
        title: String,
        /// `Fr` or `Nfr`.
        prefix: Prefix,
        category: String,
    },
    Adr {
        title: String,
        lite: bool,
    },
    Task {
        /// Topic, e.g. `implement-user-auth`; also the title source.
        topic: String,
        requirements: Vec<DocId>,
    },
}

impl NewDocument {
    pub fn prefix(&self) -> Prefix {
        match self {
            NewDocument::Analysis { .. } => Prefix::An,
            NewDocument::Requirement { prefix, .. } => *prefix,
            NewDocument::Adr { .. } => Prefix::Adr,
            NewDocument::Task { .. } => Prefix::T,
        }
    }

    fn title_source(&self) -> &str {
        match self {
            NewDocument::Analysis { title }
            | NewDocument::Requirement { title, .. }
            | NewDocument::Adr { title, .. } => title,
            NewDocument::Task { topic, .. } => topic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub id: DocId,
    pub doc_type: DocType,
    pub type_name: String,
    pub title: String,
    /// The markdown file, or the task directory.
    pub path: PathBuf,
    /// Every file written.
    pub files: Vec<PathBuf>,
}

/// Parse a comma- or whitespace-separated list of requirement ids.
pub fn parse_requirement_ids(raw: &str) -> Result<Vec<DocId>> {
    let mut ids = Vec::new();
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = DocId::parse(part)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// `implement-user-auth` -> `Implement User Auth`.
pub fn title_from_topic(topic: &str) -> String {
    topic
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Write a new document under `docs_dir` with a freshly generated id.
///
/// The id is checked against every id-shaped name already under `docs_dir`;
/// the write itself refuses to replace an existing file.
pub fn create_document(docs_dir: &Path, new: &NewDocument) -> Result<Created> {
    let prefix = new.prefix();
    if let NewDocument::Requirement { prefix: p, .. } = new {
        if p.doc_type() != DocType::Requirement {
            return Err(TdlError::InvalidKind {
                what: "requirement kind",
                value: p.to_string(),
                expected: "fr, nfr",
            });
        }
    }

    let slug = paths::slugify(new.title_source());
    if slug.is_empty() {
        return Err(TdlError::InvalidKind {
            what: "title",
            value: new.title_source().to_string(),
            expected: "at least one letter or digit",
        });
    }

    let existing = ident::existing_payloads(docs_dir)?;
    let id = DocId::parse(&ident::generate_id(Some(prefix.as_str()), &existing)?)?;
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let type_dir = paths::type_dir(docs_dir, prefix.doc_type());
    let name = format!("{id}-{slug}");

    let created = match new {
        NewDocument::Analysis { title } => {
            let path = type_dir.join(format!("{name}.md"));
            write_new(&path, &templates::analysis(id.as_str(), title, &date))?;
            single(id, prefix, title, path)
        }
        NewDocument::Requirement {
            title, category, ..
        } => {
            let path = type_dir.join(format!("{name}.md"));
            let body = templates::requirement(prefix, id.as_str(), title, category, &date);
            write_new(&path, &body)?;
            single(id, prefix, title, path)
        }
        NewDocument::Adr { title, lite } => {
            let path = type_dir.join(format!("{name}.md"));
            write_new(&path, &templates::adr(id.as_str(), title, &date, *lite))?;
            single(id, prefix, title, path)
        }
        NewDocument::Task {
            topic,
            requirements,
        } => {
            let dir = type_dir.join(&name);
            if dir.exists() {
                return Err(TdlError::DocumentExists(dir.display().to_string()));
            }
            let title = title_from_topic(topic);
            let links = if requirements.is_empty() {
                templates::NO_REQUIREMENTS.to_string()
            } else {
                requirements
                    .iter()
                    .map(|r| format!("[{r}]"))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let design = dir.join(paths::TASK_DESIGN_MD);
            let plan = dir.join(paths::TASK_PLAN_MD);
            write_new(&design, &templates::task_design(id.as_str(), &title, &links, &date))?;
            write_new(&plan, &templates::task_plan(id.as_str(), &title, &links, &date))?;
            Created {
                id,
                doc_type: DocType::Task,
                type_name: prefix.type_name().to_string(),
                title,
                path: dir,
                files: vec![design, plan],
            }
        }
    };

    tracing::debug!(id = %created.id, path = %created.path.display(), "created document");
    Ok(created)
}

fn single(id: DocId, prefix: Prefix, title: &str, path: PathBuf) -> Created {
    Created {
        id,
        doc_type: prefix.doc_type(),
        type_name: prefix.type_name().to_string(),
        title: title.to_string(),
        files: vec![path.clone()],
        path,
    }
}

fn write_new(path: &Path, body: &str) -> Result<()> {
    if path.exists() {
        return Err(TdlError::DocumentExists(path.display().to_string()));
    }
    io::create_new(path, body.as_bytes()).map_err(|e| match e {
        TdlError::Io(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            TdlError::DocumentExists(path.display().to_string())
        }
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
