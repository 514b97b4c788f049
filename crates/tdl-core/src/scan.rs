//! Traceability scan: structural checks, broken links, orphan detection.
//!
//! The scan is a pure function of the parsed documents and the rules. Every
//! finding is accumulated into the [`Report`]; nothing here fails.

use crate::config::{Direction, Expectation, TraceRules};
use crate::document::{Document, LinkValue, Placement, UNKNOWN_STATUS};
use crate::graph::{Target, TraceGraph};
use crate::types::{DocId, DocType};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    pub document: DocId,
    pub path: PathBuf,
    pub category: String,
    pub target: DocId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub document: DocId,
    pub doc_type: DocType,
    pub title: String,
    pub path: PathBuf,
    /// The unmet expectation, in words.
    pub expectation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    MissingMetadata,
    MissingLinks,
    Unreadable,
    DuplicateId,
    /// Id-named entry under another type's directory.
    Misplaced,
    /// Single-file task, or an id-named entry that is not a markdown file.
    UnexpectedShape,
}

impl DefectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DefectKind::MissingMetadata => "missing Metadata section",
            DefectKind::MissingLinks => "missing Links section",
            DefectKind::Unreadable => "unreadable",
            DefectKind::DuplicateId => "duplicate id",
            DefectKind::Misplaced => "in the wrong directory",
            DefectKind::UnexpectedShape => "unexpected file layout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralDefect {
    pub document: DocId,
    pub path: PathBuf,
    pub kind: DefectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDefectKind {
    /// Required category not present.
    Missing,
    /// Required category present with no value.
    Empty,
    /// `N/A` with no reason.
    UnexplainedAbsence,
}

impl LinkDefectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkDefectKind::Missing => "required category missing",
            LinkDefectKind::Empty => "required category empty",
            LinkDefectKind::UnexplainedAbsence => "N/A without a reason",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDefect {
    pub document: DocId,
    pub path: PathBuf,
    pub category: String,
    pub kind: LinkDefectKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusWarning {
    pub document: DocId,
    pub path: PathBuf,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub doc_type: DocType,
    pub total: usize,
    pub archived: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    /// Live, structurally sound requirements.
    pub requirements: usize,
    /// Of those, the ones referenced by at least one live task.
    pub covered: usize,
    /// `None` when there are no requirements.
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSummary {
    pub id: DocId,
    pub doc_type: DocType,
    pub title: String,
    pub status: String,
    pub path: PathBuf,
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total: usize,
    pub archived: usize,
    pub by_type: Vec<TypeCount>,
    pub coverage: Coverage,
    pub broken_links: Vec<BrokenLink>,
    pub orphans: Vec<Orphan>,
    pub structural_defects: Vec<StructuralDefect>,
    pub link_defects: Vec<LinkDefect>,
    pub status_warnings: Vec<StatusWarning>,
    pub documents: Vec<DocSummary>,
    pub has_gaps: bool,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn has_defects(&self) -> bool {
        !self.structural_defects.is_empty() || !self.link_defects.is_empty()
    }

    pub fn count(&self, doc_type: DocType) -> usize {
        self.by_type
            .iter()
            .find(|c| c.doc_type == doc_type)
            .map_or(0, |c| c.total)
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Check `documents` against `rules`.
///
/// Archived and structurally defective documents are counted and resolve as
/// link targets, but their own links are ignored and they are never orphans.
pub fn scan(documents: &[Document], rules: &TraceRules) -> Report {
    let mut docs: Vec<&Document> = documents.iter().collect();
    docs.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.path.cmp(&b.path)));

    let structural_defects = structural_defects(&docs);
    let defective: Vec<usize> = docs
        .iter()
        .enumerate()
        .filter(|(_, d)| {
            structural_defects
                .iter()
                .any(|s| s.document == d.id && s.path == d.path)
        })
        .map(|(i, _)| i)
        .collect();
    let sources: Vec<&Document> = docs
        .iter()
        .enumerate()
        .filter(|(i, d)| !d.archived && !defective.contains(i))
        .map(|(_, d)| *d)
        .collect();

    let graph = TraceGraph::build(
        docs.iter().copied(),
        sources.iter().copied(),
        &rules.external_prefixes,
    );
    tracing::debug!(
        nodes = docs.len(),
        edges = graph.edges().len(),
        sources = sources.len(),
        "built trace graph"
    );

    let by_id: HashMap<&DocId, &Document> = sources.iter().map(|&d| (&d.id, d)).collect();

    let broken_links: Vec<BrokenLink> = graph
        .unresolved()
        .filter_map(|edge| {
            let Target::Document(target) = &edge.target else {
                return None;
            };
            Some(BrokenLink {
                document: edge.source.clone(),
                path: by_id.get(&edge.source).map(|d| d.path.clone()).unwrap_or_default(),
                category: edge.category.clone(),
                target: target.clone(),
            })
        })
        .collect();

    let mut orphans = Vec::new();
    for doc in &sources {
        for exp in rules.expectations_for(doc.doc_type) {
            if !satisfied(&graph, &doc.id, exp) {
                orphans.push(Orphan {
                    document: doc.id.clone(),
                    doc_type: doc.doc_type,
                    title: doc.title.clone(),
                    path: doc.path.clone(),
                    expectation: exp.describe(),
                });
            }
        }
    }

    let link_defects = sources
        .iter()
        .flat_map(|doc| link_defects(doc, rules.required_for(doc.doc_type)))
        .collect();

    let status_warnings = docs
        .iter()
        .filter(|d| d.metadata.is_some())
        .filter(|d| d.status == UNKNOWN_STATUS || !d.doc_type.is_known_status(&d.status))
        .map(|d| StatusWarning {
            document: d.id.clone(),
            path: d.path.clone(),
            status: d.status.clone(),
        })
        .collect();

    let coverage = coverage(&graph, &sources);

    let mut counts: BTreeMap<DocType, TypeCount> = DocType::all()
        .iter()
        .map(|&t| {
            (
                t,
                TypeCount {
                    doc_type: t,
                    total: 0,
                    archived: 0,
                },
            )
        })
        .collect();
    for doc in &docs {
        if let Some(c) = counts.get_mut(&doc.doc_type) {
            c.total += 1;
            if doc.archived {
                c.archived += 1;
            }
        }
    }

    let documents = docs
        .iter()
        .map(|d| DocSummary {
            id: d.id.clone(),
            doc_type: d.doc_type,
            title: d.title.clone(),
            status: d.status.clone(),
            path: d.path.clone(),
            archived: d.archived,
        })
        .collect();

    let has_gaps = !broken_links.is_empty() || !orphans.is_empty();
    Report {
        total: docs.len(),
        archived: docs.iter().filter(|d| d.archived).count(),
        by_type: counts.into_values().collect(),
        coverage,
        broken_links,
        orphans,
        structural_defects,
        link_defects,
        status_warnings,
        documents,
        has_gaps,
    }
}

fn structural_defects(docs: &[&Document]) -> Vec<StructuralDefect> {
    let mut defects = Vec::new();
    let mut first_seen: HashMap<&DocId, &PathBuf> = HashMap::new();

    for doc in docs {
        if let Some(first) = first_seen.get(&doc.id) {
            defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::DuplicateId,
                detail: Some(format!("first defined at {}", first.display())),
            });
        } else {
            first_seen.insert(&doc.id, &doc.path);
        }

        match &doc.placement {
            Some(Placement::Misplaced { dir }) => defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::Misplaced,
                detail: Some(format!("{} document stored under {dir}/", doc.doc_type)),
            }),
            Some(Placement::SingleFileTask) => defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::UnexpectedShape,
                detail: Some("task is a single file, expected a directory".to_string()),
            }),
            Some(Placement::NotMarkdown) => {
                defects.push(StructuralDefect {
                    document: doc.id.clone(),
                    path: doc.path.clone(),
                    kind: DefectKind::UnexpectedShape,
                    detail: Some("not a markdown file".to_string()),
                });
                continue;
            }
            None => {}
        }

        if let Some(err) = &doc.read_error {
            defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::Unreadable,
                detail: Some(err.clone()),
            });
            continue;
        }
        if doc.metadata.is_none() {
            defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::MissingMetadata,
                detail: None,
            });
        }
        if doc.links.is_none() {
            defects.push(StructuralDefect {
                document: doc.id.clone(),
                path: doc.path.clone(),
                kind: DefectKind::MissingLinks,
                detail: None,
            });
        }
    }
    defects
}

fn satisfied(graph: &TraceGraph, id: &DocId, exp: &Expectation) -> bool {
    let peer = |other: &DocId| {
        other != id
            && graph
                .node(other)
                .is_some_and(|n| exp.peers.contains(&n.doc_type))
    };
    match exp.direction {
        Direction::Inbound => graph
            .inbound(id)
            .any(|e| exp.accepts_category(&e.category) && peer(&e.source)),
        Direction::Outbound => graph.outbound(id).any(|e| {
            exp.accepts_category(&e.category)
                && matches!(&e.target, Target::Document(t) if peer(t))
        }),
    }
}

fn link_defects(doc: &Document, required: &[String]) -> Vec<LinkDefect> {
    let entries = doc.link_entries();
    let mut defects = Vec::new();
    let defect = |category: &str, kind| LinkDefect {
        document: doc.id.clone(),
        path: doc.path.clone(),
        category: category.to_string(),
        kind,
    };

    for category in required {
        let mut matching = entries
            .iter()
            .filter(|e| e.category.eq_ignore_ascii_case(category))
            .peekable();
        if matching.peek().is_none() {
            defects.push(defect(category, LinkDefectKind::Missing));
        } else if matching.all(|e| e.value == LinkValue::Empty) {
            defects.push(defect(category, LinkDefectKind::Empty));
        }
    }
    for entry in entries {
        if entry.value == LinkValue::NotApplicable(None) {
            defects.push(defect(&entry.category, LinkDefectKind::UnexplainedAbsence));
        }
    }
    defects
}

fn coverage(graph: &TraceGraph, sources: &[&Document]) -> Coverage {
    let requirements: Vec<&DocId> = sources
        .iter()
        .filter(|d| d.doc_type == DocType::Requirement)
        .map(|d| &d.id)
        .collect();
    let covered = requirements
        .iter()
        .filter(|id| {
            graph.inbound(id).any(|e| {
                graph
                    .node(&e.source)
                    .is_some_and(|n| n.doc_type == DocType::Task)
            })
        })
        .count();
    let percent = (!requirements.is_empty())
        .then(|| covered as f64 * 100.0 / requirements.len() as f64);
    Coverage {
        requirements: requirements.len(),
        covered,
        percent,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Prefix;

    fn doc(id: &str, status: &str, links: &str) -> Document {
        let id = DocId::parse(id).unwrap();
        let prefix: Prefix = id.prefix().parse().unwrap();
        let md = format!(
            "# Title of {id}\n\n## Metadata\n\n- **ID**: {id}\n- **Status**: {status}\n\n## Links\n\n{links}\n## Body\n"
        );
        Document::parse(prefix, id.clone(), format!("docs/{id}.md"), &md)
    }

    fn rules() -> TraceRules {
        TraceRules::default()
    }

    #[test]
    fn reports_single_broken_link() {
        let docs = vec![
            doc("ADR-00001", "Accepted", "- **Requirements**: [XYZ-99999](../x.md)\n"),
        ];
        let report = scan(&docs, &rules());
        assert_eq!(report.broken_links.len(), 1);
        let b = &report.broken_links[0];
        assert_eq!(b.document.as_str(), "ADR-00001");
        assert_eq!(b.category, "Requirements");
        assert_eq!(b.target.as_str(), "XYZ-99999");
        assert!(report.has_gaps);
    }

    #[test]
    fn external_references_are_not_broken() {
        let docs = vec![doc(
            "ADR-00001",
            "Accepted",
            "- **Requirements**: N/A – standalone\n- **Issue**: #77\n- **PR**: https://example.com/pr/1\n\
             - **Ticket**: https://jira.example.com/browse/PROJ-12345\n\
             - **Epic**: [PROJ-54321](https://jira.example.com/browse/PROJ-54321)\n",
        )];
        let report = scan(&docs, &rules());
        assert!(report.broken_links.is_empty());
        assert!(!report.has_gaps);
    }

    #[test]
    fn requirement_without_task_is_orphan() {
        let fr = doc("FR-00001", "Accepted", "- **Implemented by Tasks**: N/A – later\n");
        let report = scan(std::slice::from_ref(&fr), &rules());
        assert_eq!(report.orphans.len(), 1);
        assert_eq!(report.orphans[0].document.as_str(), "FR-00001");
        assert_eq!(report.orphans[0].expectation, "no task links to this requirement");
        assert!(report.has_gaps);

        let task = doc("T-00001", "Draft", "- **Requirements**: [FR-00001]\n");
        let report = scan(&[fr, task], &rules());
        assert!(report.orphans.is_empty());
        assert!(!report.has_gaps);
    }

    #[test]
    fn task_without_requirement_is_orphan() {
        let docs = vec![doc("T-00001", "Draft", "- **Requirements**: N/A – spike\n")];
        let report = scan(&docs, &rules());
        assert_eq!(report.orphans.len(), 1);
        assert_eq!(report.orphans[0].expectation, "this task links to no requirement");
    }

    #[test]
    fn self_links_do_not_satisfy() {
        let docs = vec![doc("T-00001", "Draft", "- **Requirements**: T-00001\n")];
        let mut rules = rules();
        rules.expectations = vec![Expectation::new(
            DocType::Task,
            Direction::Inbound,
            &[DocType::Task],
        )];
        assert_eq!(scan(&docs, &rules).orphans.len(), 1);
    }

    #[test]
    fn category_filter_limits_matches() {
        let docs = vec![
            doc("FR-00001", "Accepted", "- **Task**: N/A – later\n"),
            doc("T-00001", "Draft", "- **Related**: FR-00001\n- **Requirements**: N/A – none\n"),
        ];
        let mut rules = rules();
        rules.expectations[0].categories = vec!["Requirements".to_string()];
        let report = scan(&docs, &rules);
        let orphan_ids: Vec<_> = report.orphans.iter().map(|o| o.document.as_str()).collect();
        assert_eq!(orphan_ids, ["FR-00001"]);
    }

    #[test]
    fn missing_links_is_structural_defect() {
        let fr = DocId::parse("FR-00002").unwrap();
        let broken = Document::parse(
            Prefix::Fr,
            fr,
            "docs/FR-00002.md",
            "# No links\n## Metadata\n- **Status**: Accepted\n\nBody mentioning XYZ-99999.\n",
        );
        let docs = vec![broken];
        let report = scan(&docs, &rules());
        assert_eq!(report.total, 1);
        assert_eq!(report.count(DocType::Requirement), 1);
        assert_eq!(report.structural_defects.len(), 1);
        assert_eq!(report.structural_defects[0].kind, DefectKind::MissingLinks);
        assert!(report.orphans.is_empty());
        assert!(report.broken_links.is_empty());
        assert!(!report.has_gaps);
        assert!(report.has_defects());
    }

    #[test]
    fn missing_metadata_and_unreadable() {
        let mut unreadable = doc("AN-00001", "Draft", "");
        unreadable.read_error = Some("permission denied".to_string());
        let bare = Document::parse(
            Prefix::An,
            DocId::parse("AN-00002").unwrap(),
            "docs/AN-00002.md",
            "# Bare\n## Links\n",
        );
        let report = scan(&[unreadable, bare], &rules());
        let kinds: Vec<_> = report.structural_defects.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [DefectKind::Unreadable, DefectKind::MissingMetadata]);
    }

    #[test]
    fn duplicate_ids_flag_later_occurrence() {
        let first = doc("ADR-00001", "Accepted", "- **Requirements**: N/A – x\n");
        let mut second = first.clone();
        second.path = PathBuf::from("docs/adr/ADR-00001-copy.md");
        let report = scan(&[second, first], &rules());
        assert_eq!(report.structural_defects.len(), 1);
        let d = &report.structural_defects[0];
        assert_eq!(d.kind, DefectKind::DuplicateId);
        assert_eq!(d.path, PathBuf::from("docs/adr/ADR-00001-copy.md"));
    }

    #[test]
    fn layout_problems_count_and_are_reported() {
        let mut task = doc("T-00001", "Draft", "- **Requirements**: [FR-00001]\n");
        task.placement = Some(Placement::SingleFileTask);
        let mut fr = doc("FR-00001", "Accepted", "- **Task**: N/A – later\n");
        fr.placement = Some(Placement::Misplaced {
            dir: "adr".to_string(),
        });
        let raw = Document::unparsed(
            Prefix::Adr,
            DocId::parse("ADR-00001").unwrap(),
            std::path::Path::new("docs/adr/ADR-00001.txt"),
        );

        let report = scan(&[task, fr, raw], &rules());
        assert_eq!(report.total, 3);
        assert_eq!(report.count(DocType::Task), 1);
        let kinds: Vec<_> = report
            .structural_defects
            .iter()
            .map(|d| (d.document.as_str(), d.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                ("ADR-00001", DefectKind::UnexpectedShape),
                ("FR-00001", DefectKind::Misplaced),
                ("T-00001", DefectKind::UnexpectedShape),
            ]
        );
        assert_eq!(
            report.structural_defects[1].detail.as_deref(),
            Some("requirement document stored under adr/")
        );
        // Defective documents are link targets, not sources or orphans.
        assert!(report.broken_links.is_empty());
        assert!(report.orphans.is_empty());
        assert!(report.has_defects());
    }

    #[test]
    fn archived_documents_resolve_but_are_not_orphans() {
        let mut old = doc("FR-00009", "Deprecated", "- **Task**: N/A – retired\n");
        old.archived = true;
        let adr = doc("ADR-00001", "Accepted", "- **Requirements**: [FR-00009]\n");
        let report = scan(&[old, adr], &rules());
        assert!(report.broken_links.is_empty());
        assert!(report.orphans.is_empty());
        assert_eq!(report.archived, 1);
        assert_eq!(report.coverage.requirements, 0);
        assert_eq!(report.coverage.percent, None);
    }

    #[test]
    fn archived_links_are_ignored() {
        let mut old = doc("T-00009", "Completed", "- **Requirements**: [FR-zzzzz]\n");
        old.archived = true;
        let report = scan(&[old], &rules());
        assert!(report.broken_links.is_empty());
        assert!(!report.has_gaps);
    }

    #[test]
    fn link_defects_for_required_categories() {
        let docs = vec![
            doc("T-00001", "Draft", "- **Design**: [design.md](./design.md)\n"),
            doc("ADR-00001", "Accepted", "- **Requirements**:\n- **Supersedes**: N/A\n"),
        ];
        let report = scan(&docs, &rules());
        let found: Vec<_> = report
            .link_defects
            .iter()
            .map(|d| (d.document.as_str(), d.category.as_str(), d.kind))
            .collect();
        assert_eq!(
            found,
            [
                ("ADR-00001", "Requirements", LinkDefectKind::Empty),
                ("ADR-00001", "Supersedes", LinkDefectKind::UnexplainedAbsence),
                ("T-00001", "Requirements", LinkDefectKind::Missing),
            ]
        );
        assert!(report.has_defects());
    }

    #[test]
    fn unknown_status_is_only_a_warning() {
        let docs = vec![
            doc("ADR-00001", "Shipped", "- **Requirements**: N/A – x\n"),
            doc("ADR-00002", "Superseded by ADR-00003", "- **Requirements**: N/A – x\n"),
        ];
        let report = scan(&docs, &rules());
        assert_eq!(report.status_warnings.len(), 1);
        assert_eq!(report.status_warnings[0].status, "Shipped");
        assert!(!report.has_gaps);
        assert!(!report.has_defects());
    }

    #[test]
    fn coverage_counts_live_tasks() {
        let docs = vec![
            doc("FR-00001", "Accepted", "- **Task**: N/A – x\n"),
            doc("NFR-00002", "Accepted", "- **Task**: N/A – x\n"),
            doc("T-00001", "Draft", "- **Requirements**: FR-00001\n"),
        ];
        let report = scan(&docs, &rules());
        assert_eq!(report.coverage.requirements, 2);
        assert_eq!(report.coverage.covered, 1);
        assert_eq!(report.coverage.percent, Some(50.0));
    }

    #[test]
    fn documented_corpus_has_no_gaps() {
        let docs = vec![
            doc("FR-00001", "Proposed", "- **Task**: N/A – not yet implemented\n"),
            doc("T-00001", "Draft", "- **Requirements**: [FR-00001]\n"),
            doc("ADR-00001", "Proposed", "- **Requirements**: N/A – standalone decision\n"),
        ];
        let report = scan(&docs, &rules());
        assert!(!report.has_gaps, "{report:#?}");
        assert!(!report.has_defects());
        assert_eq!(report.total, 3);
    }

    #[test]
    fn scan_is_idempotent_and_order_independent() {
        let docs = vec![
            doc("T-00001", "Draft", "- **Requirements**: [FR-00001], XYZ-99999\n"),
            doc("FR-00001", "Accepted", "- **Task**: T-00001\n"),
            doc("AN-00001", "Active", "- **Requirements**: FR-00001\n"),
        ];
        let mut reversed = docs.clone();
        reversed.reverse();
        let a = scan(&docs, &rules());
        let b = scan(&reversed, &rules());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&scan(&docs, &rules())).unwrap()
        );
    }
}
