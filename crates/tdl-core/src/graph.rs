use crate::document::{Document, LinkValue};
use crate::types::{DocId, DocType};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Node {
    pub doc_type: DocType,
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    Document(DocId),
    External(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: DocId,
    pub category: String,
    pub target: Target,
}

/// Directed traceability graph, rebuilt from scratch on every scan.
///
/// Every document with an id is a node and can be a link target. Edges only
/// come from the documents passed as `sources`.
#[derive(Debug, Default)]
pub struct TraceGraph {
    nodes: BTreeMap<DocId, Node>,
    edges: Vec<Edge>,
}

impl TraceGraph {
    /// `external_prefixes` lists id prefixes that belong to other systems
    /// (e.g. an issue tracker's `JIRA-12345`); they become external targets.
    pub fn build<'a>(
        all: impl IntoIterator<Item = &'a Document>,
        sources: impl IntoIterator<Item = &'a Document>,
        external_prefixes: &[String],
    ) -> Self {
        let mut graph = Self::default();
        for doc in all {
            graph.nodes.entry(doc.id.clone()).or_insert(Node {
                doc_type: doc.doc_type,
                archived: doc.archived,
            });
        }

        let external: HashSet<String> = external_prefixes
            .iter()
            .map(|p| p.to_ascii_uppercase())
            .collect();

        for doc in sources {
            for entry in doc.link_entries() {
                match &entry.value {
                    LinkValue::Internal(ids) => {
                        for id in ids {
                            let target = if external.contains(id.prefix()) {
                                Target::External(id.to_string())
                            } else {
                                Target::Document(id.clone())
                            };
                            graph.edges.push(Edge {
                                source: doc.id.clone(),
                                category: entry.category.clone(),
                                target,
                            });
                        }
                    }
                    LinkValue::External(text) => graph.edges.push(Edge {
                        source: doc.id.clone(),
                        category: entry.category.clone(),
                        target: Target::External(text.clone()),
                    }),
                    LinkValue::NotApplicable(_) | LinkValue::Empty => {}
                }
            }
        }
        graph
    }

    pub fn node(&self, id: &DocId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn outbound<'a>(&'a self, id: &'a DocId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    pub fn inbound<'a>(&'a self, id: &'a DocId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |e| matches!(&e.target, Target::Document(t) if t == id))
    }

    /// Edges whose document target has no node.
    pub fn unresolved(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(|e| matches!(&e.target, Target::Document(t) if !self.nodes.contains_key(t)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Prefix;

    fn doc(prefix: Prefix, id: &str, links: &str) -> Document {
        let md = format!("# {id}\n## Metadata\n- **ID**: {id}\n## Links\n{links}");
        Document::parse(prefix, DocId::parse(id).unwrap(), format!("{id}.md"), &md)
    }

    #[test]
    fn builds_edges_and_skips_absence_markers() {
        let docs = vec![
            doc(Prefix::Fr, "FR-00001", "- **Task**: N/A – not yet\n"),
            doc(Prefix::T, "T-00001", "- **Requirements**: [FR-00001]\n- **Issue**: #12\n"),
        ];
        let graph = TraceGraph::build(&docs, &docs, &[]);
        assert_eq!(graph.edges().len(), 2);

        let fr = DocId::parse("FR-00001").unwrap();
        let inbound: Vec<_> = graph.inbound(&fr).collect();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].source.as_str(), "T-00001");
        assert_eq!(graph.outbound(&fr).count(), 0);
        assert_eq!(graph.unresolved().count(), 0);
    }

    #[test]
    fn unresolved_targets() {
        let docs = vec![doc(Prefix::Adr, "ADR-00001", "- **Requirements**: XYZ-99999\n")];
        let graph = TraceGraph::build(&docs, &docs, &[]);
        let broken: Vec<_> = graph.unresolved().collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(
            broken[0].target,
            Target::Document(DocId::parse("XYZ-99999").unwrap())
        );
    }

    #[test]
    fn external_prefixes_are_out_of_graph() {
        let docs = vec![doc(Prefix::T, "T-00001", "- **Issue**: JIRA-12345\n")];
        let graph = TraceGraph::build(&docs, &docs, &["jira".to_string()]);
        assert_eq!(graph.unresolved().count(), 0);
        assert_eq!(
            graph.edges()[0].target,
            Target::External("JIRA-12345".to_string())
        );
    }

    #[test]
    fn non_source_documents_are_targets_only() {
        let docs = vec![
            doc(Prefix::Fr, "FR-00001", "- **Task**: T-99999\n"),
            doc(Prefix::T, "T-00001", "- **Requirements**: FR-00001\n"),
        ];
        let graph = TraceGraph::build(&docs, docs.iter().skip(1), &[]);
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.contains(&DocId::parse("FR-00001").unwrap()));
        assert_eq!(graph.unresolved().count(), 0);
    }
}
