use crate::scan::Report;
use crate::types::DocType;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Text,
    Markdown,
}

impl std::str::FromStr for Format {
    type Err = crate::TdlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "markdown" | "md" => Ok(Format::Markdown),
            _ => Err(crate::TdlError::InvalidKind {
                what: "report format",
                value: s.to_string(),
                expected: "text, markdown",
            }),
        }
    }
}

impl Report {
    pub fn render(&self, format: Format, verbose: bool) -> String {
        match format {
            Format::Text => self.to_text(verbose),
            Format::Markdown => self.to_markdown(verbose),
        }
    }

    fn coverage_line(&self) -> String {
        match self.coverage.percent {
            Some(p) => format!(
                "{p:.1}% ({} of {} requirements referenced by a task)",
                self.coverage.covered, self.coverage.requirements
            ),
            None => "n/a (no live requirements)".to_string(),
        }
    }

    fn verdict(&self) -> &'static str {
        if self.has_gaps {
            "GAPS FOUND"
        } else {
            "no gaps"
        }
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    pub fn to_text(&self, verbose: bool) -> String {
        let mut out = String::new();
        out.push_str("TDL traceability report\n");
        out.push_str("=======================\n\n");
        out.push_str(&format!(
            "Documents: {} ({} archived)\n",
            self.total, self.archived
        ));
        for c in &self.by_type {
            out.push_str(&format!(
                "  {:<14}{:>4}  ({} archived)\n",
                format!("{}:", c.doc_type.label()),
                c.total,
                c.archived
            ));
        }
        out.push_str(&format!("Coverage: {}\n\n", self.coverage_line()));
        out.push_str(&format!("Broken links:        {}\n", self.broken_links.len()));
        out.push_str(&format!("Orphans:             {}\n", self.orphans.len()));
        out.push_str(&format!(
            "Structural defects:  {}\n",
            self.structural_defects.len()
        ));
        out.push_str(&format!("Link defects:        {}\n", self.link_defects.len()));
        out.push_str(&format!(
            "Status warnings:     {}\n",
            self.status_warnings.len()
        ));

        if verbose {
            text_section(&mut out, "Broken links", self.broken_links.iter().map(|b| {
                format!(
                    "{} [{}] -> {}  ({})",
                    b.document,
                    b.category,
                    b.target,
                    b.path.display()
                )
            }));
            text_section(&mut out, "Orphans", self.orphans.iter().map(|o| {
                format!("{} \"{}\": {}  ({})", o.document, o.title, o.expectation, o.path.display())
            }));
            text_section(&mut out, "Structural defects", self.structural_defects.iter().map(|d| {
                let detail = d.detail.as_deref().map(|s| format!(": {s}")).unwrap_or_default();
                format!("{} {}{detail}  ({})", d.document, d.kind.as_str(), d.path.display())
            }));
            text_section(&mut out, "Link defects", self.link_defects.iter().map(|d| {
                format!("{} [{}] {}  ({})", d.document, d.category, d.kind.as_str(), d.path.display())
            }));
            text_section(&mut out, "Status warnings", self.status_warnings.iter().map(|w| {
                format!("{} unrecognised status '{}'  ({})", w.document, w.status, w.path.display())
            }));
            text_section(&mut out, "Documents", self.documents.iter().map(|d| {
                let archived = if d.archived { " [archived]" } else { "" };
                format!(
                    "{:<10} {:<12} {}{archived}  {}",
                    d.id.as_str(),
                    d.status,
                    d.title,
                    d.path.display()
                )
            }));
        }

        out.push_str(&format!("\nResult: {}\n", self.verdict()));
        out
    }

    // -----------------------------------------------------------------------
    // Markdown
    // -----------------------------------------------------------------------

    pub fn to_markdown(&self, verbose: bool) -> String {
        let mut out = String::new();
        out.push_str("# TDL Traceability Report\n\n");
        out.push_str("| Type | Documents | Archived |\n|---|---:|---:|\n");
        for c in &self.by_type {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                c.doc_type.label(),
                c.total,
                c.archived
            ));
        }
        out.push_str(&format!(
            "| **Total** | **{}** | **{}** |\n\n",
            self.total, self.archived
        ));
        out.push_str(&format!("**Coverage**: {}\n\n", self.coverage_line()));

        out.push_str("| Finding | Count |\n|---|---:|\n");
        for (label, n) in [
            ("Broken links", self.broken_links.len()),
            ("Orphans", self.orphans.len()),
            ("Structural defects", self.structural_defects.len()),
            ("Link defects", self.link_defects.len()),
            ("Status warnings", self.status_warnings.len()),
        ] {
            out.push_str(&format!("| {label} | {n} |\n"));
        }

        if verbose {
            md_table(
                &mut out,
                "Broken links",
                &["Document", "Category", "Target", "Path"],
                self.broken_links.iter().map(|b| {
                    vec![
                        b.document.to_string(),
                        b.category.clone(),
                        b.target.to_string(),
                        path_cell(&b.path),
                    ]
                }),
            );
            md_table(
                &mut out,
                "Orphans",
                &["Document", "Title", "Unmet expectation", "Path"],
                self.orphans.iter().map(|o| {
                    vec![
                        o.document.to_string(),
                        o.title.clone(),
                        o.expectation.clone(),
                        path_cell(&o.path),
                    ]
                }),
            );
            md_table(
                &mut out,
                "Structural defects",
                &["Document", "Defect", "Detail", "Path"],
                self.structural_defects.iter().map(|d| {
                    vec![
                        d.document.to_string(),
                        d.kind.as_str().to_string(),
                        d.detail.clone().unwrap_or_default(),
                        path_cell(&d.path),
                    ]
                }),
            );
            md_table(
                &mut out,
                "Link defects",
                &["Document", "Category", "Defect", "Path"],
                self.link_defects.iter().map(|d| {
                    vec![
                        d.document.to_string(),
                        d.category.clone(),
                        d.kind.as_str().to_string(),
                        path_cell(&d.path),
                    ]
                }),
            );
            md_table(
                &mut out,
                "Status warnings",
                &["Document", "Status", "Path"],
                self.status_warnings.iter().map(|w| {
                    vec![w.document.to_string(), w.status.clone(), path_cell(&w.path)]
                }),
            );
            for &doc_type in DocType::all() {
                md_table(
                    &mut out,
                    doc_type.label(),
                    &["ID", "Title", "Status", "Archived"],
                    self.documents
                        .iter()
                        .filter(|d| d.doc_type == doc_type)
                        .map(|d| {
                            vec![
                                d.id.to_string(),
                                d.title.clone(),
                                d.status.clone(),
                                if d.archived { "yes" } else { "" }.to_string(),
                            ]
                        }),
                );
            }
        }

        out.push_str(&format!("\n**Result**: {}\n", self.verdict()));
        out
    }
}

fn text_section(out: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    for line in lines {
        out.push_str(&format!("  - {line}\n"));
    }
}

fn md_table(
    out: &mut String,
    title: &str,
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) {
    let rows: Vec<Vec<String>> = rows.collect();
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n## {title}\n\n"));
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn path_cell(path: &Path) -> String {
    format!("`{}`", path.display())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
