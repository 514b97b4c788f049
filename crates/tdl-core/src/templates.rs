//! Markdown skeletons for new documents and docs-tree READMEs.
//!
//! Placeholders are `{id}`, `{title}`, `{date}` plus per-template fields,
//! filled with plain string replacement so titles may contain braces.

use crate::types::{DocType, Prefix};

// ---------------------------------------------------------------------------
// Document templates
// ---------------------------------------------------------------------------

const ANALYSIS_TEMPLATE: &str = r#"# {title}

## Metadata

- **ID**: {id}
- **Type**: Analysis
- **Owner**: [Person or role]
- **Status**: Draft
- **Date**: {date}

## Links

- **Related Analyses**: N/A – [AN-xxxxx]
- **Existing Requirements**: N/A – [FR-xxxxx, NFR-xxxxx]
- **Existing ADRs**: N/A – [ADR-xxxxx]
- **Issue/Discussion**: N/A – [link to issue]

## Executive Summary

[1-2 paragraph summary of the analysis and key findings]

## Problem Space

### Current State

[How things work today]

### Desired State

[The target state]

### Gap Analysis

| Area | Current | Desired | Gap |
|------|---------|---------|-----|
| [Area 1] | [Current state] | [Desired state] | [Gap description] |

## Research & Discovery

[User feedback, technical investigation, data]

## Discovered Requirements

### Functional Requirements (Draft)

- [Requirement candidate]: [Rationale]

### Non-Functional Requirements (Draft)

- [Requirement candidate]: [Rationale]

## Recommendations

[Next steps: requirements to formalize, decisions to record]

## Open Questions

- [ ] Question 1
"#;

const REQUIREMENT_TEMPLATE: &str = r#"# {title}

## Metadata

- **ID**: {id}
- **Type**: {type_name}
- **Category**: {category}
- **Priority**: P2 (Medium)
- **Owner**: [Person or role]
- **Reviewers**: [List of reviewers]
- **Status**: Proposed
- **Date**: {date}

## Links

- **Implemented by Tasks**: N/A – [T-xxxxx]
- **Related Requirements**: N/A – [FR-xxxxx, NFR-xxxxx]
- **Related ADRs**: N/A – [ADR-xxxxx]
- **Tests**: N/A – [link to test files]
- **Issue**: N/A – [link to issue]
- **PR**: N/A – [link to PR]

## Requirement Statement

[Clear, specific and measurable statement. Use "shall" or "must" for
mandatory requirements.]

## Rationale

[Why is this requirement needed?]

## Acceptance Criteria

- [ ] Criterion 1: [Specific, testable condition]
- [ ] Criterion 2: [Specific, testable condition]

## Technical Details

{technical_section}

## Verification Method

- [ ] Unit tests
- [ ] Integration tests
- [ ] End-to-end tests

## Dependencies

- N/A – [Requirements this depends on]
"#;

const FR_TECHNICAL_SECTION: &str = r#"### Functional Specification

[Detailed functional behavior]

### Input/Output

- **Input**: [What the system receives]
- **Output**: [What the system produces]

### Error Handling

- [Error condition]: [How to handle]"#;

const NFR_TECHNICAL_SECTION: &str = r#"### Performance Targets

- **Response Time**: [Target, e.g., < 100ms]
- **Throughput**: [Target, e.g., 1000 req/s]

### Quality Attributes

- **Reliability**: [Target, e.g., 99.9% uptime]
- **Security**: [Specific requirements]

### Measurement Method

[How these metrics are measured]"#;

const ADR_LINKS: &str = r#"## Links

- **Analysis**: N/A – [reason if none]
- **Requirements**: N/A – [FR-xxxxx, NFR-xxxxx]
- **Design**: N/A – [link to design doc]
- **Related ADRs**: N/A – [ADR-xxxxx]
- **Issue**: N/A – [link to issue]
- **PR**: N/A – [link to PR]
- **Supersedes**: N/A – [ADR-xxxxx if replacing another]
- **Superseded by**: N/A – [ADR-xxxxx if replaced]"#;

const ADR_FULL_TEMPLATE: &str = r#"# {title}

## Metadata

- **ID**: {id}
- **Type**: ADR
- **Owner**: [Person or role]
- **Reviewers**: [List of reviewers]
- **Status**: Proposed
- **Date**: {date}

{links}

## Context

[The context and problem statement. What forces are at play?]

## Decision

### Decision Drivers

- [Driver 1]
- [Driver 2]

### Options Considered

#### Option 1: [Name]

**Pros:**
- [Pro]

**Cons:**
- [Con]

#### Option 2: [Name]

**Pros:**
- [Pro]

**Cons:**
- [Con]

### Decision Outcome

**Chosen option: [Selected Option]**

## Rationale

[Why this option was chosen, including trade-offs]

## Consequences

### Positive

- [Outcome]

### Negative

- [Outcome]

## Open Questions

- [ ] Question 1
"#;

const ADR_LITE_TEMPLATE: &str = r#"# {title}

## Metadata

- **ID**: {id}
- **Type**: ADR (Lite)
- **Owner**: [Person or role]
- **Reviewers**: [List of reviewers]
- **Status**: Proposed
- **Date**: {date}

{links}

## Context

[Brief description of the context and problem]

## Decision

**Chosen approach: [Selected approach]**

## Consequences

- [Positive or negative outcome]
"#;

const TASK_DESIGN_TEMPLATE: &str = r#"# {title} - Design

## Metadata

- **ID**: {id}
- **Type**: Design
- **Owner**: [Person or role]
- **Reviewers**: [List of reviewers]
- **Status**: Draft
- **Date**: {date}

## Links

- **Requirements**: {requirements}
- **Relevant ADRs**: N/A – [ADR-xxxxx]
- **Issue**: N/A – [link to issue]
- **PR**: N/A – [link to PR]

## Requirements Summary

| Requirement | Design Element | Notes |
|-------------|----------------|-------|
| [FR-xxxxx] | [Component/Module] | [How it's addressed] |

## Component Design

[High-level design, key components and their interfaces]

## Data Flows

[Primary flow and edge cases]

## Error Handling Strategy

| Error Condition | Detection | Response |
|-----------------|-----------|----------|
| [Error 1] | [How detected] | [Action taken] |

## Testing Strategy

- [Unit and integration test scope]

## Open Questions

- [ ] Question 1
"#;

const TASK_PLAN_TEMPLATE: &str = r#"# {title} - Implementation Plan

## Metadata

- **ID**: {id}
- **Type**: Implementation Plan
- **Owner**: [Person or role]
- **Reviewers**: [List of reviewers]
- **Status**: Not Started
- **Date**: {date}

## Links

- **Requirements**: {requirements}
- **Design**: [design.md](./design.md)
- **Related ADRs**: N/A – [ADR-xxxxx]
- **Issue**: N/A – [link to issue]
- **PR**: N/A – [link to PR]

## Overview

[What this implementation accomplishes]

## Plan Summary

| Phase | Description | Status |
|-------|-------------|--------|
| 1 | [Phase 1 name] | Not Started |
| 2 | [Phase 2 name] | Not Started |

## Phase 1: [Name]

- [ ] Task 1.1: [Description]
- [ ] Task 1.2: [Description]

**Verification**: [Commands or checks]

## Phase 2: [Name]

- [ ] Task 2.1: [Description]

**Verification**: [Commands or checks]

## Definition of Done

- [ ] All tasks completed
- [ ] All tests pass
- [ ] Links section updated with PR

## Status Tracking

| Date | Status | Notes |
|------|--------|-------|
| {date} | Created | Initial plan |
"#;

/// Requirements link value used when a task is created without any.
pub const NO_REQUIREMENTS: &str = "N/A – [FR-xxxxx, NFR-xxxxx]";

fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

pub fn analysis(id: &str, title: &str, date: &str) -> String {
    fill(ANALYSIS_TEMPLATE, &[("id", id), ("date", date), ("title", title)])
}

pub fn requirement(prefix: Prefix, id: &str, title: &str, category: &str, date: &str) -> String {
    let technical = if prefix == Prefix::Nfr {
        NFR_TECHNICAL_SECTION
    } else {
        FR_TECHNICAL_SECTION
    };
    fill(
        REQUIREMENT_TEMPLATE,
        &[
            ("id", id),
            ("date", date),
            ("type_name", prefix.type_name()),
            ("category", category),
            ("technical_section", technical),
            ("title", title),
        ],
    )
}

pub fn adr(id: &str, title: &str, date: &str, lite: bool) -> String {
    let template = if lite { ADR_LITE_TEMPLATE } else { ADR_FULL_TEMPLATE };
    fill(
        template,
        &[("links", ADR_LINKS), ("id", id), ("date", date), ("title", title)],
    )
}

pub fn task_design(id: &str, title: &str, requirements: &str, date: &str) -> String {
    fill(
        TASK_DESIGN_TEMPLATE,
        &[("id", id), ("date", date), ("requirements", requirements), ("title", title)],
    )
}

pub fn task_plan(id: &str, title: &str, requirements: &str, date: &str) -> String {
    fill(
        TASK_PLAN_TEMPLATE,
        &[("id", id), ("date", date), ("requirements", requirements), ("title", title)],
    )
}

/// Blank templates copied into `docs/templates/` by `init`.
pub fn blank_templates() -> Vec<(&'static str, String)> {
    let (id, title, date) = ("{id}", "{title}", "YYYY-MM-DD");
    vec![
        ("analysis.md", analysis(id, title, date)),
        (
            "requirement-fr.md",
            requirement(Prefix::Fr, id, title, "General", date),
        ),
        (
            "requirement-nfr.md",
            requirement(Prefix::Nfr, id, title, "Performance", date),
        ),
        ("adr.md", adr(id, title, date, false)),
        ("adr-lite.md", adr(id, title, date, true)),
        (
            "task-design.md",
            task_design(id, title, NO_REQUIREMENTS, date),
        ),
        ("task-plan.md", task_plan(id, title, NO_REQUIREMENTS, date)),
    ]
}

// ---------------------------------------------------------------------------
// READMEs
// ---------------------------------------------------------------------------

const ANALYSIS_README: &str = r#"# Analysis Documents

Problem exploration and requirements discovery.

## Naming Convention

- `AN-<5-char-id>-topic.md` (e.g. `AN-a3bf2-user-auth-flow.md`)
- Create with `tdl new analysis "User Authentication Flow"`

## Lifecycle

Draft -> Active -> Complete -> Archived (move to `archive/` once the
requirements are formalized)

## Links Section

Related Analyses, Existing Requirements, Existing ADRs, Issue/Discussion.
Use `N/A – <reason>` when a category does not apply.
"#;

const REQUIREMENTS_README: &str = r#"# Requirements

Functional (FR) and non-functional (NFR) requirement specifications.

## Naming Convention

- Functional: `FR-<5-char-id>-topic.md` (e.g. `FR-b4cd8-user-authentication.md`)
- Non-functional: `NFR-<5-char-id>-topic.md` (e.g. `NFR-c5de9-api-response-time.md`)
- Create with `tdl new requirement "User Authentication"` or
  `tdl new requirement "API Response Time" --kind nfr --category Performance`

## Status Lifecycle

Proposed -> Accepted -> Implemented -> Verified -> (Deprecated)

## Links Section

Implementing Tasks, Related Requirements, Related ADRs, Tests, Issue/PR.
"#;

const ADR_README: &str = r#"# Architecture Decision Records

## Naming Convention

- `ADR-<5-char-id>-topic.md` (e.g. `ADR-d6ef0-use-postgresql.md`)
- Create with `tdl new adr "Use PostgreSQL"` (add `--lite` for tactical decisions)

## Status Lifecycle

Proposed -> Accepted | Rejected -> (Deprecated | Superseded by ADR-xxxxx)

## Links Section

Analysis, Requirements, Design, Related ADRs, Supersedes/Superseded by.
"#;

const TASKS_README: &str = r#"# Task Directories

Each task is a directory holding a technical design and a phased plan.

## Naming Convention

```
T-<5-char-id>-topic/
├── design.md    # how to implement
└── plan.md      # phased implementation plan
```

Create with `tdl new task "implement-user-auth" --requirements FR-a1b2c,FR-d3e4f`

## Plan Status

Not Started -> Phase N In Progress -> Blocked -> Under Review -> Completed

## Links Section

Both files link to Requirements, Relevant ADRs and Issue/PR.
"#;

pub fn readme(doc_type: DocType) -> &'static str {
    match doc_type {
        DocType::Analysis => ANALYSIS_README,
        DocType::Requirement => REQUIREMENTS_README,
        DocType::Adr => ADR_README,
        DocType::Task => TASKS_README,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_markdown, LinkValue};

    #[test]
    fn requirement_template_parses() {
        let md = requirement(Prefix::Nfr, "NFR-c5de9", "API Latency", "Performance", "2026-01-05");
        let parts = parse_markdown(&md);
        assert_eq!(parts.title.as_deref(), Some("API Latency"));
        let meta = parts.metadata.unwrap();
        assert_eq!(meta["ID"], "NFR-c5de9");
        assert_eq!(meta["Type"], "Non-Functional Requirement");
        assert_eq!(meta["Status"], "Proposed");
        assert!(md.contains("### Performance Targets"));
        let links = parts.links.unwrap();
        assert!(links
            .iter()
            .all(|l| matches!(l.value, LinkValue::NotApplicable(Some(_)))));
    }

    #[test]
    fn braces_in_titles_survive() {
        let md = analysis("AN-00001", "Parse {json} input", "2026-01-05");
        assert!(md.starts_with("# Parse {json} input\n"));
    }

    #[test]
    fn adr_variants_share_links() {
        let full = adr("ADR-00001", "Use Postgres", "2026-01-05", false);
        let lite = adr("ADR-00001", "Use Postgres", "2026-01-05", true);
        assert!(full.contains("- **Type**: ADR\n"));
        assert!(lite.contains("- **Type**: ADR (Lite)"));
        for md in [&full, &lite] {
            let links = parse_markdown(md).links.unwrap();
            assert_eq!(links.len(), 8);
            assert_eq!(links[1].category, "Requirements");
        }
    }

    #[test]
    fn task_templates_carry_requirements() {
        let design = task_design("T-e7fa1", "Implement Auth", "[FR-a1b2c], [FR-d3e4f]", "2026-01-05");
        let plan = task_plan("T-e7fa1", "Implement Auth", "[FR-a1b2c], [FR-d3e4f]", "2026-01-05");
        for md in [&design, &plan] {
            let links = parse_markdown(md).links.unwrap();
            assert_eq!(links[0].category, "Requirements");
            assert!(matches!(&links[0].value, LinkValue::Internal(ids) if ids.len() == 2));
        }
        assert!(plan.contains("- **Status**: Not Started"));
    }

    #[test]
    fn blank_templates_keep_placeholders() {
        let blanks = blank_templates();
        assert_eq!(blanks.len(), 7);
        assert!(blanks.iter().all(|(_, body)| body.contains("- **ID**: {id}")));
    }
}
