use crate::error::Result;
use crate::paths;
use crate::types::{DocType, Prefix};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Expectations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Some peer document must link to the subject.
    Inbound,
    /// The subject must link to some peer document.
    Outbound,
}

/// One row of the orphan table: documents of type `subject` need at least one
/// link with a document of a `peers` type in `direction`. When `categories`
/// is non-empty only links under those Links categories count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub subject: DocType,
    pub direction: Direction,
    pub peers: Vec<DocType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl Expectation {
    pub fn new(subject: DocType, direction: Direction, peers: &[DocType]) -> Self {
        Self {
            subject,
            direction,
            peers: peers.to_vec(),
            categories: Vec::new(),
        }
    }

    /// Whether a link under `category` can satisfy this expectation.
    pub fn accepts_category(&self, category: &str) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn describe(&self) -> String {
        let peers = self
            .peers
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        match self.direction {
            Direction::Inbound => format!("no {peers} links to this {}", self.subject),
            Direction::Outbound => format!("this {} links to no {peers}", self.subject),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceRules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRules {
    #[serde(default = "default_expectations")]
    pub expectations: Vec<Expectation>,
    /// Links categories each document type must carry.
    #[serde(default = "default_required_links")]
    pub required_links: BTreeMap<DocType, Vec<String>>,
    /// Id prefixes owned by other systems (e.g. `JIRA`); links to them are
    /// external and never broken.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_prefixes: Vec<String>,
}

fn default_expectations() -> Vec<Expectation> {
    vec![
        Expectation::new(DocType::Requirement, Direction::Inbound, &[DocType::Task]),
        Expectation::new(DocType::Task, Direction::Outbound, &[DocType::Requirement]),
    ]
}

fn default_required_links() -> BTreeMap<DocType, Vec<String>> {
    let mut m = BTreeMap::new();
    m.insert(DocType::Task, vec!["Requirements".to_string()]);
    m.insert(DocType::Adr, vec!["Requirements".to_string()]);
    m
}

impl Default for TraceRules {
    fn default() -> Self {
        Self {
            expectations: default_expectations(),
            required_links: default_required_links(),
            external_prefixes: Vec::new(),
        }
    }
}

impl TraceRules {
    pub fn expectations_for(&self, subject: DocType) -> impl Iterator<Item = &Expectation> {
        self.expectations.iter().filter(move |e| e.subject == subject)
    }

    pub fn required_for(&self, doc_type: DocType) -> &[String] {
        self.required_links
            .get(&doc_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Docs tree, relative to the project root.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
    #[serde(default)]
    pub trace: TraceRules,
}

fn default_version() -> u32 {
    1
}

fn default_docs_dir() -> String {
    paths::DEFAULT_DOCS_DIR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            docs_dir: default_docs_dir(),
            trace: TraceRules::default(),
        }
    }
}

impl Config {
    /// Load `.tdl/config.yaml`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn docs_path(&self, root: &Path) -> PathBuf {
        root.join(&self.docs_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.docs_dir.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "docs_dir is empty".to_string(),
            });
        }

        for (i, exp) in self.trace.expectations.iter().enumerate() {
            if exp.peers.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "trace.expectations[{i}] ({}) has no peers and can never be satisfied",
                        exp.subject
                    ),
                });
            }
            if exp.direction == Direction::Outbound && exp.peers.contains(&exp.subject) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "trace.expectations[{i}] lets a {} satisfy itself through a self-link",
                        exp.subject
                    ),
                });
            }
        }

        for (doc_type, categories) in &self.trace.required_links {
            let mut seen = HashSet::new();
            for cat in categories {
                if cat.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("trace.required_links.{doc_type} has an empty category"),
                    });
                } else if !seen.insert(cat.to_ascii_lowercase()) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "trace.required_links.{doc_type} lists '{cat}' more than once"
                        ),
                    });
                }
            }
        }

        for prefix in &self.trace.external_prefixes {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "trace.external_prefixes entry '{prefix}' must be ASCII letters"
                    ),
                });
            } else if prefix.parse::<Prefix>().is_ok() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "trace.external_prefixes entry '{prefix}' shadows a TDL document prefix"
                    ),
                });
            }
        }

        warnings
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
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert!(yaml.contains("subject: requirement"));
        assert!(yaml.contains("direction: inbound"));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(cfg.docs_dir, "docs");
        assert_eq!(cfg.trace.expectations.len(), 2);
        assert_eq!(cfg.trace.required_for(DocType::Task), ["Requirements"]);
        assert!(cfg.trace.required_for(DocType::Analysis).is_empty());
    }

    #[test]
    fn custom_expectation_with_categories() {
        let yaml = r#"
trace:
  expectations:
    - subject: adr
      direction: outbound
      peers: [requirement]
      categories: [Requirements]
  required_links: {}
  external_prefixes: [JIRA]
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let exps: Vec<_> = cfg.trace.expectations_for(DocType::Adr).collect();
        assert_eq!(exps.len(), 1);
        assert!(exps[0].accepts_category("requirements"));
        assert!(!exps[0].accepts_category("Related ADRs"));
        assert!(cfg.trace.expectations_for(DocType::Requirement).next().is_none());
        assert!(cfg.trace.required_for(DocType::Task).is_empty());
        assert_eq!(cfg.trace.external_prefixes, ["JIRA"]);
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.docs_dir = "documentation".to_string();
        cfg.save(dir.path()).unwrap();
        assert!(paths::config_path(dir.path()).exists());
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.docs_dir, "documentation");
        assert_eq!(loaded.docs_path(dir.path()), dir.path().join("documentation"));
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.docs_dir = " ".to_string();
        cfg.trace
            .expectations
            .push(Expectation::new(DocType::Adr, Direction::Inbound, &[]));
        cfg.trace.required_links.insert(
            DocType::Adr,
            vec!["Requirements".to_string(), "requirements".to_string()],
        );
        cfg.trace.external_prefixes = vec!["FR".to_string(), "JI-RA".to_string()];

        let warnings = cfg.validate();
        let errors = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .count();
        assert_eq!(errors, 3);
        assert!(warnings.iter().any(|w| w.message.contains("more than once")));
        assert!(warnings.iter().any(|w| w.message.contains("shadows")));
    }

    #[test]
    fn describe_expectation() {
        let exp = Expectation::new(DocType::Requirement, Direction::Inbound, &[DocType::Task]);
        assert_eq!(exp.describe(), "no task links to this requirement");
    }
}
