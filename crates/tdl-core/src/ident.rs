//! Random base36 identifiers for TDL documents.
//!
//! Identifiers are drawn at random; there is no shared counter or lock. The
//! collision check only covers ids already on disk, so callers must still
//! refuse to overwrite at file-creation time.

use crate::error::{Result, TdlError};
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Payload alphabet: digits then lower-case ASCII letters.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of symbols in a payload (36^5 ≈ 60 million values).
pub const PAYLOAD_LEN: usize = 5;

/// Draws allowed before giving up with [`TdlError::CollisionExhaustion`].
pub const MAX_ATTEMPTS: u32 = 10;

/// Draw one payload uniformly from [`ALPHABET`].
pub fn draw_payload<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PAYLOAD_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Validate and upper-case a document-type prefix.
pub fn normalize_prefix(prefix: &str) -> Result<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TdlError::InvalidPrefix(prefix.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Generate an identifier whose payload is not in `existing`.
///
/// `existing` holds bare payloads (`a3bf2`), not prefixed ids: uniqueness is
/// scoped to the whole corpus regardless of type. With a prefix the result is
/// `PREFIX-payload`, otherwise the bare payload.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    prefix: Option<&str>,
    existing: &HashSet<String>,
) -> Result<String> {
    let prefix = prefix.map(normalize_prefix).transpose()?;

    for attempt in 1..=MAX_ATTEMPTS {
        let payload = draw_payload(rng);
        if existing.contains(&payload) {
            tracing::warn!(
                payload = %payload,
                attempt,
                max = MAX_ATTEMPTS,
                "id collision, retrying"
            );
            continue;
        }
        return Ok(match &prefix {
            Some(p) => format!("{p}-{payload}"),
            None => payload,
        });
    }

    Err(TdlError::CollisionExhaustion {
        attempts: MAX_ATTEMPTS,
    })
}

/// [`generate`] with the thread-local RNG.
pub fn generate_id(prefix: Option<&str>, existing: &HashSet<String>) -> Result<String> {
    generate(&mut rand::thread_rng(), prefix, existing)
}

// ---------------------------------------------------------------------------
// Existing-id index
// ---------------------------------------------------------------------------

static NAME_ID_RE: OnceLock<Regex> = OnceLock::new();

fn name_id_re() -> &'static Regex {
    NAME_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z]+-([0-9A-Za-z]{5})(?:[-.]|$)").unwrap())
}

/// Payload of an id-shaped file or directory name (`FR-a3bf2-login.md`).
pub fn payload_from_name(name: &str) -> Option<String> {
    name_id_re()
        .captures(name)
        .map(|c| c[1].to_ascii_lowercase())
}

/// Collect every payload used by a file or directory name under `docs_dir`,
/// archives included. A missing directory yields an empty set.
pub fn existing_payloads(docs_dir: &Path) -> Result<HashSet<String>> {
    let mut found = HashSet::new();
    if docs_dir.is_dir() {
        collect_payloads(docs_dir, &mut found)?;
    }
    tracing::debug!(dir = %docs_dir.display(), count = found.len(), "indexed existing ids");
    Ok(found)
}

fn collect_payloads(dir: &Path, found: &mut HashSet<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(payload) = payload_from_name(&name) {
            found.insert(payload);
        }
        if entry.file_type()?.is_dir() {
            collect_payloads(&entry.path(), found)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
