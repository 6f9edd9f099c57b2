//! Identity keys and the per-identity on-disk layout.
//!
//! An identity names one user's archive. Everything an archive run touches
//! lives under `<data_dir>/<identity>/`:
//! - `library.json` (persisted catalog)
//! - `downloads/<item id>.<ext>` (assets)
//! - `logs/run-<timestamp>.log` (run logs)

use std::fmt;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::ArchiveError;

const NAME_MAX: usize = 255;

/// Sanitized identity: only ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Strip every character outside `[A-Za-z0-9_-]`; rejects an identity that ends up empty.
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let cleaned = sanitize_identity(raw);
        if cleaned.is_empty() {
            return Err(ArchiveError::InvalidIdentity(raw.to_string()));
        }
        Ok(Identity(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn sanitize_identity(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Sanitizes an item id for use as a file stem.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to 255 bytes minus room for the extension
pub fn sanitize_file_stem(id: &str, reserve: usize) -> String {
    let mut out = String::with_capacity(id.len());
    let mut prev_underscore = false;

    for c in id.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let limit = NAME_MAX.saturating_sub(reserve);
    if trimmed.len() > limit {
        let mut take = limit;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Length of the id digest appended to stems that sanitizing changed.
const ID_DIGEST_LEN: usize = 8;

/// File name for an item's asset, or None when the id has no usable characters.
///
/// An id that is already a safe stem is used as is. Any other id gets a short
/// SHA-256 digest of the raw id appended (`a b` -> `a_b-<digest>.mp3`), so two
/// ids that sanitize to the same stem still land in different files.
pub fn asset_file_name(id: &str, extension: &str) -> Option<String> {
    // ".<ext>", the ".part" suffix used while writing, and "-<digest>"
    let reserve = extension.len() + 1 + crate::storage::TEMP_SUFFIX.len() + 1 + ID_DIGEST_LEN;
    let stem = sanitize_file_stem(id, reserve);
    if stem.is_empty() {
        return None;
    }
    let stem = if stem == id {
        stem
    } else {
        format!("{}-{}", stem, id_digest(id))
    };
    if extension.is_empty() {
        Some(stem)
    } else {
        Some(format!("{}.{}", stem, extension))
    }
}

fn id_digest(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(ID_DIGEST_LEN);
    hex
}

/// Paths of one identity's archive.
#[derive(Debug, Clone)]
pub struct ArchivePaths {
    pub base: PathBuf,
    pub catalog: PathBuf,
    pub downloads: PathBuf,
    pub logs: PathBuf,
}

impl ArchivePaths {
    pub fn new(data_dir: &Path, identity: &Identity) -> Self {
        let base = data_dir.join(identity.as_str());
        Self {
            catalog: base.join("library.json"),
            downloads: base.join("downloads"),
            logs: base.join("logs"),
            base,
        }
    }

    /// Create the download and log directories (and the base above them).
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.downloads)?;
        std::fs::create_dir_all(&self.logs)?;
        Ok(())
    }
}
