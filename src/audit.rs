//! Document audits: index every rendered document under a root and collect
//! the anomalies a reader would experience as dead links.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{Config, DuplicatePolicy};
use crate::error::{Anomaly, Error};
use crate::html;
use crate::index::Index;

/// Result of auditing one document.
#[derive(Debug, Serialize)]
pub struct DocumentAudit {
    /// Everything the index recorded.
    pub anomalies: Vec<Anomaly>,
    /// Number of registered definitions.
    pub definitions: usize,
    /// Document path relative to the audit root.
    pub path: PathBuf,
    /// Number of accepted references.
    pub references: usize,
}

impl DocumentAudit {
    /// Duplicate identifiers found.
    pub fn duplicates(&self) -> usize {
        return self.count(|a| return matches!(a, Anomaly::DuplicateIdentifier { .. }));
    }

    /// References to identifiers nobody defines.
    pub fn unresolved(&self) -> usize {
        return self.count(|a| return matches!(a, Anomaly::UnresolvedIdentifier { .. }));
    }

    /// Link targets with no extractable identifier.
    pub fn malformed(&self) -> usize {
        return self.count(|a| return matches!(a, Anomaly::MalformedLinkTarget { .. }));
    }

    /// Count anomalies matching a predicate.
    fn count(&self, predicate: impl Fn(&Anomaly) -> bool) -> usize {
        return self.anomalies.iter().filter(|a| return predicate(a)).count();
    }
}

/// Audit every HTML document under `root` that the config lets through.
/// Documents are visited in sorted path order.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if `root` does not exist, and `Error::Io` or
/// `Error::ParseFailed` if a document cannot be read or parsed.
pub fn audit_tree(root: &Path, config: &Config) -> Result<Vec<DocumentAudit>, Error> {
    if !root.exists() {
        return Err(Error::FileNotFound {
            path: root.to_path_buf(),
        });
    }
    let mut audits = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && html::is_document(e.path()))
    {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        if !config.should_scan(&relative.to_string_lossy()) {
            continue;
        }
        audits.push(audit_file(path, &relative, config)?);
    }

    return Ok(audits);
}

/// Audit a single document. Duplicates are always collected rather than
/// failing the build, so a `reject` policy still yields a full report.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::Io`, or `Error::ParseFailed`.
pub fn audit_file(file: &Path, relative: &Path, config: &Config) -> Result<DocumentAudit, Error> {
    let document_path = relative.to_string_lossy().replace('\\', "/");
    let document = html::load(file, &document_path)?;

    let mut lenient = config.clone();
    if lenient.duplicates == DuplicatePolicy::Reject {
        lenient.duplicates = DuplicatePolicy::LastWins;
    }
    let index = Index::build(&document, &lenient)?;

    return Ok(DocumentAudit {
        anomalies: index.anomalies().to_vec(),
        definitions: index.definitions().len(),
        path: relative.to_path_buf(),
        references: index.references().iter().map(|(_, nodes)| return nodes.len()).sum(),
    });
}
