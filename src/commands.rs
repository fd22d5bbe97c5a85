//! CLI commands: index, check, replay.

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::audit::{self, DocumentAudit};
use crate::config::Config;
use crate::document::Document;
use crate::error::{self, Anomaly};
use crate::html;
use crate::index::Index;
use crate::replay;
use crate::types::{Identifier, NodeId};

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Machine-readable JSON.
    Json,
    /// Human-readable text.
    Text,
}

/// Canonical path for a document loaded from the CLI: the override if given,
/// otherwise the file path with forward slashes.
fn document_path_for(file: &Path, document_path: Option<&str>) -> String {
    return document_path.map_or_else(
        || return file.to_string_lossy().replace('\\', "/"),
        str::to_string,
    );
}

// ── index ─────────────────────────────────────────────────────────────

/// JSON shape of one definition.
#[derive(Serialize)]
struct DefinitionJson<'a> {
    identifier: &'a Identifier,
    node: NodeId,
}

/// JSON shape of one referenced identifier.
#[derive(Serialize)]
struct ReferencesJson<'a> {
    identifier: &'a Identifier,
    nodes: &'a [NodeId],
}

/// JSON shape of the whole index.
#[derive(Serialize)]
struct IndexJson<'a> {
    anomalies: &'a [Anomaly],
    definitions: Vec<DefinitionJson<'a>>,
    document: &'a str,
    references: Vec<ReferencesJson<'a>>,
}

/// Print the definition and reference tables of one document.
///
/// # Errors
///
/// Returns errors from config loading, document loading, or index building.
pub fn index(file: &Path, document_path: Option<&str>, format: Format) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let document = html::load(file, &document_path_for(file, document_path))?;
    let index = Index::build(&document, &config)?;

    match format {
        Format::Json => {
            let json = IndexJson {
                anomalies: index.anomalies(),
                definitions: index
                    .definitions()
                    .into_iter()
                    .map(|(identifier, node)| return DefinitionJson { identifier, node })
                    .collect(),
                document: document.path(),
                references: index
                    .references()
                    .into_iter()
                    .map(|(identifier, nodes)| return ReferencesJson { identifier, nodes })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        },
        Format::Text => print!("{}", render_index(&document, &index)),
    }

    return Ok(());
}

/// Text rendering of an index.
fn render_index(document: &Document, index: &Index) -> String {
    let mut out = String::new();
    let definitions = index.definitions();
    let references = index.references();

    let _ = writeln!(out, "# {}\n", document.path());
    let _ = writeln!(out, "definitions ({}):", definitions.len());
    for (identifier, node) in &definitions {
        let tag = document.tag(*node).unwrap_or("?");
        let text = document.text_content(*node);
        let first_line = text.lines().map(str::trim).find(|l| return !l.is_empty()).unwrap_or("");
        let _ = writeln!(out, "  {identifier}  {node} <{tag}> {first_line}");
    }

    let _ = writeln!(out, "references ({}):", references.len());
    for (identifier, nodes) in &references {
        let nodes: Vec<String> = nodes.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "  {identifier}  {}", nodes.join(", "));
    }

    if !index.anomalies().is_empty() {
        let _ = writeln!(out, "anomalies ({}):", index.anomalies().len());
        for anomaly in index.anomalies() {
            let _ = writeln!(out, "  {anomaly}");
        }
    }
    return out;
}

// ── check ─────────────────────────────────────────────────────────────

/// Audit every document under `root` and print the findings.
/// Exit code priority: duplicates (2) > unresolved or malformed (1) > clean (0).
///
/// # Errors
///
/// Returns errors from config loading or document parsing.
pub fn check(root: &Path, format: Format) -> Result<ExitCode, error::Error> {
    let config = Config::load(root)?;
    let audits = audit::audit_tree(root, &config)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&audits)?),
        Format::Text => print!("{}", render_audits(&audits)),
    }

    let duplicates: usize = audits.iter().map(DocumentAudit::duplicates).sum();
    let dead: usize = audits
        .iter()
        .map(|a| return a.unresolved().saturating_add(a.malformed()))
        .sum();

    if duplicates > 0 {
        return Ok(ExitCode::from(2));
    } else if dead > 0 {
        return Ok(ExitCode::from(1));
    } else {
        return Ok(ExitCode::SUCCESS);
    }
}

/// Text rendering of audit results: one line per finding, then a summary.
fn render_audits(audits: &[DocumentAudit]) -> String {
    let mut out = String::new();
    for audit in audits {
        let path = audit.path.display();
        for anomaly in &audit.anomalies {
            match anomaly {
                Anomaly::DuplicateIdentifier { identifier, kept, dropped } => {
                    let _ = writeln!(out, "DUPLICATE   {path}  `{identifier}` ({kept} kept, {dropped} dropped)");
                },
                Anomaly::ForeignLinkTarget { .. } => {},
                Anomaly::MalformedLinkTarget { href, node, reason } => {
                    let _ = writeln!(out, "MALFORMED   {path}  `{href}` on {node} ({reason})");
                },
                Anomaly::UnresolvedIdentifier { identifier, node } => {
                    let _ = writeln!(out, "UNRESOLVED  {path}  `{identifier}` from {node}");
                },
            }
        }
    }

    let definitions: usize = audits.iter().map(|a| return a.definitions).sum();
    let references: usize = audits.iter().map(|a| return a.references).sum();
    let duplicates: usize = audits.iter().map(DocumentAudit::duplicates).sum();
    let unresolved: usize = audits.iter().map(DocumentAudit::unresolved).sum();
    let malformed: usize = audits.iter().map(DocumentAudit::malformed).sum();
    let count = audits.len();

    if duplicates == 0 && unresolved == 0 && malformed == 0 {
        let _ = writeln!(
            out,
            "All {count} documents clean ({definitions} definitions, {references} references)"
        );
    } else {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{count} documents: {duplicates} duplicate, {unresolved} unresolved, {malformed} malformed"
        );
    }
    return out;
}

// ── replay ────────────────────────────────────────────────────────────

/// Replay a scripted session against a document and print the final state.
///
/// # Errors
///
/// Returns errors from loading, indexing, or bad script steps.
pub fn replay(
    file: &Path,
    script: &Path,
    document_path: Option<&str>,
    format: Format,
) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let document = html::load(file, &document_path_for(file, document_path))?;
    let script = replay::load_script(script)?;
    let report = replay::run(document, &script, &config)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print!("{}", replay::render_text(&report)),
    }
    return Ok(());
}
