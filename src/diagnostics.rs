use std::path::Path;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened,
/// and how to fix it where there is a fix.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DuplicateIdentifier { identifier, first, second } => {
            render_duplicate_identifier(identifier.as_str(), &first.to_string(), &second.to_string())
        },
        Error::FileNotFound { path } => render_file_not_found(path),
        Error::InvalidSelector { selector, reason } => render_invalid_selector(selector, reason),
        Error::UnknownSelector { selector } => render_unknown_selector(selector),
        Error::UnsupportedDocument { ext } => render_unsupported_document(ext),
        _ => render_generic(e),
    };
}

/// Variants with no dedicated advice.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Output

{e}
"),
        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `.linkedsrc.toml` or the replay script against the documented keys.
"),
        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_duplicate_identifier(identifier: &str, first: &str, second: &str) -> String {
    return format!("\
# Error: Duplicate Identifier

`{identifier}` is defined by both {first} and {second}.

## Fix

Make the identifiers unique, or relax the policy in `.linkedsrc.toml`:

    duplicates = \"last-wins\"
");
}

fn render_file_not_found(path: &Path) -> String {
    return format!("\
# Error: File Not Found

`{}` does not exist.
", path.display());
}

fn render_invalid_selector(selector: &str, reason: &str) -> String {
    return format!("\
# Error: Invalid Selector

`{selector}`: {reason}.

## Selector syntax

- `#id`     the definition of `id`
- `@id`     the first reference to `id`
- `@id:N`   the Nth reference to `id`, counting from zero
- `%N`      node number N, as printed by `linkedsrc index`
");
}

fn render_unknown_selector(selector: &str) -> String {
    return format!("\
# Error: Unknown Selector

`{selector}` does not match any node in the document.

## Fix

List what the document defines and references:

    linkedsrc index <file>
");
}

fn render_unsupported_document(ext: &str) -> String {
    return format!(
        "\
# Error: Unsupported Document

No front end for `.{ext}` files.

## Supported extensions

- `.html`, `.htm`, `.xhtml`
"
    );
}
